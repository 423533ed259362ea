//! Turns a loosely structured source page into a finished, block-formatted
//! post: parse the heading tree, map it onto canonical sections, fill the gaps
//! with one generation request, render block markup and place images.

pub mod collab;
pub mod complete;
pub mod config;
pub mod error;
pub mod images;
pub mod parser;
pub mod render;

use tracing::info;
use tracing_subscriber::EnvFilter;

pub use collab::{
    ContentMutator, FeaturedImageSetter, GenerationReply, GenerationRequest, HeadingReader, HeadingRef,
    ImageUploader, PostId, TextGenerator, UploadedMedia,
};
pub use complete::roundup::{RoundupContent, RoundupSource};
pub use complete::SectionCompleter;
pub use config::AssemblyConfig;
pub use error::{AssemblyError, Result};
pub use images::{ImagePlacer, Placement, PlacementMode, PlacementWarning, UploadedImage};
pub use parser::blocks::{BlockKind, ContentBlock};
pub use parser::sections::{CanonicalSection, CanonicalSectionMap, SectionValue};
pub use render::roundup::RoundupItem;
pub use render::RenderedDocument;

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`). Safe to
/// call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Source blocks in, rendered single-item post out. Without a `title` one is
/// generated from the completed intro.
pub fn assemble_single_document(
    source: &[ContentBlock],
    title: Option<&str>,
    generator: &dyn TextGenerator,
    config: &AssemblyConfig,
) -> Result<RenderedDocument> {
    let parsed = parser::parse_source(source);
    let completed = SectionCompleter::new(generator, config).complete(&parsed.sections)?;

    let title = match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_string(),
        None => {
            let subject = completed
                .get(CanonicalSection::Intro)
                .or_else(|| completed.get(CanonicalSection::Ingredients))
                .map(|v| v.text())
                .unwrap_or_default();
            complete::generate_title(generator, config, &subject)?
        }
    };

    let doc = render::single::render_single_document(&title, &completed, source);
    info!("Assembled '{}': {} blocks", doc.title, doc.len());
    Ok(doc)
}

/// Roundup sources in, rendered listicle out.
pub fn assemble_roundup(
    sources: &[RoundupSource],
    generator: &dyn TextGenerator,
    config: &AssemblyConfig,
) -> Result<RenderedDocument> {
    let content = complete::roundup::generate_roundup(generator, config, sources)?;
    let doc = render::roundup::render_roundup(
        &content.title,
        &content.intro,
        &content.conclusion,
        &content.items,
    );
    info!("Assembled roundup '{}' with {} items", doc.title, content.items.len());
    Ok(doc)
}
