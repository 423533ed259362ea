use std::fmt;

use tracing::{info, warn};

use super::UploadedImage;
use crate::error::{AssemblyError, Result};
use crate::parser::sections::{match_heading, CanonicalSection};
use crate::render::{Fragment, RenderedDocument};

/// Where in a single-document body an image goes: right after one of these
/// headings, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Ingredients,
    Instructions,
    Notes,
}

pub const SINGLE_DOCUMENT_ANCHORS: [Anchor; 3] = [Anchor::Ingredients, Anchor::Instructions, Anchor::Notes];

impl Anchor {
    fn labels(self) -> &'static [&'static str] {
        match self {
            Anchor::Ingredients => &["Ingredients"],
            Anchor::Instructions => &["Preparations", "Instructions"],
            Anchor::Notes => &["Notes", "Final Words"],
        }
    }

    /// Fallback when no heading carries one of the exact labels.
    fn sections(self) -> &'static [CanonicalSection] {
        match self {
            Anchor::Ingredients => &[CanonicalSection::Ingredients],
            Anchor::Instructions => &[CanonicalSection::Instructions],
            Anchor::Notes => &[CanonicalSection::Conclusion],
        }
    }

    pub fn find(self, doc: &RenderedDocument) -> Option<usize> {
        for label in self.labels() {
            if let Some(idx) = doc.find_heading(|t| t.trim().eq_ignore_ascii_case(label)) {
                return Some(idx);
            }
        }
        doc.find_heading(|t| match_heading(t).is_some_and(|s| self.sections().contains(&s)))
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.labels().join("/").as_str())
    }
}

/// Non-fatal outcome of a splice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementWarning {
    NoAnchorFound { anchor: String },
}

/// How the media list is spliced into a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceKind {
    /// One image after each anchor heading that exists.
    SingleDocument,
    /// Image `i` right after the `i`-th H2.
    Roundup,
    /// Everything appended at the end.
    Generic,
}

impl SpliceKind {
    /// A roundup body with fewer H2s than images is an error and is left
    /// unchanged.
    pub fn apply(self, doc: &mut RenderedDocument, media: &[UploadedImage]) -> Result<Vec<PlacementWarning>> {
        match self {
            SpliceKind::SingleDocument => Ok(splice_at_anchors(doc, media)),
            SpliceKind::Roundup => {
                splice_under_headings(doc, media)?;
                Ok(Vec::new())
            }
            SpliceKind::Generic => {
                doc.extend(media.iter().map(Fragment::image));
                Ok(Vec::new())
            }
        }
    }
}

fn splice_at_anchors(doc: &mut RenderedDocument, media: &[UploadedImage]) -> Vec<PlacementWarning> {
    let mut warnings = Vec::new();
    let mut unused = media.iter();

    for anchor in SINGLE_DOCUMENT_ANCHORS {
        let Some(idx) = anchor.find(doc) else {
            warn!("No heading found for image anchor {}; skipping", anchor);
            warnings.push(PlacementWarning::NoAnchorFound {
                anchor: anchor.to_string(),
            });
            continue;
        };
        let Some(image) = unused.next() else { break };
        info!("Placing image {} after heading {}", image.id, anchor);
        doc.insert_after(idx, Fragment::image(image));
    }
    warnings
}

/// Walk backwards so earlier insertions don't shift later heading indices.
fn splice_under_headings(doc: &mut RenderedDocument, media: &[UploadedImage]) -> Result<()> {
    let headings = doc.heading_indices(2);
    if media.len() > headings.len() {
        return Err(AssemblyError::TooManyImages {
            images: media.len(),
            headings: headings.len(),
        });
    }
    for (idx, image) in headings.iter().zip(media).rev() {
        doc.insert_after(*idx, Fragment::image(image));
    }
    Ok(())
}
