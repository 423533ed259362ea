pub mod anchors;
pub mod collect;

use std::path::PathBuf;

use tracing::info;

use crate::collab::{ContentMutator, FeaturedImageSetter, HeadingReader, ImageUploader, PostId};
use crate::config::AssemblyConfig;
use crate::error::{AssemblyError, Result};
use crate::render::RenderedDocument;
pub use anchors::{PlacementWarning, SpliceKind};
use collect::CollectedImage;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// An image after upload, with everything needed to emit its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub local_path: PathBuf,
    pub remote_url: String,
    pub id: u64,
    pub alt_text: String,
    /// Set only in roundup mode, when the matching heading links back into
    /// the same site.
    pub link_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    SingleDocument,
    /// Every image belongs under one H2; more images than H2s is rejected.
    Roundup,
    Generic,
}

impl PlacementMode {
    fn splice(self) -> SpliceKind {
        match self {
            PlacementMode::SingleDocument => SpliceKind::SingleDocument,
            PlacementMode::Roundup => SpliceKind::Roundup,
            PlacementMode::Generic => SpliceKind::Generic,
        }
    }
}

/// Images sorted and validated for their mode, not yet uploaded. Only
/// [`ImagePlacer::validate`] builds one.
#[derive(Debug, Clone)]
pub struct ValidatedImages {
    mode: PlacementMode,
    images: Vec<CollectedImage>,
    links: Vec<Option<String>>,
}

impl ValidatedImages {
    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Result of a finished placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub media: Vec<UploadedImage>,
    pub featured: Option<UploadedImage>,
    pub warnings: Vec<PlacementWarning>,
    pub post_link: String,
}

/// Drives collect → validate → upload → place for one post.
pub struct ImagePlacer<'a> {
    pub uploader: &'a dyn ImageUploader,
    pub featured: &'a dyn FeaturedImageSetter,
    pub headings: &'a dyn HeadingReader,
    pub mutator: &'a dyn ContentMutator,
    pub config: &'a AssemblyConfig,
}

impl<'a> ImagePlacer<'a> {
    /// Place `paths` into post `post_id`. `Ok(None)` when there is nothing to
    /// place; no collaborator is called in that case.
    pub fn place(
        &self,
        post_id: PostId,
        post_title: Option<&str>,
        paths: &[PathBuf],
        mode: PlacementMode,
    ) -> Result<Option<Placement>> {
        if paths.is_empty() {
            info!("No images to add for post {}", post_id);
            return Ok(None);
        }

        let collected = collect::collect_images(paths, post_title)?;
        let validated = self.validate(post_id, collected, mode)?;
        let media = self.upload(&validated)?;
        info!("Uploaded {} image(s) for post {}", media.len(), post_id);

        let featured = match mode {
            PlacementMode::SingleDocument => media.last().cloned(),
            _ => None,
        };
        if let Some(image) = &featured {
            self.featured.set_featured(post_id, image)?;
            info!("Set featured image {} for post {}", image.id, post_id);
        }

        let splice = mode.splice();
        let mut spliced = Ok(Vec::new());
        let post_link = self
            .mutator
            .update_content(post_id, &mut |doc: &mut RenderedDocument| {
                spliced = splice.apply(doc, &media)
            })?;
        let warnings = spliced?;

        Ok(Some(Placement {
            media,
            featured,
            warnings,
            post_link,
        }))
    }

    /// Roundup mode reads the post's H2s and rejects more images than
    /// headings before anything is uploaded. Heading links into the
    /// configured site become link annotations.
    pub fn validate(
        &self,
        post_id: PostId,
        images: Vec<CollectedImage>,
        mode: PlacementMode,
    ) -> Result<ValidatedImages> {
        let links = match mode {
            PlacementMode::Roundup => {
                let headings = self.headings.h2_headings(post_id)?;
                if images.len() > headings.len() {
                    return Err(AssemblyError::TooManyImages {
                        images: images.len(),
                        headings: headings.len(),
                    });
                }
                let base = self.config.site_base_url.trim_end_matches('/');
                headings
                    .into_iter()
                    .take(images.len())
                    .map(|h| h.url.filter(|url| !base.is_empty() && url.starts_with(base)))
                    .collect()
            }
            _ => vec![None; images.len()],
        };
        Ok(ValidatedImages { mode, images, links })
    }

    #[cfg(feature = "rayon")]
    fn upload(&self, validated: &ValidatedImages) -> Result<Vec<UploadedImage>> {
        let uploader = self.uploader;
        let pairs: Vec<_> = validated.images.iter().zip(&validated.links).collect();
        if self.config.parallel_uploads {
            // Indexed collect keeps the sorted order.
            pairs
                .par_iter()
                .map(|(image, link)| upload_one(uploader, image, link))
                .collect()
        } else {
            pairs
                .iter()
                .map(|(image, link)| upload_one(uploader, image, link))
                .collect()
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn upload(&self, validated: &ValidatedImages) -> Result<Vec<UploadedImage>> {
        validated
            .images
            .iter()
            .zip(&validated.links)
            .map(|(image, link)| upload_one(self.uploader, image, link))
            .collect()
    }
}

fn upload_one(
    uploader: &dyn ImageUploader,
    image: &CollectedImage,
    link: &Option<String>,
) -> Result<UploadedImage> {
    let media = uploader.upload(&image.path, &image.stem)?;
    if let Some(url) = link {
        info!("Image {} will link to {}", media.id, url);
    }
    Ok(UploadedImage {
        local_path: image.path.clone(),
        remote_url: media.source_url,
        id: media.id,
        alt_text: image.alt_text.clone(),
        link_url: link.clone(),
    })
}
