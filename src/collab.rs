//! Seams to the external systems. Implementations own transport, auth and
//! retry; everything here is synchronous and surfaces failures immediately.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::images::UploadedImage;
use crate::render::RenderedDocument;

pub type PostId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
}

/// Keys the structured reply must carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseSchema {
    pub fields: Vec<SchemaField>,
}

impl ResponseSchema {
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// `None` asks for plain text.
    pub response_schema: Option<ResponseSchema>,
}

/// Raw reply. A non-empty `error` is a failure regardless of `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerationReply {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

pub trait TextGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationReply>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedMedia {
    pub id: u64,
    pub source_url: String,
}

pub trait ImageUploader: Sync {
    fn upload(&self, local_path: &Path, title: &str) -> Result<UploadedMedia>;
}

pub trait FeaturedImageSetter {
    fn set_featured(&self, post_id: PostId, media: &UploadedImage) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRef {
    pub text: String,
    pub url: Option<String>,
}

pub trait HeadingReader {
    /// H2 headings of the published post, in document order.
    fn h2_headings(&self, post_id: PostId) -> Result<Vec<HeadingRef>>;
}

pub trait ContentMutator {
    /// Load the post body, run `mutation` on it, store it back and return the
    /// post link.
    fn update_content(
        &self,
        post_id: PostId,
        mutation: &mut dyn FnMut(&mut RenderedDocument),
    ) -> Result<String>;
}
