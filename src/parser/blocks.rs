use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    #[serde(alias = "heading_1")]
    Heading1,
    #[serde(alias = "heading_2")]
    Heading2,
    #[serde(alias = "heading_3")]
    Heading3,
    Paragraph,
    #[serde(alias = "bulleted_list_item")]
    BulletItem,
    #[serde(alias = "numbered_list_item")]
    NumberItem,
}

/// One typed block from the source page. Order is document flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub kind: BlockKind,
    pub text: String,
}

impl ContentBlock {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        ContentBlock {
            kind,
            text: text.into(),
        }
    }

    pub fn heading2(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading2, text)
    }

    pub fn heading3(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading3, text)
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, text)
    }

    pub fn bullet(text: impl Into<String>) -> Self {
        Self::new(BlockKind::BulletItem, text)
    }

    pub fn number(text: impl Into<String>) -> Self {
        Self::new(BlockKind::NumberItem, text)
    }

    /// Structural depth of a heading: H1 and H2 share depth 1, H3 is depth 2.
    /// Non-heading blocks have no depth.
    pub fn heading_depth(&self) -> Option<usize> {
        match self.kind {
            BlockKind::Heading1 | BlockKind::Heading2 => Some(1),
            BlockKind::Heading3 => Some(2),
            _ => None,
        }
    }

    pub fn is_heading(&self) -> bool {
        self.heading_depth().is_some()
    }
}

/// Parse a JSON array of blocks, e.g. `[{"kind":"heading_2","text":"Ingredients"}]`.
pub fn blocks_from_json(json: &str) -> serde_json::Result<Vec<ContentBlock>> {
    serde_json::from_str(json)
}
