pub mod fragment;
pub mod roundup;
pub mod single;

pub use fragment::{Fragment, FragmentKind, ListKind};

use crate::collab::HeadingRef;

/// A rendered post body as an ordered list of block fragments. The title is
/// post metadata and never part of the markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    pub title: String,
    fragments: Vec<Fragment>,
}

impl RenderedDocument {
    pub fn new(title: impl Into<String>) -> Self {
        RenderedDocument {
            title: title.into(),
            fragments: Vec::new(),
        }
    }

    /// Rebuild a document from stored markup.
    pub fn from_markup(title: impl Into<String>, markup: &str) -> Self {
        RenderedDocument {
            title: title.into(),
            fragments: fragment::parse_markup(markup),
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    pub fn extend(&mut self, fragments: impl IntoIterator<Item = Fragment>) {
        self.fragments.extend(fragments);
    }

    /// Insert right after `index`; past the end appends.
    pub fn insert_after(&mut self, index: usize, fragment: Fragment) {
        let at = (index + 1).min(self.fragments.len());
        self.fragments.insert(at, fragment);
    }

    /// Index of the first heading whose text satisfies `pred`.
    pub fn find_heading(&self, mut pred: impl FnMut(&str) -> bool) -> Option<usize> {
        self.fragments
            .iter()
            .position(|f| f.heading_text().is_some_and(&mut pred))
    }

    /// Indices of every heading at `level`, in document order.
    pub fn heading_indices(&self, level: u8) -> Vec<usize> {
        self.fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| f.heading_level() == Some(level))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn h2_headings(&self) -> Vec<HeadingRef> {
        self.fragments
            .iter()
            .filter_map(|f| match &f.kind {
                FragmentKind::Heading { level: 2, text, url } => Some(HeadingRef {
                    text: text.clone(),
                    url: url.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn to_markup(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.markup.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
