use super::fragment::{self, Fragment};
use super::RenderedDocument;
use crate::parser::sections::CanonicalSection;

/// One roundup entry. `body` may already end in a call-to-action link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundupItem {
    pub title: String,
    pub body: String,
    pub link_url: String,
}

/// Intro paragraphs, then a heading plus paragraphs per item in the given
/// order, then the conclusion under its own heading. Item headings link to the
/// item URL when one is set. Nothing is numbered here.
pub fn render_roundup(
    title: &str,
    intro: &str,
    conclusion: &str,
    items: &[RoundupItem],
) -> RenderedDocument {
    let mut doc = RenderedDocument::new(title);
    doc.extend(fragment::paragraphs(intro));

    for item in items {
        let link = Some(item.link_url.as_str()).filter(|u| !u.trim().is_empty());
        doc.push(Fragment::heading_linked(2, &item.title, link));
        doc.extend(fragment::paragraphs(&item.body));
    }

    if !conclusion.trim().is_empty() {
        if let Some(label) = CanonicalSection::Conclusion.heading_label() {
            doc.push(Fragment::heading(2, label));
        }
        doc.extend(fragment::paragraphs(conclusion));
    }
    doc
}
