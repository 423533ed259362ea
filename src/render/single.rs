use tracing::debug;

use super::fragment::{self, Fragment, ListKind};
use super::RenderedDocument;
use crate::parser::blocks::{BlockKind, ContentBlock};
use crate::parser::sections::{match_heading, CanonicalSection, CanonicalSectionMap, SectionValue};

/// Sections this renderer writes itself; their source subtrees are not copied.
const OWNED: [CanonicalSection; 7] = [
    CanonicalSection::Intro,
    CanonicalSection::Equipment,
    CanonicalSection::EquipmentMust,
    CanonicalSection::EquipmentNice,
    CanonicalSection::LowFodmap,
    CanonicalSection::GoodToKnow,
    CanonicalSection::Conclusion,
];

const EQUIPMENT_HEADING: &str = "Equipment";

/// Render a completed section map. Emission order: intro, equipment,
/// the source's own structure (ingredients, instructions and anything
/// unrecognised), low FODMAP, good to know, conclusion.
pub fn render_single_document(
    title: &str,
    sections: &CanonicalSectionMap,
    source: &[ContentBlock],
) -> RenderedDocument {
    let mut doc = RenderedDocument::new(title);

    if let Some(intro) = sections.get(CanonicalSection::Intro) {
        doc.extend(fragment::paragraphs(&intro.text()));
    }
    render_equipment(&mut doc, sections);

    let copied = copy_source(source);
    if !copied.has_ingredients {
        render_section(&mut doc, sections, CanonicalSection::Ingredients);
    }
    doc.extend(copied.fragments);
    if !copied.has_instructions {
        render_section(&mut doc, sections, CanonicalSection::Instructions);
    }

    for section in [
        CanonicalSection::LowFodmap,
        CanonicalSection::GoodToKnow,
        CanonicalSection::Conclusion,
    ] {
        render_section(&mut doc, sections, section);
    }

    debug!("Rendered single document with {} fragments", doc.len());
    doc
}

fn render_equipment(doc: &mut RenderedDocument, sections: &CanonicalSectionMap) {
    let lists: Vec<(&str, Vec<String>)> = [CanonicalSection::EquipmentMust, CanonicalSection::EquipmentNice]
        .into_iter()
        .filter_map(|s| {
            let items = sections.get(s)?.items();
            let label = s.heading_label()?;
            (!items.is_empty()).then_some((label, items))
        })
        .collect();
    if lists.is_empty() {
        return;
    }

    doc.push(Fragment::heading(2, EQUIPMENT_HEADING));
    for (label, items) in lists {
        doc.push(Fragment::paragraph(&format!("<strong>{label}:</strong>")));
        doc.push(Fragment::list(ListKind::Unordered, &items));
    }
}

/// Labelled heading (if the section has one) followed by its content.
/// Absent or blank sections emit nothing.
fn render_section(doc: &mut RenderedDocument, sections: &CanonicalSectionMap, section: CanonicalSection) {
    let Some(value) = sections.get(section).filter(|v| !v.is_blank()) else {
        return;
    };
    if let Some(label) = section.heading_label() {
        doc.push(Fragment::heading(2, label));
    }
    doc.extend(section_fragments(section, value));
}

fn section_fragments(section: CanonicalSection, value: &SectionValue) -> Vec<Fragment> {
    match section {
        CanonicalSection::Ingredients => vec![Fragment::list(ListKind::Unordered, &value.items())],
        CanonicalSection::Instructions => vec![Fragment::list(ListKind::Ordered, &value.items())],
        _ => fragment::paragraphs(&value.text()),
    }
}

struct CopiedSource {
    fragments: Vec<Fragment>,
    has_ingredients: bool,
    has_instructions: bool,
}

/// Re-emit source blocks from the first heading on, skipping every subtree
/// whose heading this renderer writes itself. Consecutive list items of one
/// kind become one list.
fn copy_source(source: &[ContentBlock]) -> CopiedSource {
    let mut out = CopiedSource {
        fragments: Vec::new(),
        has_ingredients: false,
        has_instructions: false,
    };
    let mut seen_heading = false;
    let mut skip_below: Option<usize> = None;
    let mut pending: Option<(ListKind, Vec<&str>)> = None;

    for block in source {
        if let Some(depth) = block.heading_depth() {
            flush_list(&mut out.fragments, &mut pending);
            seen_heading = true;
            if skip_below.is_some_and(|d| depth > d) {
                continue;
            }
            skip_below = None;

            let section = match_heading(&block.text);
            if section.is_some_and(|s| OWNED.contains(&s)) {
                skip_below = Some(depth);
                continue;
            }
            match section {
                Some(CanonicalSection::Ingredients) => out.has_ingredients = true,
                Some(CanonicalSection::Instructions) => out.has_instructions = true,
                _ => {}
            }
            let level = if block.kind == BlockKind::Heading3 { 3 } else { 2 };
            out.fragments.push(Fragment::heading(level, &block.text));
            continue;
        }
        if !seen_heading || skip_below.is_some() {
            continue;
        }

        let list_kind = match block.kind {
            BlockKind::BulletItem => Some(ListKind::Unordered),
            BlockKind::NumberItem => Some(ListKind::Ordered),
            _ => None,
        };
        match list_kind {
            Some(kind) => {
                if pending.as_ref().is_some_and(|(k, _)| *k != kind) {
                    flush_list(&mut out.fragments, &mut pending);
                }
                pending
                    .get_or_insert_with(|| (kind, Vec::new()))
                    .1
                    .push(&block.text);
            }
            None => {
                flush_list(&mut out.fragments, &mut pending);
                out.fragments.extend(fragment::paragraphs(&block.text));
            }
        }
    }
    flush_list(&mut out.fragments, &mut pending);
    out
}

fn flush_list(out: &mut Vec<Fragment>, pending: &mut Option<(ListKind, Vec<&str>)>) {
    if let Some((kind, items)) = pending.take() {
        out.push(Fragment::list(kind, &items));
    }
}
