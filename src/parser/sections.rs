use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::tree::HeadingNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalSection {
    Title,
    Intro,
    /// Legacy single equipment list. Only the completer reads it; it is
    /// split into must/nice and never survives completion.
    Equipment,
    EquipmentMust,
    EquipmentNice,
    Ingredients,
    Instructions,
    GoodToKnow,
    LowFodmap,
    Conclusion,
}

impl CanonicalSection {
    /// Label of the heading block the renderer emits; `None` means no heading.
    pub fn heading_label(self) -> Option<&'static str> {
        match self {
            CanonicalSection::Title | CanonicalSection::Intro => None,
            CanonicalSection::Equipment => Some("Equipment"),
            CanonicalSection::EquipmentMust => Some("Must-haves"),
            CanonicalSection::EquipmentNice => Some("Nice-to-haves"),
            CanonicalSection::Ingredients => Some("Ingredients"),
            CanonicalSection::Instructions => Some("Instructions"),
            CanonicalSection::GoodToKnow => Some("Good to Know"),
            CanonicalSection::LowFodmap => Some("Low FODMAP Portion"),
            CanonicalSection::Conclusion => Some("Final Words"),
        }
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            CanonicalSection::Ingredients | CanonicalSection::Instructions
        )
    }

    /// Key used for this section in generation requests and replies.
    pub fn key(self) -> &'static str {
        match self {
            CanonicalSection::Title => "title",
            CanonicalSection::Intro => "intro",
            CanonicalSection::Equipment => "equipment",
            CanonicalSection::EquipmentMust => "equipment_must_haves",
            CanonicalSection::EquipmentNice => "equipment_nice_to_haves",
            CanonicalSection::Ingredients => "ingredients",
            CanonicalSection::Instructions => "instructions",
            CanonicalSection::GoodToKnow => "good_to_know",
            CanonicalSection::LowFodmap => "low_fodmap_portion",
            CanonicalSection::Conclusion => "conclusion",
        }
    }
}

impl fmt::Display for CanonicalSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key().to_uppercase())
    }
}

/// Text or a list of items. Mapped sections start as text; generation may
/// return lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionValue {
    Text(String),
    List(Vec<String>),
}

impl SectionValue {
    pub fn is_blank(&self) -> bool {
        match self {
            SectionValue::Text(t) => t.trim().is_empty(),
            SectionValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }

    /// List view: text splits on newlines, blank lines dropped.
    pub fn items(&self) -> Vec<String> {
        match self {
            SectionValue::Text(t) => t
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            SectionValue::List(items) => items
                .iter()
                .map(|i| i.trim())
                .filter(|i| !i.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Text view: lists join with newlines.
    pub fn text(&self) -> String {
        match self {
            SectionValue::Text(t) => t.clone(),
            SectionValue::List(items) => items.join("\n"),
        }
    }
}

impl From<&str> for SectionValue {
    fn from(s: &str) -> Self {
        SectionValue::Text(s.to_string())
    }
}

impl From<String> for SectionValue {
    fn from(s: String) -> Self {
        SectionValue::Text(s)
    }
}

impl From<Vec<String>> for SectionValue {
    fn from(items: Vec<String>) -> Self {
        SectionValue::List(items)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalSectionMap {
    sections: BTreeMap<CanonicalSection, SectionValue>,
}

impl CanonicalSectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, section: CanonicalSection) -> Option<&SectionValue> {
        self.sections.get(&section)
    }

    pub fn insert(&mut self, section: CanonicalSection, value: impl Into<SectionValue>) {
        self.sections.insert(section, value.into());
    }

    pub fn remove(&mut self, section: CanonicalSection) -> Option<SectionValue> {
        self.sections.remove(&section)
    }

    pub fn contains(&self, section: CanonicalSection) -> bool {
        self.sections.contains_key(&section)
    }

    /// Present with something other than whitespace.
    pub fn is_filled(&self, section: CanonicalSection) -> bool {
        self.get(section).is_some_and(|v| !v.is_blank())
    }

    pub fn keys(&self) -> impl Iterator<Item = CanonicalSection> + '_ {
        self.sections.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Normalized heading text → section. The only place heading wording is
/// interpreted.
const SYNONYMS: &[(&str, CanonicalSection)] = &[
    ("intro", CanonicalSection::Intro),
    ("introduction", CanonicalSection::Intro),
    ("equipment", CanonicalSection::Equipment),
    ("tools", CanonicalSection::Equipment),
    ("equipment: must-haves", CanonicalSection::EquipmentMust),
    ("equipment must-haves", CanonicalSection::EquipmentMust),
    ("must-haves", CanonicalSection::EquipmentMust),
    ("must haves", CanonicalSection::EquipmentMust),
    ("must-have equipment", CanonicalSection::EquipmentMust),
    ("equipment: nice-to-haves", CanonicalSection::EquipmentNice),
    ("equipment nice-to-haves", CanonicalSection::EquipmentNice),
    ("nice-to-haves", CanonicalSection::EquipmentNice),
    ("nice to haves", CanonicalSection::EquipmentNice),
    ("nice-to-have equipment", CanonicalSection::EquipmentNice),
    ("ingredients", CanonicalSection::Ingredients),
    ("ingredient list", CanonicalSection::Ingredients),
    ("shopping list", CanonicalSection::Ingredients),
    ("instructions", CanonicalSection::Instructions),
    ("preparation", CanonicalSection::Instructions),
    ("preparations", CanonicalSection::Instructions),
    ("directions", CanonicalSection::Instructions),
    ("method", CanonicalSection::Instructions),
    ("steps", CanonicalSection::Instructions),
    ("good to know", CanonicalSection::GoodToKnow),
    ("what you need to know", CanonicalSection::GoodToKnow),
    ("need to know", CanonicalSection::GoodToKnow),
    ("notes", CanonicalSection::GoodToKnow),
    ("tips", CanonicalSection::GoodToKnow),
    ("low fodmap", CanonicalSection::LowFodmap),
    ("low fodmap portion", CanonicalSection::LowFodmap),
    ("low-fodmap portion", CanonicalSection::LowFodmap),
    ("conclusion", CanonicalSection::Conclusion),
    ("final words", CanonicalSection::Conclusion),
    ("final thoughts", CanonicalSection::Conclusion),
];

/// Case-fold, collapse whitespace, straighten apostrophes and strip trailing
/// punctuation.
pub fn normalize_heading(text: &str) -> String {
    let folded = text.replace(['\u{2019}', '\u{2018}'], "'").to_lowercase();
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c: char| c.is_ascii_punctuation() && c != ')')
        .trim_end()
        .to_string()
}

pub fn match_heading(text: &str) -> Option<CanonicalSection> {
    let normalized = normalize_heading(text);
    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == normalized)
        .map(|(_, section)| *section)
}

/// Walk the tree and collect every node whose heading matches a synonym and
/// whose own content is non-blank. Later matches for the same section win.
pub fn map_sections(root: &HeadingNode) -> CanonicalSectionMap {
    let mut map = CanonicalSectionMap::new();
    map_node(root, &mut map);
    map
}

fn map_node(node: &HeadingNode, map: &mut CanonicalSectionMap) {
    if !node.content.trim().is_empty() {
        match match_heading(&node.heading_text) {
            Some(section) => map.insert(section, node.content.clone()),
            None if !node.is_root() => {
                tracing::debug!("No canonical section for heading {:?}", node.heading_text)
            }
            None => {}
        }
    }
    for child in node.children() {
        map_node(child, map);
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::parser::blocks::ContentBlock as B;
    use crate::parser::tree::parse_heading_tree;

    #[rstest]
    #[case("Ingredients", Some(CanonicalSection::Ingredients))]
    #[case("  INGREDIENTS:  ", Some(CanonicalSection::Ingredients))]
    #[case("Equipment: Must-haves", Some(CanonicalSection::EquipmentMust))]
    #[case("Equipment:  Nice-to-haves", Some(CanonicalSection::EquipmentNice))]
    #[case("What You Need To Know", Some(CanonicalSection::GoodToKnow))]
    #[case("Good to know!", Some(CanonicalSection::GoodToKnow))]
    #[case("Low FODMAP Portion", Some(CanonicalSection::LowFodmap))]
    #[case("Preparations", Some(CanonicalSection::Instructions))]
    #[case("Final Words.", Some(CanonicalSection::Conclusion))]
    #[case("Equipment", Some(CanonicalSection::Equipment))]
    #[case("Serving ideas", None)]
    #[case("", None)]
    fn heading_matching(#[case] heading: &str, #[case] expected: Option<CanonicalSection>) {
        assert_eq!(match_heading(heading), expected);
    }

    #[test]
    fn every_synonym_is_already_normalized() {
        for (synonym, _) in SYNONYMS {
            assert_eq!(normalize_heading(synonym), *synonym);
        }
    }

    #[test]
    fn ingredients_example() {
        let tree = parse_heading_tree(&[
            B::heading2("Ingredients"),
            B::bullet("2 cups flour"),
            B::bullet("1 cup sugar"),
        ]);
        let map = map_sections(&tree);
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get(CanonicalSection::Ingredients),
            Some(&SectionValue::Text("2 cups flour\n1 cup sugar".into()))
        );
    }

    #[test]
    fn nested_equipment_subsections_map_independently() {
        let tree = parse_heading_tree(&[
            B::heading2("Equipment"),
            B::heading3("Equipment: Must-haves"),
            B::bullet("Bowl"),
            B::heading3("Equipment: Nice-to-haves"),
            B::bullet("Mixer"),
        ]);
        let map = map_sections(&tree);
        assert!(!map.contains(CanonicalSection::Equipment));
        assert_eq!(map.get(CanonicalSection::EquipmentMust).unwrap().text(), "Bowl");
        assert_eq!(map.get(CanonicalSection::EquipmentNice).unwrap().text(), "Mixer");
    }

    #[test]
    fn unmatched_and_empty_headings_map_nothing() {
        let tree = parse_heading_tree(&[
            B::paragraph("loose intro text"),
            B::heading2("Serving ideas"),
            B::paragraph("With salad."),
            B::heading2("Conclusion"),
            B::paragraph("   "),
        ]);
        assert!(map_sections(&tree).is_empty());
    }

    #[test]
    fn mapping_is_idempotent() {
        let tree = parse_heading_tree(&[
            B::heading2("Ingredients"),
            B::bullet("Flour"),
            B::heading2("Instructions"),
            B::number("Mix"),
            B::heading2("Notes"),
            B::paragraph("Keeps for a week."),
        ]);
        assert_eq!(map_sections(&tree), map_sections(&tree));
    }

    #[test]
    fn section_value_views() {
        let text = SectionValue::from(" a \n\n b ");
        assert_eq!(text.items(), vec!["a", "b"]);
        let list = SectionValue::from(vec!["x".to_string(), " ".to_string()]);
        assert_eq!(list.items(), vec!["x"]);
        assert_eq!(list.text(), "x\n ");
        assert!(SectionValue::from(vec![" ".to_string()]).is_blank());
    }
}
