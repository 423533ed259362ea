pub mod blocks;
pub mod sections;
pub mod tree;

use blocks::ContentBlock;
use sections::CanonicalSectionMap;
use tree::HeadingNode;

/// Source page after parsing: the tree (kept for diagnostics and
/// round-tripping) and the sections it mapped to.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    pub tree: HeadingNode,
    pub sections: CanonicalSectionMap,
}

/// Two-pass front end: blocks → heading tree → canonical sections.
pub fn parse_source(blocks: &[ContentBlock]) -> ParsedSource {
    let tree = tree::parse_heading_tree(blocks);
    let sections = sections::map_sections(&tree);
    tracing::debug!(
        "Parsed {} blocks into {} top-level headings, {} canonical sections",
        blocks.len(),
        tree.children().len(),
        sections.len()
    );
    ParsedSource { tree, sections }
}
