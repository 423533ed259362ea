use super::blocks::ContentBlock;

/// A heading and everything written under it up to the next heading.
/// The root sits at depth 0; H1/H2 nodes at 1, H3 at 2.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingNode {
    pub heading_text: String,
    pub content: String,
    depth: usize,
    children: Vec<HeadingNode>,
}

impl HeadingNode {
    fn new(heading_text: &str, depth: usize) -> Self {
        HeadingNode {
            heading_text: heading_text.to_string(),
            depth,
            ..Default::default()
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Children in the order their headings first appeared.
    pub fn children(&self) -> &[HeadingNode] {
        &self.children
    }

    pub fn child(&self, heading_text: &str) -> Option<&HeadingNode> {
        self.children.iter().find(|c| c.heading_text == heading_text)
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    fn append_text(&mut self, text: &str) {
        if !self.content.is_empty() {
            self.content.push('\n');
        }
        self.content.push_str(text);
    }

    /// Repeated heading text at one level replaces the earlier node in place.
    fn attach(&mut self, node: HeadingNode) {
        match self
            .children
            .iter_mut()
            .find(|c| c.heading_text == node.heading_text)
        {
            Some(existing) => *existing = node,
            None => self.children.push(node),
        }
    }

    /// Pre-order (heading, content) pairs, skipping the root.
    pub fn flatten(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        if !self.is_root() {
            out.push((self.heading_text.as_str(), self.content.as_str()));
        }
        for child in &self.children {
            child.flatten_into(out);
        }
    }
}

/// Build the heading tree from a flat block sequence.
///
/// Open headings live on a stack with the root at the bottom. A heading closes
/// every open node at its depth or deeper, then opens a new node under whatever
/// is left on top, so an H3 with no open H2 still hangs off the root. Paragraphs and list items are appended, newline-joined, to the
/// content of the top node; text before any heading lands on the root.
pub fn parse_heading_tree(blocks: &[ContentBlock]) -> HeadingNode {
    let mut stack: Vec<HeadingNode> = vec![HeadingNode::default()];

    for block in blocks {
        match block.heading_depth() {
            Some(depth) => {
                while stack.last().is_some_and(|top| top.depth >= depth) {
                    close_top(&mut stack);
                }
                stack.push(HeadingNode::new(&block.text, depth));
            }
            None => {
                if let Some(top) = stack.last_mut() {
                    top.append_text(&block.text);
                }
            }
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().unwrap_or_default()
}

fn close_top(stack: &mut Vec<HeadingNode>) {
    if let Some(node) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.attach(node);
        }
    }
}
