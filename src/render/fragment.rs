use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::images::UploadedImage;

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!-- wp:(heading|paragraph|list|image)(?: (\{[^}]*\}))? -->(.*?)<!-- /wp:(?:heading|paragraph|list|image) -->")
        .unwrap()
});
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    /// `text` is the heading with markup stripped; `url` is the first link
    /// inside it, if any.
    Heading {
        level: u8,
        text: String,
        url: Option<String>,
    },
    Paragraph,
    List(ListKind),
    Image,
    /// Markup outside any recognised block, kept as-is.
    Raw,
}

/// One emitted block: what it is plus its exact markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub markup: String,
}

impl Fragment {
    pub fn heading(level: u8, text: &str) -> Self {
        Self::heading_linked(level, text, None)
    }

    /// Heading whose text is wrapped in a link when `url` is non-empty. The
    /// text is stored plain and HTML-escaped in the markup.
    pub fn heading_linked(level: u8, text: &str, url: Option<&str>) -> Self {
        let text = text.trim();
        let url = url.map(str::trim).filter(|u| !u.is_empty());
        let escaped = html_escape::encode_text(text);
        let inner = match url {
            Some(u) => format!(
                "<a href=\"{}\">{}</a>",
                html_escape::encode_double_quoted_attribute(u),
                escaped
            ),
            None => escaped.into_owned(),
        };
        let open = if level == 2 {
            "<!-- wp:heading -->".to_string()
        } else {
            format!("<!-- wp:heading {} -->", json!({ "level": level }))
        };
        Fragment {
            kind: FragmentKind::Heading {
                level,
                text: text.to_string(),
                url: url.map(str::to_string),
            },
            markup: format!(
                "{open}<h{level} class=\"wp-block-heading\">{inner}</h{level}><!-- /wp:heading -->"
            ),
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Fragment {
            kind: FragmentKind::Paragraph,
            markup: format!("<!-- wp:paragraph --><p>{}</p><!-- /wp:paragraph -->", text.trim()),
        }
    }

    pub fn list<S: AsRef<str>>(kind: ListKind, items: &[S]) -> Self {
        let items: String = items
            .iter()
            .map(|i| i.as_ref().trim())
            .filter(|i| !i.is_empty())
            .map(|i| format!("<li>{i}</li>"))
            .collect();
        let markup = match kind {
            ListKind::Unordered => format!(
                "<!-- wp:list --><ul class=\"wp-block-list\">{items}</ul><!-- /wp:list -->"
            ),
            ListKind::Ordered => format!(
                "<!-- wp:list {{\"ordered\":true}} --><ol class=\"wp-block-list\">{items}</ol><!-- /wp:list -->"
            ),
        };
        Fragment {
            kind: FragmentKind::List(kind),
            markup,
        }
    }

    pub fn image(media: &UploadedImage) -> Self {
        let attrs = match &media.link_url {
            Some(_) => json!({ "id": media.id, "sizeSlug": "large", "linkDestination": "custom" }),
            None => json!({ "id": media.id, "sizeSlug": "large", "linkDestination": "none" }),
        };
        let img = format!(
            "<img src=\"{}\" alt=\"{}\" class=\"wp-image-{}\"/>",
            html_escape::encode_double_quoted_attribute(&media.remote_url),
            html_escape::encode_double_quoted_attribute(&media.alt_text),
            media.id
        );
        let inner = match &media.link_url {
            Some(link) => format!(
                "<a href=\"{}\">{img}</a>",
                html_escape::encode_double_quoted_attribute(link)
            ),
            None => img,
        };
        Fragment {
            kind: FragmentKind::Image,
            markup: format!(
                "<!-- wp:image {attrs} --><figure class=\"wp-block-image size-large\">{inner}</figure><!-- /wp:image -->"
            ),
        }
    }

    pub fn heading_text(&self) -> Option<&str> {
        match &self.kind {
            FragmentKind::Heading { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            FragmentKind::Heading { level, .. } => Some(level),
            _ => None,
        }
    }
}

/// One paragraph fragment per non-blank line.
pub fn paragraphs(text: &str) -> Vec<Fragment> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(Fragment::paragraph)
        .collect()
}

/// Recover fragments from stored block markup. Anything between recognised
/// blocks that is not whitespace comes back as a `Raw` fragment.
pub fn parse_markup(markup: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut last = 0;

    for caps in BLOCK_RE.captures_iter(markup) {
        let Some(whole) = caps.get(0) else { continue };
        push_raw(&mut fragments, &markup[last..whole.start()]);
        last = whole.end();

        let attrs: Value = caps
            .get(2)
            .and_then(|m| serde_json::from_str(m.as_str()).ok())
            .unwrap_or(Value::Null);
        let body = &caps[3];
        let kind = match &caps[1] {
            "heading" => {
                let level = attrs
                    .get("level")
                    .and_then(Value::as_u64)
                    .and_then(|l| u8::try_from(l).ok())
                    .unwrap_or(2);
                FragmentKind::Heading {
                    level,
                    text: html_escape::decode_html_entities(TAG_RE.replace_all(body, "").trim()).into_owned(),
                    url: HREF_RE
                        .captures(body)
                        .map(|c| html_escape::decode_html_entities(&c[1]).into_owned()),
                }
            }
            "list" => {
                if attrs.get("ordered").and_then(Value::as_bool).unwrap_or(false) {
                    FragmentKind::List(ListKind::Ordered)
                } else {
                    FragmentKind::List(ListKind::Unordered)
                }
            }
            "image" => FragmentKind::Image,
            _ => FragmentKind::Paragraph,
        };
        fragments.push(Fragment {
            kind,
            markup: whole.as_str().to_string(),
        });
    }
    push_raw(&mut fragments, &markup[last..]);
    fragments
}

fn push_raw(out: &mut Vec<Fragment>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        out.push(Fragment {
            kind: FragmentKind::Raw,
            markup: text.to_string(),
        });
    }
}
