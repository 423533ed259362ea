use std::sync::LazyLock;

use regex::Regex;

static BLANK_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").unwrap());

/// Split on sentence-ending punctuation followed by whitespace and regroup
/// every `sentences_per_paragraph` sentences into one line. A blank line also
/// ends a sentence, and whitespace inside a sentence collapses to one space,
/// so the output never holds a blank line.
pub fn split_into_paragraphs(text: &str, sentences_per_paragraph: usize) -> String {
    let per = sentences_per_paragraph.max(1);
    let sentences: Vec<String> = BLANK_LINE_RE
        .split(text)
        .flat_map(split_sentences)
        .collect();
    sentences
        .chunks(per)
        .map(|group| group.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(next_idx, next)) = chars.peek() {
                if next.is_whitespace() {
                    push_collapsed(&mut sentences, &text[start..next_idx]);
                    start = next_idx;
                }
            }
        }
    }
    push_collapsed(&mut sentences, &text[start..]);
    sentences
}

fn push_collapsed(out: &mut Vec<String>, piece: &str) {
    let piece = piece.split_whitespace().collect::<Vec<_>>().join(" ");
    if !piece.is_empty() {
        out.push(piece);
    }
}

/// Generated text sometimes arrives HTML-entity-escaped.
pub fn is_escaped(text: &str) -> bool {
    html_escape::decode_html_entities(text).as_ref() != text
}

pub fn unescape_if_needed(text: &str) -> String {
    if is_escaped(text) {
        html_escape::decode_html_entities(text).into_owned()
    } else {
        text.to_string()
    }
}

pub fn cta_with_link(url: &str, text: &str) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
        html_escape::encode_double_quoted_attribute(url),
        text
    )
}

/// Body with a call-to-action line appended. An empty body stays empty and an
/// empty URL leaves the body untouched.
pub fn append_cta(body: &str, url: &str, text: &str) -> String {
    if body.trim().is_empty() {
        return String::new();
    }
    if url.trim().is_empty() {
        return body.to_string();
    }
    format!("{}\n{}", body.trim_end(), cta_with_link(url.trim(), text))
}
