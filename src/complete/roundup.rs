use std::fmt::Write as _;

use serde_json::Value;
use tracing::info;

use super::{request_object, text};
use crate::collab::{FieldKind, GenerationRequest, ResponseSchema, TextGenerator};
use crate::config::AssemblyConfig;
use crate::error::{AssemblyError, Result};
use crate::render::roundup::RoundupItem;

/// One entry a roundup is built from, as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundupSource {
    pub title: String,
    pub link_url: String,
    pub notes: String,
}

/// Everything the roundup renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundupContent {
    pub title: String,
    pub intro: String,
    pub conclusion: String,
    pub items: Vec<RoundupItem>,
}

const KEYS: [&str; 3] = ["title", "intro", "conclusion"];

/// Turn sources into items (CTA appended) and generate the surrounding title,
/// intro and conclusion in one structured request.
pub fn generate_roundup(
    generator: &dyn TextGenerator,
    config: &AssemblyConfig,
    sources: &[RoundupSource],
) -> Result<RoundupContent> {
    if sources.is_empty() {
        return Err(AssemblyError::NoRoundupItems);
    }

    let items: Vec<RoundupItem> = sources
        .iter()
        .map(|s| RoundupItem {
            title: s.title.trim().to_string(),
            body: text::append_cta(&s.notes, &s.link_url, &config.cta_text),
            link_url: s.link_url.trim().to_string(),
        })
        .collect();

    let request = build_request(config, sources);
    info!("Requesting roundup framing for {} items", items.len());
    let reply = request_object(generator, &request)?;

    let field = |key: &str| -> Result<String> {
        match reply.require(key)? {
            Value::String(s) => Ok(text::unescape_if_needed(s)),
            _ => Err(reply.format_error(format!("\"{key}\" is not a string"))),
        }
    };
    let title = field("title")?;
    let intro = field("intro")?;
    let conclusion = field("conclusion")?;

    let n = config.sentences_per_paragraph;
    Ok(RoundupContent {
        title: title.trim().trim_matches('"').to_string(),
        intro: text::split_into_paragraphs(&intro, n),
        conclusion: text::split_into_paragraphs(&conclusion, n),
        items,
    })
}

fn build_request(config: &AssemblyConfig, sources: &[RoundupSource]) -> GenerationRequest {
    let mut prompt = format!(
        "Write the title, an intro and a conclusion for a {} roundup blog post featuring:\n",
        config.topic
    );
    for source in sources {
        let notes = source.notes.trim();
        if notes.is_empty() {
            let _ = writeln!(prompt, "- {}", source.title.trim());
        } else {
            let _ = writeln!(prompt, "- {}: {}", source.title.trim(), notes);
        }
    }
    prompt.push_str("\nReply with a single JSON object with the string keys title, intro, conclusion.");

    let schema = KEYS
        .iter()
        .fold(ResponseSchema::default(), |s, key| s.field(*key, FieldKind::Text));
    GenerationRequest {
        system_prompt: config.system_prompt.clone(),
        user_prompt: prompt,
        response_schema: Some(schema),
    }
}
