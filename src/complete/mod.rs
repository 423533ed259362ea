pub mod request;
pub mod roundup;
pub mod text;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::collab::{GenerationRequest, TextGenerator};
use crate::config::AssemblyConfig;
use crate::error::{AssemblyError, Result};
use crate::parser::sections::{CanonicalSection, CanonicalSectionMap, SectionValue};

/// Sections whose generated text is regrouped into short paragraphs.
const PROSE_SECTIONS: [CanonicalSection; 4] = [
    CanonicalSection::Intro,
    CanonicalSection::GoodToKnow,
    CanonicalSection::LowFodmap,
    CanonicalSection::Conclusion,
];

/// Fills in a partial section map with one round trip to the generator.
pub struct SectionCompleter<'a> {
    generator: &'a dyn TextGenerator,
    config: &'a AssemblyConfig,
}

impl<'a> SectionCompleter<'a> {
    pub fn new(generator: &'a dyn TextGenerator, config: &'a AssemblyConfig) -> Self {
        SectionCompleter { generator, config }
    }

    /// Returns a map with intro, both equipment lists, ingredients,
    /// instructions, good-to-know and conclusion filled. The low-FODMAP
    /// section is present only if it was present on input.
    pub fn complete(&self, sections: &CanonicalSectionMap) -> Result<CanonicalSectionMap> {
        if !sections.is_filled(CanonicalSection::Ingredients) {
            return Err(AssemblyError::MissingRequiredSection {
                section: CanonicalSection::Ingredients,
            });
        }

        let plan = request::build_plan(sections, self.config);
        info!(
            "Requesting {} sections for completion ({} present on input)",
            plan.requested.len(),
            sections.len()
        );
        let reply = request_object(self.generator, &plan.request)?;

        let mut completed = CanonicalSectionMap::new();
        for section in [
            CanonicalSection::Title,
            CanonicalSection::Ingredients,
            CanonicalSection::Instructions,
        ] {
            if let Some(value) = sections.get(section).filter(|v| !v.is_blank()) {
                completed.insert(section, value.clone());
            }
        }

        for section in &plan.requested {
            let value = section_value(*section, reply.require(section.key())?, &reply)?;
            completed.insert(*section, self.shape(*section, value));
        }

        // A combined list the generator failed to split is kept as must-haves.
        if let Some(legacy) = sections.get(CanonicalSection::Equipment).filter(|v| !v.is_blank()) {
            if !completed.is_filled(CanonicalSection::EquipmentMust)
                && !completed.is_filled(CanonicalSection::EquipmentNice)
            {
                warn!("Equipment split came back empty; keeping the source list as must-haves");
                completed.insert(CanonicalSection::EquipmentMust, legacy.items());
            }
        }

        Ok(completed)
    }

    fn shape(&self, section: CanonicalSection, value: SectionValue) -> SectionValue {
        if PROSE_SECTIONS.contains(&section) {
            let joined = match value {
                SectionValue::Text(t) => t,
                SectionValue::List(items) => items.join(" "),
            };
            SectionValue::Text(text::split_into_paragraphs(
                &joined,
                self.config.sentences_per_paragraph,
            ))
        } else {
            SectionValue::List(value.items())
        }
    }
}

/// One plain-text request for a post title, given what the post is about.
pub fn generate_title(
    generator: &dyn TextGenerator,
    config: &AssemblyConfig,
    subject: &str,
) -> Result<String> {
    let request = GenerationRequest {
        system_prompt: config.system_prompt.clone(),
        user_prompt: format!(
            "Write one catchy, SEO friendly title for a {} blog post about: {}\n\
             Reply with the title only, no quotes.",
            config.topic,
            subject.trim()
        ),
        response_schema: None,
    };
    let message = request_text(generator, &request)?;
    Ok(message.trim().trim_matches('"').trim().to_string())
}

/// Plain-text reply, unescaped if it came back entity-encoded.
pub(crate) fn request_text(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
) -> Result<String> {
    let reply = generator.generate(request)?;
    if !reply.error.is_empty() {
        return Err(AssemblyError::Generation {
            error: reply.error,
            message: reply.message,
        });
    }
    Ok(text::unescape_if_needed(&reply.message))
}

/// A reply parsed as a JSON object, with the text it was parsed from.
pub(crate) struct StructuredReply {
    fields: Map<String, Value>,
    raw: String,
}

impl StructuredReply {
    /// The value under `key`; a missing key is a format error carrying the
    /// raw reply.
    pub(crate) fn require(&self, key: &str) -> Result<&Value> {
        self.fields
            .get(key)
            .ok_or_else(|| self.format_error(format!("missing key \"{key}\"")))
    }

    pub(crate) fn format_error(&self, reason: impl Into<String>) -> AssemblyError {
        AssemblyError::response_format(reason, &self.raw)
    }
}

/// Structured reply parsed as a JSON object. The raw reply text is kept on
/// every format error.
pub(crate) fn request_object(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
) -> Result<StructuredReply> {
    let reply = generator.generate(request)?;
    if !reply.error.is_empty() {
        return Err(AssemblyError::Generation {
            error: reply.error,
            message: reply.message,
        });
    }
    match serde_json::from_str::<Value>(&reply.message) {
        Ok(Value::Object(fields)) => Ok(StructuredReply {
            fields,
            raw: reply.message,
        }),
        Ok(other) => {
            warn!("Generator replied with non-object JSON");
            Err(AssemblyError::response_format(
                format!("expected an object, got {}", json_type(&other)),
                &reply.message,
            ))
        }
        Err(e) => {
            warn!("Failed to parse generator reply: {}", e);
            Err(AssemblyError::response_format(e.to_string(), &reply.message))
        }
    }
}

fn section_value(
    section: CanonicalSection,
    value: &Value,
    reply: &StructuredReply,
) -> Result<SectionValue> {
    match value {
        Value::String(s) => Ok(SectionValue::Text(text::unescape_if_needed(s))),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(text::unescape_if_needed(s)),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(reply.format_error(format!(
                    "unexpected {} in \"{}\"",
                    json_type(other),
                    section.key()
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(SectionValue::List),
        other => Err(reply.format_error(format!(
            "unexpected {} for \"{}\"",
            json_type(other),
            section.key()
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
