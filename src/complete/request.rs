use std::fmt::Write as _;

use crate::collab::{FieldKind, GenerationRequest, ResponseSchema};
use crate::config::AssemblyConfig;
use crate::parser::sections::{CanonicalSection, CanonicalSectionMap};

/// What the generator is asked to do for one reply key.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive {
    Generate,
    Polish(String),
}

/// The single request for a partial map, plus the sections its reply fills.
#[derive(Debug, Clone)]
pub struct CompletionPlan {
    pub request: GenerationRequest,
    pub requested: Vec<CanonicalSection>,
}

const EQUIPMENT_SOURCES: [CanonicalSection; 3] = [
    CanonicalSection::Equipment,
    CanonicalSection::EquipmentMust,
    CanonicalSection::EquipmentNice,
];

pub fn build_plan(map: &CanonicalSectionMap, config: &AssemblyConfig) -> CompletionPlan {
    let mut schema = ResponseSchema::default();
    let mut requested = Vec::new();
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "Complete the missing parts of a {} blog post and polish the parts that already exist.",
        config.topic
    );
    if let Some(ingredients) = map.get(CanonicalSection::Ingredients) {
        let _ = writeln!(prompt, "\nIngredients, for context only:\n{}", ingredients.text().trim());
    }
    if let Some(instructions) = map.get(CanonicalSection::Instructions) {
        if !instructions.is_blank() {
            let _ = writeln!(prompt, "\nInstructions, for context only:\n{}", instructions.text().trim());
        }
    }
    prompt.push_str("\nSections:\n");

    push_section(&mut prompt, &mut schema, &mut requested, map, CanonicalSection::Intro, FieldKind::Text);
    push_equipment(&mut prompt, &mut schema, &mut requested, map);
    if !map.is_filled(CanonicalSection::Instructions) {
        push_directive(
            &mut prompt,
            &mut schema,
            &mut requested,
            CanonicalSection::Instructions,
            FieldKind::List,
            Directive::Generate,
        );
    }
    push_section(&mut prompt, &mut schema, &mut requested, map, CanonicalSection::GoodToKnow, FieldKind::Text);
    // Only ever polished: a source that never mentioned it must not gain one.
    if map.is_filled(CanonicalSection::LowFodmap) {
        push_section(&mut prompt, &mut schema, &mut requested, map, CanonicalSection::LowFodmap, FieldKind::Text);
    }
    push_section(&mut prompt, &mut schema, &mut requested, map, CanonicalSection::Conclusion, FieldKind::Text);

    let keys = schema.names().collect::<Vec<_>>().join(", ");
    let _ = write!(
        prompt,
        "\nReply with a single JSON object with exactly these keys: {keys}. \
         Text sections are strings, list sections are arrays of strings."
    );

    CompletionPlan {
        request: GenerationRequest {
            system_prompt: config.system_prompt.clone(),
            user_prompt: prompt,
            response_schema: Some(schema),
        },
        requested,
    }
}

fn push_section(
    prompt: &mut String,
    schema: &mut ResponseSchema,
    requested: &mut Vec<CanonicalSection>,
    map: &CanonicalSectionMap,
    section: CanonicalSection,
    kind: FieldKind,
) {
    let directive = match map.get(section) {
        Some(value) if !value.is_blank() => Directive::Polish(value.text().trim().to_string()),
        _ => Directive::Generate,
    };
    push_directive(prompt, schema, requested, section, kind, directive);
}

fn push_directive(
    prompt: &mut String,
    schema: &mut ResponseSchema,
    requested: &mut Vec<CanonicalSection>,
    section: CanonicalSection,
    kind: FieldKind,
    directive: Directive,
) {
    let key = section.key();
    match directive {
        Directive::Generate => {
            let _ = writeln!(prompt, "- \"{key}\": write this section from scratch.");
        }
        Directive::Polish(existing) => {
            let _ = writeln!(
                prompt,
                "- \"{key}\": review and smooth this existing text, keeping its facts:\n<<<\n{existing}\n>>>"
            );
        }
    }
    *schema = std::mem::take(schema).field(key, kind);
    requested.push(section);
}

/// Must-have and nice-to-have lists are always requested together. With no
/// equipment at all they are generated; otherwise whatever exists (including a
/// legacy combined list) is split or merged into the two.
fn push_equipment(
    prompt: &mut String,
    schema: &mut ResponseSchema,
    requested: &mut Vec<CanonicalSection>,
    map: &CanonicalSectionMap,
) {
    let must = CanonicalSection::EquipmentMust.key();
    let nice = CanonicalSection::EquipmentNice.key();
    let present: Vec<_> = EQUIPMENT_SOURCES
        .iter()
        .filter(|s| map.is_filled(**s))
        .filter_map(|s| map.get(*s).map(|v| (*s, v.text())))
        .collect();

    if present.is_empty() {
        let _ = writeln!(
            prompt,
            "- \"{must}\" and \"{nice}\": generate a list of must-have equipment and a list of nice-to-have equipment."
        );
    } else {
        let _ = writeln!(
            prompt,
            "- \"{must}\" and \"{nice}\": split or merge the existing equipment below into a must-have list and a nice-to-have list."
        );
        for (section, text) in present {
            let _ = writeln!(prompt, "  {}:\n<<<\n{}\n>>>", section.key(), text.trim());
        }
    }

    *schema = std::mem::take(schema)
        .field(must, FieldKind::List)
        .field(nice, FieldKind::List);
    requested.push(CanonicalSection::EquipmentMust);
    requested.push(CanonicalSection::EquipmentNice);
}
