use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const ENV_PREFIX: &str = "POST_ASSEMBLY";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional recipes writer and copywriter. \
Your style is humorous, friendly, engaging and informative. You write in a clear and concise \
manner, making complex topics easy to understand, and you are skilled at SEO writing while \
keeping the text enjoyable to read.";

/// Settings shared by every stage. Built once and handed to the stages that
/// need it; nothing reads settings from globals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub topic: String,
    pub system_prompt: String,
    pub sentences_per_paragraph: usize,
    pub site_base_url: String,
    pub cta_text: String,
    pub parallel_uploads: bool,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        AssemblyConfig {
            topic: "recipes".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            sentences_per_paragraph: 2,
            site_base_url: String::new(),
            cta_text: "Get the full recipe here".to_string(),
            parallel_uploads: false,
        }
    }
}

impl AssemblyConfig {
    /// Defaults, then the optional file, then `POST_ASSEMBLY_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to build assembly settings")?;

        let cfg: AssemblyConfig = settings
            .try_deserialize()
            .context("Invalid assembly settings")?;
        tracing::info!(
            "Assembly settings: topic={}, sentences_per_paragraph={}, site_base_url={:?}",
            cfg.topic,
            cfg.sentences_per_paragraph,
            cfg.site_base_url
        );
        Ok(cfg)
    }

    pub fn with_site_base_url(mut self, url: impl Into<String>) -> Self {
        self.site_base_url = url.into();
        self
    }

    pub fn with_sentences_per_paragraph(mut self, n: usize) -> Self {
        self.sentences_per_paragraph = n;
        self
    }
}
