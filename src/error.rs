use thiserror::Error;

use crate::parser::sections::CanonicalSection;

pub type Result<T> = std::result::Result<T, AssemblyError>;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Missing required section: {section}")]
    MissingRequiredSection { section: CanonicalSection },

    /// The reply could not be read as the requested structured object.
    /// `raw` is the unmodified reply text.
    #[error("Failed to parse AI response as JSON: {reason}")]
    ResponseFormat { reason: String, raw: String },

    #[error("More images ({images}) than H2 headings ({headings})")]
    TooManyImages { images: usize, headings: usize },

    #[error("Text generation error: {error} '{message}'")]
    Generation { error: String, message: String },

    #[error("No roundup items to render")]
    NoRoundupItems,

    #[error("Alt text is not Latin-1 encodable at char {position}: {alt_text:?}")]
    AltTextEncoding { alt_text: String, position: usize },

    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl AssemblyError {
    pub(crate) fn response_format(reason: impl Into<String>, raw: &str) -> Self {
        AssemblyError::ResponseFormat {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}
