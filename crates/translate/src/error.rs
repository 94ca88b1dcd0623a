//! Translator error types.

use crate::expand::ExpandError;
use text_size::TextRange;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TranslateError {
    /// A reflective or intentionally-rejected construct.
    #[error("unsupported form `{form}` at {}", format_range(.span))]
    Unsupported { form: String, span: TextRange },

    /// The AST did not match any known shape at this position.
    #[error("malformed {construct} at {}: {detail}", format_range(.span))]
    ShapeMismatch {
        construct: &'static str,
        detail: String,
        span: TextRange,
    },

    /// Two modules with identical segment lists from distinct sources.
    #[error("duplicate module `{name}` (first defined in {first}, redefined in {second})")]
    DuplicateModule {
        name: String,
        first: String,
        second: String,
    },

    /// Macro expansion failed; the collaborator's message is carried
    /// through unchanged.
    #[error(transparent)]
    Expansion(#[from] ExpandError),
}

fn format_range(range: &TextRange) -> String {
    format!("{:?}..{:?}", range.start(), range.end())
}

impl TranslateError {
    pub fn unsupported(form: impl ToString, span: TextRange) -> Self {
        TranslateError::Unsupported {
            form: form.to_string(),
            span,
        }
    }

    pub fn shape(construct: &'static str, detail: impl Into<String>, span: TextRange) -> Self {
        TranslateError::ShapeMismatch {
            construct,
            detail: detail.into(),
            span,
        }
    }
}

pub type TranslateResult<T> = Result<T, TranslateError>;
