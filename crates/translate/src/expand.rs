//! The macro-expansion collaborator.
//!
//! Expansion is an injected pure function the translator consults; the
//! host source-language interpreter is never linked in. A dispatch
//! path calls [`Expander::expand`] at most once per node: when the
//! returned form is structurally equal to the input, the node is not a
//! macro and is translated literally; otherwise translation recurses
//! on the expanded form, reaching the fixed point one step per node.

use basalt_syntax::{Env, Form};
use thiserror::Error;

/// A failure inside the expansion collaborator, propagated verbatim.
#[derive(Debug, Clone, Error)]
#[error("macro expansion failed: {message}")]
pub struct ExpandError {
    pub message: String,
}

impl ExpandError {
    pub fn new(message: impl Into<String>) -> Self {
        ExpandError {
            message: message.into(),
        }
    }
}

pub trait Expander {
    /// Expand one form. Returning a structurally equal form means
    /// "not a macro".
    fn expand(&self, form: &Form, env: &Env) -> Result<Form, ExpandError>;
}

/// The stub expander: nothing is a macro.
#[derive(Debug, Default)]
pub struct NullExpander;

impl Expander for NullExpander {
    fn expand(&self, form: &Form, _env: &Env) -> Result<Form, ExpandError> {
        Ok(form.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_expander_is_fixed_point() {
        let form = Form::call("maybe_macro", vec![Form::Int(1)]);
        let expanded = NullExpander.expand(&form, &Env::new()).unwrap();
        assert_eq!(expanded, form);
    }
}
