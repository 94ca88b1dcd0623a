//! Source AST node definitions.
//!
//! Every construct of the source language is one of a small set of
//! shapes: a literal, an atom, a list, a two-element tuple, a bare
//! identifier, or a `(tag, metadata, children)` call form. Larger
//! constructs (`defmodule`, `case`, `fn`, operators, dotted calls) are
//! all spelled as call forms whose tag names the construct.

mod display;

use serde::{Deserialize, Serialize};
use text_size::{TextRange, TextSize};

/// Node metadata: the source span and, when the parser provides it,
/// the line number used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub span: TextRange,
    pub line: Option<u32>,
}

impl Meta {
    /// Metadata for synthesized nodes.
    pub fn none() -> Meta {
        Meta {
            span: TextRange::empty(TextSize::from(0)),
            line: None,
        }
    }
}

impl Default for Meta {
    fn default() -> Self {
        Meta::none()
    }
}

/// A source form.
///
/// Structural equality over forms is the fixed-point comparison used
/// by macro expansion: an expansion that returns an equal form is not
/// a macro and is translated literally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Form {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
    /// An interned symbol, compared by identity at runtime.
    Atom(String),
    List(Vec<Form>),
    /// The two-element tuple shape `{a, b}`.
    Pair(Box<Form>, Box<Form>),
    /// A bare identifier.
    Var(Var),
    /// A tagged form `(tag, metadata, children)`.
    Call(Call),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub target: Callee,
    pub meta: Meta,
    pub args: Vec<Form>,
}

/// The tag position of a call form: either a symbolic name
/// (`def`, `case`, `+`, …) or a nested form, as in dotted calls
/// `(., _, [mod, fun])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Callee {
    Name(String),
    Remote(Box<Form>),
}

impl Form {
    pub fn span(&self) -> TextRange {
        match self {
            Form::Var(v) => v.meta.span,
            Form::Call(c) => c.meta.span,
            _ => TextRange::empty(TextSize::from(0)),
        }
    }

    pub fn meta(&self) -> Meta {
        match self {
            Form::Var(v) => v.meta,
            Form::Call(c) => c.meta,
            _ => Meta::none(),
        }
    }

    /// True for the literal shapes (number, string, boolean, nil).
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Form::Int(_) | Form::Float(_) | Form::Str(_) | Form::Bool(_) | Form::Nil
        )
    }

    /// The call form under `self` when its tag is the given name.
    pub fn call_named(&self, name: &str) -> Option<&Call> {
        match self {
            Form::Call(c) => match &c.target {
                Callee::Name(n) if n == name => Some(c),
                _ => None,
            },
            _ => None,
        }
    }

    /// Interpret `self` as a keyword list: a list whose every element
    /// is an `(atom, value)` pair.
    pub fn as_keyword_list(&self) -> Option<Vec<(&str, &Form)>> {
        let items = match self {
            Form::List(items) => items,
            _ => return None,
        };
        let mut pairs = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Form::Pair(key, value) => match key.as_ref() {
                    Form::Atom(name) => pairs.push((name.as_str(), value.as_ref())),
                    _ => return None,
                },
                _ => return None,
            }
        }
        Some(pairs)
    }

    /// Look up a key in a keyword list form.
    pub fn keyword_get(&self, key: &str) -> Option<&Form> {
        self.as_keyword_list()?
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// The statements of a body: the children of a `__block__`, or the
    /// form itself as a single statement.
    pub fn body_forms(&self) -> Vec<&Form> {
        match self.call_named("__block__") {
            Some(block) => block.args.iter().collect(),
            None => vec![self],
        }
    }

    /// The written segments of an `__aliases__` form.
    pub fn alias_segments(&self) -> Option<Vec<String>> {
        let call = self.call_named("__aliases__")?;
        let mut segments = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            match arg {
                Form::Atom(name) => segments.push(name.clone()),
                Form::Var(v) => segments.push(v.name.clone()),
                _ => return None,
            }
        }
        if segments.is_empty() {
            None
        } else {
            Some(segments)
        }
    }
}

/// Construction helpers, used by the driver and throughout the test
/// suites to build source trees without a parser.
impl Form {
    pub fn atom(name: impl Into<String>) -> Form {
        Form::Atom(name.into())
    }

    pub fn string(value: impl Into<String>) -> Form {
        Form::Str(value.into())
    }

    pub fn var(name: impl Into<String>) -> Form {
        Form::Var(Var {
            name: name.into(),
            meta: Meta::none(),
        })
    }

    pub fn call(name: impl Into<String>, args: Vec<Form>) -> Form {
        Form::Call(Call {
            target: Callee::Name(name.into()),
            meta: Meta::none(),
            args,
        })
    }

    pub fn remote_call(target: Form, args: Vec<Form>) -> Form {
        Form::Call(Call {
            target: Callee::Remote(Box::new(target)),
            meta: Meta::none(),
            args,
        })
    }

    /// A dotted access form `(., _, [object, fun])`.
    pub fn dot(object: Form, fun: impl Into<String>) -> Form {
        Form::call(".", vec![object, Form::Atom(fun.into())])
    }

    /// An `__aliases__` reference from written segments.
    pub fn aliases(segments: &[&str]) -> Form {
        Form::call(
            "__aliases__",
            segments.iter().map(|s| Form::atom(*s)).collect(),
        )
    }

    pub fn pair(a: Form, b: Form) -> Form {
        Form::Pair(Box::new(a), Box::new(b))
    }

    /// A keyword list from `(key, value)` entries.
    pub fn kw(entries: Vec<(&str, Form)>) -> Form {
        Form::List(
            entries
                .into_iter()
                .map(|(k, v)| Form::pair(Form::atom(k), v))
                .collect(),
        )
    }

    pub fn block(forms: Vec<Form>) -> Form {
        Form::call("__block__", forms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_list_roundtrip() {
        let kw = Form::kw(vec![("do", Form::Int(1)), ("else", Form::Int(2))]);
        let pairs = kw.as_keyword_list().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "do");
        assert_eq!(kw.keyword_get("else"), Some(&Form::Int(2)));
        assert_eq!(kw.keyword_get("rescue"), None);
    }

    #[test]
    fn test_non_keyword_list() {
        let list = Form::List(vec![Form::Int(1), Form::Int(2)]);
        assert!(list.as_keyword_list().is_none());
    }

    #[test]
    fn test_alias_segments() {
        let aliases = Form::aliases(&["Hello", "World"]);
        assert_eq!(
            aliases.alias_segments().unwrap(),
            vec!["Hello".to_string(), "World".to_string()]
        );
        assert!(Form::Int(1).alias_segments().is_none());
    }

    #[test]
    fn test_body_forms_flattens_blocks() {
        let block = Form::block(vec![Form::Int(1), Form::Int(2)]);
        assert_eq!(block.body_forms().len(), 2);
        assert_eq!(Form::Int(1).body_forms().len(), 1);
    }

    #[test]
    fn test_structural_equality_is_fixed_point_comparison() {
        let a = Form::call("f", vec![Form::var("x")]);
        let b = Form::call("f", vec![Form::var("x")]);
        assert_eq!(a, b);
        let c = Form::call("f", vec![Form::var("y")]);
        assert_ne!(a, c);
    }
}
