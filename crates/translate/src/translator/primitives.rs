//! Lowering of primitive shapes: literals, atoms, identifiers, lists
//! and tuples, plus the runtime-namespace accessors every translator
//! emits calls through.

use basalt_estree::builder::{array, call, identifier, literal_bool, literal_float, literal_int, literal_null, literal_str, member};
use basalt_estree::Node;
use basalt_syntax::Form;
use phf::phf_map;

/// Substitutions for characters the target identifier grammar rejects.
/// The table is fixed and injective over legal source names; anything
/// not listed falls back to the codepoint spelling `__uXXXX__`.
static IDENTIFIER_SUBSTITUTIONS: phf::Map<char, &'static str> = phf_map! {
    '?' => "__qmark__",
    '!' => "__emark__",
    '@' => "__at__",
    '=' => "__eq__",
    '<' => "__lt__",
    '>' => "__gt__",
    '+' => "__plus__",
    '-' => "__minus__",
    '*' => "__star__",
    '/' => "__slash__",
    '&' => "__amp__",
    '|' => "__pipe__",
    '^' => "__caret__",
    '~' => "__tilde__",
};

/// Rewrite a source identifier into a legal target identifier. The
/// substitution is deterministic; alphanumerics and underscores pass
/// through unchanged.
pub fn filter_identifier(name: &str) -> String {
    if name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_')
    {
        return name.to_string();
    }
    let mut filtered = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' {
            filtered.push(c);
        } else if let Some(replacement) = IDENTIFIER_SUBSTITUTIONS.get(&c) {
            filtered.push_str(replacement);
        } else {
            filtered.push_str(&format!("__u{:x}__", c as u32));
        }
    }
    filtered
}

/// A member of the `SpecialForms` runtime namespace.
pub fn special_forms(name: &str) -> Node {
    member(identifier("SpecialForms"), identifier(name))
}

/// A member of the `Patterns` runtime namespace.
pub fn patterns_ns(name: &str) -> Node {
    member(identifier("Patterns"), identifier(name))
}

/// A member of the `Kernel` runtime namespace.
pub fn kernel_ns(name: &str) -> Node {
    member(identifier("Kernel"), identifier(name))
}

/// `SpecialForms.atom("name")`. The name passes through unchanged
/// (escaping is the serializer's concern), so non-ASCII atoms survive.
pub fn atom_node(name: &str) -> Node {
    call(special_forms("atom"), vec![literal_str(name)])
}

/// A literal form as a target literal.
pub fn literal(form: &Form) -> Node {
    match form {
        Form::Int(i) => literal_int(*i),
        Form::Float(x) => literal_float(*x),
        Form::Str(s) => literal_str(s.clone()),
        Form::Bool(b) => literal_bool(*b),
        _ => literal_null(),
    }
}

pub fn identifier_node(name: &str) -> Node {
    identifier(filter_identifier(name))
}

pub fn list_node(elements: Vec<Node>) -> Node {
    array(elements)
}

pub fn tuple_node(elements: Vec<Node>) -> Node {
    call(special_forms("tuple"), elements)
}
