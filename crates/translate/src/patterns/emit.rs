//! Emission of pattern descriptors into the target tree.
//!
//! Descriptors become calls into the runtime's `Patterns` namespace;
//! literal leaves stay plain values the runtime compares structurally.

use super::{Pattern, Segment};
use crate::patterns::matcher::Term;
use crate::translator::primitives::{atom_node, patterns_ns};
use basalt_estree::builder::{array, call, identifier, literal_bool, literal_float, literal_int, literal_null, literal_str, object, property};
use basalt_estree::Node;

pub fn pattern_node(pattern: &Pattern) -> Node {
    match pattern {
        Pattern::Wildcard => call(patterns_ns("wildcard"), vec![]),
        Pattern::Bind(name) => call(patterns_ns("variable"), vec![literal_str(name.clone())]),
        Pattern::Pinned(name) => call(patterns_ns("bound"), vec![identifier(name.clone())]),
        Pattern::Literal(term) => term_node(term),
        Pattern::List(items) => call(
            patterns_ns("list"),
            vec![array(items.iter().map(pattern_node).collect())],
        ),
        Pattern::HeadTail { heads, tail } => call(
            patterns_ns("head_tail"),
            vec![
                array(heads.iter().map(pattern_node).collect()),
                pattern_node(tail),
            ],
        ),
        Pattern::Tuple(items) => call(
            patterns_ns("tuple"),
            vec![array(items.iter().map(pattern_node).collect())],
        ),
        Pattern::Map(entries) => call(patterns_ns("map"), vec![entries_node(entries)]),
        Pattern::Struct { tag, fields } => call(
            patterns_ns("struct"),
            vec![literal_str(tag.clone()), entries_node(fields)],
        ),
        Pattern::Bitstring(segments) => call(
            patterns_ns("bitstring"),
            segments.iter().map(segment_node).collect(),
        ),
        Pattern::As { pattern, name } => call(
            patterns_ns("named"),
            vec![pattern_node(pattern), literal_str(name.clone())],
        ),
    }
}

fn entries_node(entries: &[(Term, Pattern)]) -> Node {
    array(
        entries
            .iter()
            .map(|(key, value)| array(vec![term_node(key), pattern_node(value)]))
            .collect(),
    )
}

fn segment_node(segment: &Segment) -> Node {
    segment_object(pattern_node(&segment.value), &segment.spec)
}

/// A bitstring segment as `{value, type, size?, unit?, signed?,
/// endianness?}`. Shared between pattern emission and bitstring
/// construction, which differ only in how the value was produced.
pub fn segment_object(value: Node, spec: &super::SegmentSpec) -> Node {
    let mut properties = vec![
        property(identifier("value"), value),
        property(identifier("type"), literal_str(spec.kind.name())),
    ];
    if let Some(size) = spec.size {
        properties.push(property(identifier("size"), literal_int(size as i64)));
    }
    if let Some(unit) = spec.unit {
        properties.push(property(identifier("unit"), literal_int(unit as i64)));
    }
    if let Some(signed) = spec.signed {
        properties.push(property(identifier("signed"), literal_bool(signed)));
    }
    if let Some(endianness) = spec.endianness {
        properties.push(property(
            identifier("endianness"),
            literal_str(endianness.name()),
        ));
    }
    object(properties)
}

/// A literal term as a target expression. Atoms go through the atom
/// constructor so every source atom maps to the same deterministic
/// target expression.
pub fn term_node(term: &Term) -> Node {
    match term {
        Term::Int(i) => literal_int(*i),
        Term::Float(x) => literal_float(*x),
        Term::Str(s) => literal_str(s.clone()),
        Term::Bool(b) => literal_bool(*b),
        Term::Nil => literal_null(),
        Term::Atom(name) => atom_node(name),
        Term::List(items) => array(items.iter().map(term_node).collect()),
        Term::Tuple(items) => call(
            crate::translator::primitives::special_forms("tuple"),
            items.iter().map(term_node).collect(),
        ),
        Term::Map(pairs) => call(
            crate::translator::primitives::special_forms("map"),
            vec![array(
                pairs
                    .iter()
                    .map(|(k, v)| array(vec![term_node(k), term_node(v)]))
                    .collect(),
            )],
        ),
        Term::Struct { tag, fields } => call(
            crate::translator::primitives::special_forms("struct"),
            vec![
                atom_node(tag),
                array(
                    fields
                        .iter()
                        .map(|(k, v)| array(vec![term_node(k), term_node(v)]))
                        .collect(),
                ),
            ],
        ),
        Term::Bits(bytes) => call(
            crate::translator::primitives::special_forms("bitstring"),
            bytes.iter().map(|b| literal_int(*b as i64)).collect(),
        ),
    }
}

/// One clause of a table: `Patterns.clause([patterns], body, guard?)`.
pub fn clause_node(patterns: Vec<Node>, body: Node, guard: Option<Node>) -> Node {
    let mut args = vec![array(patterns), body];
    if let Some(guard) = guard {
        args.push(guard);
    }
    call(patterns_ns("clause"), args)
}

/// A function-position clause table.
pub fn defmatch_node(clauses: Vec<Node>) -> Node {
    call(patterns_ns("defmatch"), clauses)
}

/// An expression-position clause table keyed on a scrutinee.
pub fn make_case_node(subject: Node, clauses: Vec<Node>) -> Node {
    let mut args = vec![subject];
    args.extend(clauses);
    call(patterns_ns("make_case"), args)
}
