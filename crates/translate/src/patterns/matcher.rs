//! Host-side structural matcher.
//!
//! A small runtime that matches lowered [`Pattern`] descriptors
//! against [`Term`] values, mirroring the semantics of the emitted
//! clause tables: top-to-bottom, first structural match wins, binding
//! order is pattern traversal order. The test suites use it to check
//! that lowering a pattern and matching the original value yields the
//! expected bindings.
//!
//! Bitstring matching covers byte-aligned integer, float and binary
//! segments; utf segments are construction-only.

use super::{Pattern, Segment, SegmentKind, SegmentSpec};

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
    Atom(String),
    List(Vec<Term>),
    Tuple(Vec<Term>),
    Map(Vec<(Term, Term)>),
    Struct {
        tag: String,
        fields: Vec<(Term, Term)>,
    },
    Bits(Vec<u8>),
}

/// Bound slots in binding order.
pub type Bindings = Vec<(String, Term)>;

/// Match a single pattern, starting from no bindings.
pub fn match_term(pattern: &Pattern, term: &Term) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    if match_into(pattern, term, &mut bindings) {
        Some(bindings)
    } else {
        None
    }
}

/// The no-throw predicate: does the pattern match at all.
pub fn matches(pattern: &Pattern, term: &Term) -> bool {
    match_term(pattern, term).is_some()
}

/// Dispatch a clause table: each clause is one parameter-pattern row.
/// Returns the index of the first clause whose row matches the
/// arguments, with the accumulated bindings. Zero clauses never match.
pub fn first_match(clauses: &[Vec<Pattern>], args: &[Term]) -> Option<(usize, Bindings)> {
    for (index, row) in clauses.iter().enumerate() {
        if row.len() != args.len() {
            continue;
        }
        let mut bindings = Bindings::new();
        if row
            .iter()
            .zip(args)
            .all(|(pattern, arg)| match_into(pattern, arg, &mut bindings))
        {
            return Some((index, bindings));
        }
    }
    None
}

fn match_into(pattern: &Pattern, term: &Term, bindings: &mut Bindings) -> bool {
    match pattern {
        Pattern::Wildcard => true,
        Pattern::Bind(name) => match bindings.iter().find(|(n, _)| n == name) {
            // A repeated slot must match the same value.
            Some((_, bound)) => bound == term,
            None => {
                bindings.push((name.clone(), term.clone()));
                true
            }
        },
        Pattern::Pinned(name) => bindings
            .iter()
            .find(|(n, _)| n == name)
            .is_some_and(|(_, bound)| bound == term),
        Pattern::Literal(value) => value == term,
        Pattern::List(items) => match term {
            Term::List(values) => {
                items.len() == values.len()
                    && items
                        .iter()
                        .zip(values)
                        .all(|(p, v)| match_into(p, v, bindings))
            }
            _ => false,
        },
        Pattern::HeadTail { heads, tail } => match term {
            Term::List(values) => {
                values.len() >= heads.len()
                    && heads
                        .iter()
                        .zip(values)
                        .all(|(p, v)| match_into(p, v, bindings))
                    && match_into(tail, &Term::List(values[heads.len()..].to_vec()), bindings)
            }
            _ => false,
        },
        Pattern::Tuple(items) => match term {
            Term::Tuple(values) => {
                items.len() == values.len()
                    && items
                        .iter()
                        .zip(values)
                        .all(|(p, v)| match_into(p, v, bindings))
            }
            _ => false,
        },
        Pattern::Map(entries) => match term {
            Term::Map(pairs) => match_entries(entries, pairs, bindings),
            // A plain map pattern also matches a struct's fields.
            Term::Struct { fields, .. } => match_entries(entries, fields, bindings),
            _ => false,
        },
        Pattern::Struct { tag, fields } => match term {
            Term::Struct {
                tag: value_tag,
                fields: value_fields,
            } => tag == value_tag && match_entries(fields, value_fields, bindings),
            _ => false,
        },
        Pattern::Bitstring(segments) => match term {
            Term::Bits(bytes) => match_bits(segments, bytes, bindings),
            Term::Str(s) => match_bits(segments, s.as_bytes(), bindings),
            _ => false,
        },
        Pattern::As { pattern, name } => {
            match_into(pattern, term, bindings)
                && match_into(&Pattern::Bind(name.clone()), term, bindings)
        }
    }
}

fn match_entries(
    entries: &[(Term, Pattern)],
    pairs: &[(Term, Term)],
    bindings: &mut Bindings,
) -> bool {
    entries.iter().all(|(key, pattern)| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .is_some_and(|(_, value)| match_into(pattern, value, bindings))
    })
}

fn match_bits(segments: &[Segment], bytes: &[u8], bindings: &mut Bindings) -> bool {
    let mut offset = 0usize;
    for (index, segment) in segments.iter().enumerate() {
        let is_last = index == segments.len() - 1;
        match segment.spec.kind {
            SegmentKind::Integer => {
                let Some(width) = byte_width(&segment.spec, 8, 1) else {
                    return false;
                };
                let Some(slice) = bytes.get(offset..offset + width) else {
                    return false;
                };
                let value = decode_int(slice, &segment.spec);
                if !match_into(&segment.value, &Term::Int(value), bindings) {
                    return false;
                }
                offset += width;
            }
            SegmentKind::Float => {
                let Some(width) = byte_width(&segment.spec, 64, 1) else {
                    return false;
                };
                let Some(slice) = bytes.get(offset..offset + width) else {
                    return false;
                };
                let value = match width {
                    4 => {
                        let mut buf = [0u8; 4];
                        buf.copy_from_slice(slice);
                        f32::from_be_bytes(buf) as f64
                    }
                    8 => {
                        let mut buf = [0u8; 8];
                        buf.copy_from_slice(slice);
                        f64::from_be_bytes(buf)
                    }
                    _ => return false,
                };
                if !match_into(&segment.value, &Term::Float(value), bindings) {
                    return false;
                }
                offset += width;
            }
            SegmentKind::Binary | SegmentKind::Bitstring => {
                // A sized binary takes `size` bytes; an unsized one
                // takes the rest and must be the final segment.
                let width = match segment.spec.size {
                    Some(size) => size as usize * segment.spec.unit.unwrap_or(1) as usize,
                    None if is_last => bytes.len().saturating_sub(offset),
                    None => return false,
                };
                let Some(slice) = bytes.get(offset..offset + width) else {
                    return false;
                };
                let sub = match std::str::from_utf8(slice) {
                    Ok(s) => Term::Str(s.to_string()),
                    Err(_) => Term::Bits(slice.to_vec()),
                };
                if !match_into(&segment.value, &sub, bindings) {
                    return false;
                }
                offset += width;
            }
            SegmentKind::Utf8 | SegmentKind::Utf16 | SegmentKind::Utf32 => return false,
        }
    }
    offset == bytes.len()
}

/// The width in whole bytes of a sized segment; sub-byte sizes are not
/// supported host-side.
fn byte_width(spec: &SegmentSpec, default_size: u32, default_unit: u32) -> Option<usize> {
    let bits = spec.size.unwrap_or(default_size) * spec.unit.unwrap_or(default_unit);
    if bits == 0 || bits % 8 != 0 {
        None
    } else {
        Some((bits / 8) as usize)
    }
}

fn decode_int(slice: &[u8], spec: &SegmentSpec) -> i64 {
    let little = matches!(spec.endianness, Some(super::Endianness::Little));
    let mut value: u64 = 0;
    if little {
        for &byte in slice.iter().rev() {
            value = (value << 8) | byte as u64;
        }
    } else {
        for &byte in slice {
            value = (value << 8) | byte as u64;
        }
    }
    if spec.signed == Some(true) {
        let bits = (slice.len() * 8) as u32;
        if bits < 64 && value >= 1 << (bits - 1) {
            return value as i64 - (1i64 << bits);
        }
    }
    value as i64
}
