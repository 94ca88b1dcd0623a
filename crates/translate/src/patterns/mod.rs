//! Pattern descriptors and their lowering from source forms.
//!
//! The target language has no pattern matching; function and `case`
//! clauses lower to descriptor trees consumed by the runtime's clause
//! tables. The same descriptors drive the host-side matcher in
//! [`matcher`], which the test suites use to check lowered patterns
//! against values directly.

pub mod emit;
pub mod matcher;

use crate::error::{TranslateError, TranslateResult};
use basalt_syntax::{Env, Form};
use matcher::Term;

/// A lowered pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Matches anything, binds nothing.
    Wildcard,
    /// Matches anything, binds the value to a named slot.
    Bind(String),
    /// Matches by structural equality.
    Literal(Term),
    /// Matches when equal to an already-bound slot (`^x`).
    Pinned(String),
    List(Vec<Pattern>),
    /// `[h1, h2 | tail]`.
    HeadTail {
        heads: Vec<Pattern>,
        tail: Box<Pattern>,
    },
    Tuple(Vec<Pattern>),
    /// Entries are literal keys; the value may carry further pattern
    /// structure. Matching is by subset: extra keys on the value are
    /// ignored.
    Map(Vec<(Term, Pattern)>),
    /// A struct pattern checks the tag, then matches fields like a map.
    Struct {
        tag: String,
        fields: Vec<(Term, Pattern)>,
    },
    Bitstring(Vec<Segment>),
    /// `pattern = name`: match the pattern, then also bind the whole
    /// value.
    As {
        pattern: Box<Pattern>,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub value: Box<Pattern>,
    pub spec: SegmentSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpec {
    pub kind: SegmentKind,
    pub size: Option<u32>,
    pub unit: Option<u32>,
    pub signed: Option<bool>,
    pub endianness: Option<Endianness>,
}

impl SegmentSpec {
    pub fn of_kind(kind: SegmentKind) -> SegmentSpec {
        SegmentSpec {
            kind,
            size: None,
            unit: None,
            signed: None,
            endianness: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Integer,
    Float,
    Binary,
    Bitstring,
    Utf8,
    Utf16,
    Utf32,
}

impl SegmentKind {
    pub fn name(self) -> &'static str {
        match self {
            SegmentKind::Integer => "integer",
            SegmentKind::Float => "float",
            SegmentKind::Binary => "binary",
            SegmentKind::Bitstring => "bitstring",
            SegmentKind::Utf8 => "utf8",
            SegmentKind::Utf16 => "utf16",
            SegmentKind::Utf32 => "utf32",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
    Native,
}

impl Endianness {
    pub fn name(self) -> &'static str {
        match self {
            Endianness::Big => "big",
            Endianness::Little => "little",
            Endianness::Native => "native",
        }
    }
}

impl Pattern {
    /// The bound slot names in traversal order. A name repeated in the
    /// pattern appears once; the matcher enforces equality on repeats.
    pub fn bindings(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_bindings(&mut names);
        names
    }

    fn collect_bindings(&self, names: &mut Vec<String>) {
        fn push(names: &mut Vec<String>, name: &String) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        match self {
            Pattern::Wildcard | Pattern::Literal(_) | Pattern::Pinned(_) => {}
            Pattern::Bind(name) => push(names, name),
            Pattern::List(items) | Pattern::Tuple(items) => {
                for item in items {
                    item.collect_bindings(names);
                }
            }
            Pattern::HeadTail { heads, tail } => {
                for head in heads {
                    head.collect_bindings(names);
                }
                tail.collect_bindings(names);
            }
            Pattern::Map(entries) => {
                for (_, value) in entries {
                    value.collect_bindings(names);
                }
            }
            Pattern::Struct { fields, .. } => {
                for (_, value) in fields {
                    value.collect_bindings(names);
                }
            }
            Pattern::Bitstring(segments) => {
                for segment in segments {
                    segment.value.collect_bindings(names);
                }
            }
            Pattern::As { pattern, name } => {
                pattern.collect_bindings(names);
                push(names, name);
            }
        }
    }
}

/// Lower a source form in pattern position.
pub fn lower(env: &Env, form: &Form) -> TranslateResult<Pattern> {
    match form {
        Form::Int(i) => Ok(Pattern::Literal(Term::Int(*i))),
        Form::Float(x) => Ok(Pattern::Literal(Term::Float(*x))),
        Form::Str(s) => Ok(Pattern::Literal(Term::Str(s.clone()))),
        Form::Bool(b) => Ok(Pattern::Literal(Term::Bool(*b))),
        Form::Nil => Ok(Pattern::Literal(Term::Nil)),
        Form::Atom(a) => Ok(Pattern::Literal(Term::Atom(a.clone()))),
        Form::Var(v) if v.name == "_" => Ok(Pattern::Wildcard),
        Form::Var(v) => Ok(Pattern::Bind(crate::translator::primitives::filter_identifier(
            &v.name,
        ))),
        Form::List(items) => lower_list(env, items),
        Form::Pair(a, b) => Ok(Pattern::Tuple(vec![lower(env, a)?, lower(env, b)?])),
        Form::Call(call) => {
            let span = call.meta.span;
            match &call.target {
                basalt_syntax::Callee::Name(name) => match name.as_str() {
                    "{}" => {
                        let items = call
                            .args
                            .iter()
                            .map(|arg| lower(env, arg))
                            .collect::<TranslateResult<Vec<_>>>()?;
                        Ok(Pattern::Tuple(items))
                    }
                    "%{}" => Ok(Pattern::Map(lower_map_entries(env, &call.args, span)?)),
                    "%" => lower_struct(env, &call.args, span),
                    "<<>>" => {
                        let segments = call
                            .args
                            .iter()
                            .map(|arg| lower_segment(env, arg))
                            .collect::<TranslateResult<Vec<_>>>()?;
                        Ok(Pattern::Bitstring(segments))
                    }
                    "|" => {
                        // A bare cons outside list brackets.
                        let [head, tail] = call.args.as_slice() else {
                            return Err(TranslateError::shape("pattern", "malformed cons", span));
                        };
                        Ok(Pattern::HeadTail {
                            heads: vec![lower(env, head)?],
                            tail: Box::new(lower(env, tail)?),
                        })
                    }
                    "=" => lower_as(env, &call.args, span),
                    "^" => match call.args.as_slice() {
                        [Form::Var(v)] => Ok(Pattern::Pinned(
                            crate::translator::primitives::filter_identifier(&v.name),
                        )),
                        _ => Err(TranslateError::shape("pattern", "malformed pin", span)),
                    },
                    // Rescue-clause type test: `e in RuntimeError`.
                    "in" => match call.args.as_slice() {
                        [Form::Var(v), tag] => {
                            let segments = tag.alias_segments().ok_or_else(|| {
                                TranslateError::shape("pattern", "expected exception module", span)
                            })?;
                            Ok(Pattern::As {
                                pattern: Box::new(Pattern::Struct {
                                    tag: env.resolve_alias(&segments).name(),
                                    fields: Vec::new(),
                                }),
                                name: crate::translator::primitives::filter_identifier(&v.name),
                            })
                        }
                        _ => Err(TranslateError::shape("pattern", "malformed type test", span)),
                    },
                    other => Err(TranslateError::shape(
                        "pattern",
                        format!("`{}` is not a pattern", other),
                        span,
                    )),
                },
                basalt_syntax::Callee::Remote(_) => {
                    Err(TranslateError::shape("pattern", "remote call in pattern", span))
                }
            }
        }
    }
}

fn lower_list(env: &Env, items: &[Form]) -> TranslateResult<Pattern> {
    if let Some((last, heads)) = items.split_last() {
        if let Some(cons) = last.call_named("|") {
            let [cons_head, cons_tail] = cons.args.as_slice() else {
                return Err(TranslateError::shape(
                    "pattern",
                    "malformed cons",
                    cons.meta.span,
                ));
            };
            let mut lowered = heads
                .iter()
                .map(|head| lower(env, head))
                .collect::<TranslateResult<Vec<_>>>()?;
            lowered.push(lower(env, cons_head)?);
            return Ok(Pattern::HeadTail {
                heads: lowered,
                tail: Box::new(lower(env, cons_tail)?),
            });
        }
    }
    let lowered = items
        .iter()
        .map(|item| lower(env, item))
        .collect::<TranslateResult<Vec<_>>>()?;
    Ok(Pattern::List(lowered))
}

fn lower_map_entries(
    env: &Env,
    args: &[Form],
    span: text_size::TextRange,
) -> TranslateResult<Vec<(Term, Pattern)>> {
    let mut entries = Vec::with_capacity(args.len());
    for arg in args {
        let Form::Pair(key, value) = arg else {
            return Err(TranslateError::shape("pattern", "malformed map entry", span));
        };
        let key = literal_term(key).ok_or_else(|| {
            TranslateError::shape("pattern", "map pattern keys must be literals", span)
        })?;
        entries.push((key, lower(env, value)?));
    }
    Ok(entries)
}

fn lower_struct(
    env: &Env,
    args: &[Form],
    span: text_size::TextRange,
) -> TranslateResult<Pattern> {
    let [target, map] = args else {
        return Err(TranslateError::shape("pattern", "malformed struct", span));
    };
    let segments = target
        .alias_segments()
        .ok_or_else(|| TranslateError::shape("pattern", "malformed struct name", span))?;
    let tag = env.resolve_alias(&segments).name();
    let fields = match map.call_named("%{}") {
        Some(call) => lower_map_entries(env, &call.args, span)?,
        None => {
            return Err(TranslateError::shape("pattern", "malformed struct body", span));
        }
    };
    Ok(Pattern::Struct { tag, fields })
}

fn lower_as(env: &Env, args: &[Form], span: text_size::TextRange) -> TranslateResult<Pattern> {
    let [left, right] = args else {
        return Err(TranslateError::shape("pattern", "malformed match alias", span));
    };
    match (left, right) {
        (pattern, Form::Var(v)) => Ok(Pattern::As {
            pattern: Box::new(lower(env, pattern)?),
            name: crate::translator::primitives::filter_identifier(&v.name),
        }),
        (Form::Var(v), pattern) => Ok(Pattern::As {
            pattern: Box::new(lower(env, pattern)?),
            name: crate::translator::primitives::filter_identifier(&v.name),
        }),
        _ => Err(TranslateError::shape(
            "pattern",
            "one side of `=` in a pattern must be a name",
            span,
        )),
    }
}

fn lower_segment(env: &Env, form: &Form) -> TranslateResult<Segment> {
    let (value, spec) = segment_parts(form)?;
    Ok(Segment {
        value: Box::new(lower(env, value)?),
        spec,
    })
}

/// Split a bitstring element into its value form and segment spec.
/// Shared between pattern lowering and bitstring construction.
pub fn segment_parts(form: &Form) -> TranslateResult<(&Form, SegmentSpec)> {
    if let Some(call) = form.call_named("::") {
        let [value, spec_form] = call.args.as_slice() else {
            return Err(TranslateError::shape(
                "bitstring",
                "malformed segment",
                call.meta.span,
            ));
        };
        let mut spec = default_spec(value);
        apply_spec(spec_form, &mut spec)?;
        Ok((value, spec))
    } else {
        Ok((form, default_spec(form)))
    }
}

fn default_spec(value: &Form) -> SegmentSpec {
    match value {
        Form::Str(_) => SegmentSpec::of_kind(SegmentKind::Binary),
        Form::Float(_) => SegmentSpec::of_kind(SegmentKind::Float),
        _ => SegmentSpec::of_kind(SegmentKind::Integer),
    }
}

fn apply_spec(form: &Form, spec: &mut SegmentSpec) -> TranslateResult<()> {
    match form {
        Form::Int(n) => {
            spec.size = Some(*n as u32);
            Ok(())
        }
        Form::Var(v) => {
            match v.name.as_str() {
                "integer" => spec.kind = SegmentKind::Integer,
                "float" => spec.kind = SegmentKind::Float,
                "binary" | "bytes" => spec.kind = SegmentKind::Binary,
                "bitstring" | "bits" => spec.kind = SegmentKind::Bitstring,
                "utf8" => spec.kind = SegmentKind::Utf8,
                "utf16" => spec.kind = SegmentKind::Utf16,
                "utf32" => spec.kind = SegmentKind::Utf32,
                "signed" => spec.signed = Some(true),
                "unsigned" => spec.signed = Some(false),
                "big" => spec.endianness = Some(Endianness::Big),
                "little" => spec.endianness = Some(Endianness::Little),
                "native" => spec.endianness = Some(Endianness::Native),
                other => {
                    return Err(TranslateError::shape(
                        "bitstring",
                        format!("unknown segment option `{}`", other),
                        v.meta.span,
                    ));
                }
            }
            Ok(())
        }
        Form::Call(call) => match &call.target {
            basalt_syntax::Callee::Name(name) => match name.as_str() {
                "-" => {
                    for arg in &call.args {
                        apply_spec(arg, spec)?;
                    }
                    Ok(())
                }
                "size" => match call.args.as_slice() {
                    [Form::Int(n)] => {
                        spec.size = Some(*n as u32);
                        Ok(())
                    }
                    _ => Err(TranslateError::shape(
                        "bitstring",
                        "size expects an integer",
                        call.meta.span,
                    )),
                },
                "unit" => match call.args.as_slice() {
                    [Form::Int(n)] => {
                        spec.unit = Some(*n as u32);
                        Ok(())
                    }
                    _ => Err(TranslateError::shape(
                        "bitstring",
                        "unit expects an integer",
                        call.meta.span,
                    )),
                },
                other => Err(TranslateError::shape(
                    "bitstring",
                    format!("unknown segment option `{}`", other),
                    call.meta.span,
                )),
            },
            basalt_syntax::Callee::Remote(_) => Err(TranslateError::shape(
                "bitstring",
                "unknown segment option",
                call.meta.span,
            )),
        },
        _ => Err(TranslateError::shape(
            "bitstring",
            "malformed segment options",
            form.span(),
        )),
    }
}

/// The literal term denoted by a form, when it is one.
pub fn literal_term(form: &Form) -> Option<Term> {
    match form {
        Form::Int(i) => Some(Term::Int(*i)),
        Form::Float(x) => Some(Term::Float(*x)),
        Form::Str(s) => Some(Term::Str(s.clone())),
        Form::Bool(b) => Some(Term::Bool(*b)),
        Form::Nil => Some(Term::Nil),
        Form::Atom(a) => Some(Term::Atom(a.clone())),
        _ => None,
    }
}
