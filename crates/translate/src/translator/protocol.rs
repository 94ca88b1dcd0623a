//! Protocol translation.
//!
//! `defprotocol` registers the spec; `defimpl` registers a translated
//! implementation under the protocol's type table. Emission produces
//! one program per protocol: a dispatch object mapping runtime type
//! tags to implementations, consulted per call with the first
//! argument's tag.

use crate::context::{CompilationContext, ProtocolRecord};
use crate::error::{TranslateError, TranslateResult};
use crate::translator::{function, primitives};
use basalt_estree::builder::{call, const_decl, export_named, identifier, literal_int, literal_null, literal_str, object, program, property};
use basalt_estree::Node;
use basalt_syntax::{Callee, Env, Form, Meta, ModulePath};
use phf::{phf_map, phf_set};

/// Standard-library protocols, emitted under the canonical `Core`
/// namespace prefix.
static STANDARD_PROTOCOLS: phf::Set<&'static str> = phf_set! {
    "Enumerable",
    "Collectable",
    "Inspect",
    "String.Chars",
    "List.Chars",
};

/// Builtin implementation targets to runtime type tags.
static TYPE_TAGS: phf::Map<&'static str, &'static str> = phf_map! {
    "Atom" => "atom",
    "BitString" => "bitstring",
    "Boolean" => "boolean",
    "Float" => "number",
    "Function" => "function",
    "Integer" => "number",
    "List" => "list",
    "Map" => "map",
    "PID" => "pid",
    "String" => "string",
    "Tuple" => "tuple",
    "Any" => "any",
};

pub fn defprotocol(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [target, branches] = args else {
        return Err(TranslateError::shape("defprotocol", "expected name and body", meta.span));
    };
    let segments = target
        .alias_segments()
        .ok_or_else(|| TranslateError::shape("defprotocol", "malformed name", meta.span))?;
    let fq = env.module().child(segments);
    let name = fq.name();

    let body = branches
        .keyword_get("do")
        .ok_or_else(|| TranslateError::shape("defprotocol", "missing do block", meta.span))?;
    let spec = spec_object(body)?;

    ctx.add_protocol(&name, emission_path(&name, &fq), Some(spec));
    Ok(primitives::atom_node(&name))
}

/// The spec is the protocol's shape: each declared function name with
/// its arity.
fn spec_object(body: &Form) -> TranslateResult<Node> {
    let mut properties = Vec::new();
    for form in body.body_forms() {
        let Form::Call(call) = form else { continue };
        let Callee::Name(tag) = &call.target else { continue };
        if tag != "def" {
            continue;
        }
        let Some(head) = call.args.first() else { continue };
        match head {
            Form::Call(head_call) => {
                if let Callee::Name(fun) = &head_call.target {
                    properties.push(property(
                        identifier(primitives::filter_identifier(fun)),
                        literal_int(head_call.args.len() as i64),
                    ));
                }
            }
            Form::Var(v) => {
                properties.push(property(
                    identifier(primitives::filter_identifier(&v.name)),
                    literal_int(0),
                ));
            }
            _ => {}
        }
    }
    Ok(object(properties))
}

pub fn defimpl(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [target, rest @ ..] = args else {
        return Err(TranslateError::shape("defimpl", "expected protocol name", meta.span));
    };
    let segments = target
        .alias_segments()
        .ok_or_else(|| TranslateError::shape("defimpl", "malformed protocol name", meta.span))?;
    let name = env.resolve_alias(&segments).name();

    let mut for_form = None;
    let mut body = None;
    for arg in rest {
        if let Some(pairs) = arg.as_keyword_list() {
            for (key, value) in pairs {
                match key {
                    "for" => for_form = Some(value),
                    "do" => body = Some(value),
                    _ => {}
                }
            }
        }
    }
    let body = body
        .ok_or_else(|| TranslateError::shape("defimpl", "missing do block", meta.span))?;
    let for_form = for_form
        .ok_or_else(|| TranslateError::shape("defimpl", "missing for: option", meta.span))?;

    let impl_node = impl_object(ctx, env, body)?;
    let types: Vec<&Form> = match for_form {
        Form::List(items) => items.iter().collect(),
        single => vec![single],
    };
    let fallback = ModulePath::from_segments(name.split('.'));
    for type_form in types {
        let key = type_key(env, type_form, meta)?;
        ctx.add_protocol_impl(
            &name,
            emission_path(&name, &fallback),
            &key,
            impl_node.clone(),
        );
    }
    Ok(primitives::atom_node(&name))
}

/// An implementation body: each function grouped into its clause
/// table, carried as one object.
fn impl_object(ctx: &mut CompilationContext, env: &Env, body: &Form) -> TranslateResult<Node> {
    let mut clauses = Vec::new();
    for form in body.body_forms() {
        let Form::Call(call) = form else { continue };
        let Callee::Name(tag) = &call.target else { continue };
        match tag.as_str() {
            "def" => clauses.push(function::parse_def(env, call, true)?),
            "defp" => clauses.push(function::parse_def(env, call, false)?),
            _ => {}
        }
    }
    let groups = function::group(clauses);
    let mut properties = Vec::with_capacity(groups.len());
    for (name, group) in &groups {
        let table = match function::emit_group(ctx, name, group)? {
            Node::VariableDeclaration { declarations, .. } => declarations
                .into_iter()
                .next()
                .and_then(|declarator| match declarator {
                    Node::VariableDeclarator { init, .. } => init.map(|init| *init),
                    _ => None,
                }),
            _ => None,
        };
        let Some(table) = table else {
            continue;
        };
        properties.push(property(
            identifier(primitives::filter_identifier(name)),
            table,
        ));
    }
    Ok(object(properties))
}

/// The runtime type key for a `for:` target: a builtin type name maps
/// to its tag, anything else is a struct tag.
fn type_key(env: &Env, form: &Form, meta: Meta) -> TranslateResult<String> {
    let segments = form
        .alias_segments()
        .ok_or_else(|| TranslateError::shape("defimpl", "malformed for: option", meta.span))?;
    if let [single] = segments.as_slice() {
        if let Some(tag) = TYPE_TAGS.get(single.as_str()) {
            return Ok((*tag).to_string());
        }
    }
    Ok(env.resolve_alias(&segments).name())
}

fn emission_path(name: &str, fq: &ModulePath) -> ModulePath {
    if STANDARD_PROTOCOLS.contains(name) {
        ModulePath::from_segments(["Core"]).child(fq.segments().iter().cloned())
    } else {
        fq.clone()
    }
}

/// The dispatch program for one protocol, emitted after the whole
/// compilation so every implementation is present.
pub fn emit_program(record: &ProtocolRecord) -> Node {
    let impls = object(
        record
            .impls
            .iter()
            .map(|(key, node)| property(literal_str(key.clone()), node.clone()))
            .collect(),
    );
    let spec = record.spec.clone().unwrap_or_else(literal_null);
    let local = if record.path.is_empty() {
        "Protocol".to_string()
    } else {
        record.path.last().to_string()
    };
    program(vec![
        const_decl(identifier("__MODULE__"), primitives::atom_node(&record.name)),
        const_decl(
            identifier(local.clone()),
            call(primitives::special_forms("defprotocol"), vec![spec, impls]),
        ),
        export_named(vec![local]),
    ])
}
