//! Expression translators: maps, structs, bitstrings, assignment,
//! blocks, module references, attributes and dotted calls.

use crate::context::CompilationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::patterns::{self, emit};
use crate::translator::{primitives, Translator};
use basalt_estree::builder::{array, array_pattern, binary, call, const_decl, expr_stmt, identifier, member, member_computed};
use basalt_estree::Node;
use basalt_syntax::{Callee, Env, Form, Meta};

/// The local binding through which a written module reference is
/// reachable. An explicit alias (or inner-module extraction) already
/// bound the single written name; an import directive bound the
/// module's last segment. Anything else resolves through the active
/// aliases to its canonical path and synthesizes a deterministic
/// local whose import declaration is collected into the enclosing
/// program, so a qualified reference never emits an unbound
/// identifier.
pub fn module_binding(ctx: &mut CompilationContext, env: &Env, written: &[String]) -> String {
    let canonical = env.resolve_alias(written);
    if let [single] = written {
        if env.aliases().iter().any(|(local, _)| local == single) {
            return single.clone();
        }
    }
    if env
        .imports()
        .iter()
        .any(|directive| directive.module == canonical)
    {
        return canonical.last().to_string();
    }
    ctx.auto_import(canonical)
}

/// Map construction `%{k: v}` and functional update `%{m | k: v}`.
/// The update form never aliases its input; the runtime copies.
pub fn map(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    if let [arg] = args {
        if let Some(update) = arg.call_named("|") {
            let [base, updates] = update.args.as_slice() else {
                return Err(TranslateError::shape("map", "malformed update", meta.span));
            };
            let entries = match updates {
                Form::List(items) => entry_nodes(ctx, env, items, meta)?,
                _ => return Err(TranslateError::shape("map", "malformed update", meta.span)),
            };
            return Ok(call(
                primitives::special_forms("map_update"),
                vec![Translator::translate(ctx, env, base)?, array(entries)],
            ));
        }
    }
    let entries = entry_nodes(ctx, env, args, meta)?;
    Ok(call(primitives::special_forms("map"), vec![array(entries)]))
}

fn entry_nodes(
    ctx: &mut CompilationContext,
    env: &Env,
    items: &[Form],
    meta: Meta,
) -> TranslateResult<Vec<Node>> {
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let Form::Pair(key, value) = item else {
            return Err(TranslateError::shape("map", "malformed entry", meta.span));
        };
        entries.push(array(vec![
            Translator::translate(ctx, env, key)?,
            Translator::translate(ctx, env, value)?,
        ]));
    }
    Ok(entries)
}

/// Struct construction `%M{fields}` dispatches to the module's
/// auto-generated `defstruct` factory.
pub fn struct_literal(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [target, fields] = args else {
        return Err(TranslateError::shape("struct", "malformed struct", meta.span));
    };
    let segments = target
        .alias_segments()
        .ok_or_else(|| TranslateError::shape("struct", "malformed struct name", meta.span))?;
    let fields_call = fields
        .call_named("%{}")
        .ok_or_else(|| TranslateError::shape("struct", "malformed struct body", meta.span))?;
    let fields_node = map(ctx, env, &fields_call.args, meta)?;
    let local = module_binding(ctx, env, &segments);
    Ok(call(
        member(identifier(local), identifier("defstruct")),
        vec![fields_node],
    ))
}

/// `<<…>>` is an interpolated string when every element is a plain
/// binary literal or a `::binary` segment; otherwise a bitstring
/// constructor call carrying segment metadata.
pub fn bitstring(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let mut parsed = Vec::with_capacity(args.len());
    let mut interpolated = !args.is_empty();
    for arg in args {
        let (value, spec) = patterns::segment_parts(arg)?;
        if !matches!(value, Form::Str(_)) && spec.kind != patterns::SegmentKind::Binary {
            interpolated = false;
        }
        parsed.push((value, spec));
    }

    if interpolated {
        let mut result: Option<Node> = None;
        for (value, _) in parsed {
            let part = match value {
                Form::Str(s) => basalt_estree::builder::literal_str(s.clone()),
                other => call(
                    primitives::kernel_ns("to_string"),
                    vec![Translator::translate(ctx, env, other)?],
                ),
            };
            result = Some(match result {
                Some(acc) => binary("+", acc, part),
                None => part,
            });
        }
        return result.ok_or_else(|| {
            TranslateError::shape("bitstring", "empty interpolation", meta.span)
        });
    }

    let mut segments = Vec::with_capacity(parsed.len());
    for (value, spec) in parsed {
        let value_node = Translator::translate(ctx, env, value)?;
        segments.push(emit::segment_object(value_node, &spec));
    }
    Ok(call(primitives::special_forms("bitstring"), segments))
}

/// A module reference in value position resolves to the local binding
/// its import introduced, synthesizing the import when none exists.
pub fn module_reference(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let mut segments = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Form::Atom(name) => segments.push(name.clone()),
            Form::Var(v) => segments.push(v.name.clone()),
            _ => return Err(TranslateError::shape("__aliases__", "malformed segment", meta.span)),
        }
    }
    if segments.is_empty() {
        return Err(TranslateError::shape("__aliases__", "empty module path", meta.span));
    }
    Ok(identifier(module_binding(ctx, env, &segments)))
}

/// `__block__` in expression position: an immediately-invoked arrow
/// whose last expression is the value.
pub fn block(ctx: &mut CompilationContext, env: &Env, args: &[Form]) -> TranslateResult<Node> {
    let forms: Vec<&Form> = args.iter().collect();
    let body = Translator::statements_with_return(ctx, env, &forms)?;
    Ok(call(basalt_estree::builder::arrow_block(Vec::new(), body), vec![]))
}

/// A bare cons `h | t`.
pub fn cons(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [head, tail] = args else {
        return Err(TranslateError::shape("cons", "expected head and tail", meta.span));
    };
    Ok(call(
        primitives::special_forms("list_prepend"),
        vec![
            array(vec![Translator::translate(ctx, env, head)?]),
            Translator::translate(ctx, env, tail)?,
        ],
    ))
}

/// Assignment `left = right`: the right side is lowered first, the
/// left side becomes a pattern, and matching binds slots. Returns the
/// emitted statements and, when requested, the expression the whole
/// assignment evaluates to.
pub fn assignment_statements(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
    want_value: bool,
) -> TranslateResult<(Vec<Node>, Option<Node>)> {
    let [left, right] = args else {
        return Err(TranslateError::shape("match", "expected two operands", meta.span));
    };
    let pattern = patterns::lower(env, left)?;
    let rhs = Translator::translate(ctx, env, right)?;

    let mut statements = Vec::new();
    let (value, target) = if want_value {
        let name = ctx.fresh_value_name();
        statements.push(const_decl(identifier(name.clone()), rhs));
        (Some(identifier(name.clone())), identifier(name))
    } else {
        (None, rhs)
    };

    let match_call = call(
        primitives::patterns_ns("match"),
        vec![emit::pattern_node(&pattern), target],
    );
    let bindings = pattern.bindings();
    if bindings.is_empty() {
        statements.push(expr_stmt(match_call));
    } else {
        statements.push(const_decl(
            array_pattern(bindings.into_iter().map(identifier).collect()),
            match_call,
        ));
    }
    Ok((statements, value))
}

/// Assignment in expression position wraps in an immediately-invoked
/// arrow that returns the matched value.
pub fn assignment_expression(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let (mut statements, value) = assignment_statements(ctx, env, args, meta, true)?;
    statements.push(basalt_estree::builder::ret(
        value.unwrap_or_else(basalt_estree::builder::literal_null),
    ));
    Ok(call(
        basalt_estree::builder::arrow_block(Vec::new(), statements),
        vec![],
    ))
}

/// A module attribute read `@name`.
pub fn attribute_read(args: &[Form], meta: Meta) -> TranslateResult<Node> {
    match args {
        [Form::Var(v)] => Ok(primitives::identifier_node(&v.name)),
        _ => Err(TranslateError::shape(
            "attribute",
            "attribute definitions are module-level",
            meta.span,
        )),
    }
}

/// A module attribute definition `@name value`, emitted by the module
/// walker as a constant declaration.
pub fn attribute_declaration(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [Form::Call(inner)] = args else {
        return Err(TranslateError::shape("attribute", "malformed definition", meta.span));
    };
    let Callee::Name(name) = &inner.target else {
        return Err(TranslateError::shape("attribute", "malformed definition", meta.span));
    };
    let [value] = inner.args.as_slice() else {
        return Err(TranslateError::shape("attribute", "malformed definition", meta.span));
    };
    Ok(const_decl(
        primitives::identifier_node(name),
        Translator::translate(ctx, env, value)?,
    ))
}

/// Dotted calls `(., _, [object, fun])(args)`: known runtime modules
/// first, then module-qualified calls, then the generic property
/// accessor.
pub fn dotted_call(
    ctx: &mut CompilationContext,
    env: &Env,
    target: &Form,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let Some(dot) = target.call_named(".") else {
        return Err(TranslateError::shape("call", "malformed dotted call", meta.span));
    };
    match dot.args.as_slice() {
        [object, Form::Atom(fun)] => {
            if let Some(segments) = object.alias_segments() {
                return module_call(ctx, env, &segments, fun, args);
            }
            let object_node = Translator::translate(ctx, env, object)?;
            if args.is_empty() {
                // The runtime decides property vs. nullary call.
                Ok(call(
                    primitives::special_forms("dot"),
                    vec![object_node, primitives::atom_node(fun)],
                ))
            } else {
                let arguments = Translator::translate_args(ctx, env, args)?;
                Ok(call(
                    member(object_node, primitives::identifier_node(fun)),
                    arguments,
                ))
            }
        }
        // `f.(args)`: calling an anonymous function value.
        [fun_expr] => {
            let callee = Translator::translate(ctx, env, fun_expr)?;
            let arguments = Translator::translate_args(ctx, env, args)?;
            Ok(call(callee, arguments))
        }
        _ => Err(TranslateError::shape("call", "malformed dotted call", meta.span)),
    }
}

fn module_call(
    ctx: &mut CompilationContext,
    env: &Env,
    segments: &[String],
    fun: &str,
    args: &[Form],
) -> TranslateResult<Node> {
    let arguments = Translator::translate_args(ctx, env, args)?;
    let written: Vec<&str> = segments.iter().map(String::as_str).collect();
    match written.as_slice() {
        ["Logger"] => {
            let level = match fun {
                "debug" | "info" | "error" => fun,
                "warn" | "warning" => "warn",
                _ => "log",
            };
            Ok(call(
                member(identifier("console"), identifier(level)),
                arguments,
            ))
        }
        ["Kernel"] => Ok(call(
            primitives::kernel_ns(&primitives::filter_identifier(fun)),
            arguments,
        )),
        // The raw escape hatch: `JS.f(args)` calls the global `f`.
        ["JS"] => Ok(call(identifier(primitives::filter_identifier(fun)), arguments)),
        ["Access"] if fun == "get" && arguments.len() == 2 => {
            let mut arguments = arguments;
            let key = arguments.pop().unwrap_or_else(basalt_estree::builder::literal_null);
            let container = arguments.pop().unwrap_or_else(basalt_estree::builder::literal_null);
            Ok(member_computed(container, key))
        }
        // With a default the lookup stays a runtime call.
        ["Access"] if fun == "get" && arguments.len() == 3 => Ok(call(
            primitives::special_forms("access"),
            arguments,
        )),
        _ => {
            let local = module_binding(ctx, env, segments);
            Ok(call(
                member(identifier(local), primitives::identifier_node(fun)),
                arguments,
            ))
        }
    }
}
