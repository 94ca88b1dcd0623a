//! Module translation.
//!
//! `defmodule` computes the fully-qualified path, registers the module,
//! walks the body in source order, and emits: import declarations, the
//! `__MODULE__` constant, the struct factory when `defstruct` was
//! present, top-level expressions, one clause table per grouped
//! function, and the export declaration listing the public names.
//! Inner modules are extracted and completed as siblings first; the
//! target has no nested module concept, but their paths stay fully
//! qualified.

use crate::context::CompilationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::translator::{expr, function, primitives, protocol, Translator};
use crate::translator::function::FunctionClause;
use basalt_estree::builder::{array, arrow, call, const_decl, export_named, identifier, import_default, program};
use basalt_estree::Node;
use basalt_syntax::{Callee, Env, Form, FunRef, ImportDirective, ImportFilter, ImportOpts, Meta, ModulePath};
use text_size::TextRange;

/// Translate `defmodule Name do body end`. The finished program is
/// installed in the context; the expression value is the module's
/// atom.
pub fn translate(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [target, branches] = args else {
        return Err(TranslateError::shape("defmodule", "expected name and body", meta.span));
    };
    let segments = target
        .alias_segments()
        .ok_or_else(|| TranslateError::shape("defmodule", "malformed module name", meta.span))?;
    let fq = env.module().child(segments);
    ctx.add_module(fq.clone())?;

    let body = branches
        .keyword_get("do")
        .ok_or_else(|| TranslateError::shape("defmodule", "missing do block", meta.span))?;

    let saved_imports = ctx.take_auto_imports();
    let mut mod_env = env.with_module(fq.clone());
    let mut import_nodes: Vec<Node> = Vec::new();
    let mut body_nodes: Vec<Node> = Vec::new();
    let mut clauses: Vec<FunctionClause> = Vec::new();
    let mut struct_fields: Option<Vec<(String, Form)>> = None;

    for form in body.body_forms() {
        let Form::Call(call_form) = form else {
            body_nodes.extend(Translator::statements(ctx, &mod_env, &[form])?);
            continue;
        };
        let Callee::Name(tag) = &call_form.target else {
            body_nodes.extend(Translator::statements(ctx, &mod_env, &[form])?);
            continue;
        };
        match tag.as_str() {
            "defmodule" => {
                Translator::translate(ctx, &mod_env, form)?;
                if let Some(inner) = call_form.args.first().and_then(|f| f.alias_segments()) {
                    let inner_fq = fq.child(inner);
                    let local = inner_fq.last().to_string();
                    mod_env = mod_env.with_alias(local.clone(), inner_fq.clone());
                    ctx.add_alias(&fq, &local, inner_fq.clone());
                    import_nodes.push(import_default(local, inner_fq.file_path()));
                }
            }
            "alias" | "import" | "require" => {
                let (nodes, env) = directive(ctx, &mod_env, tag, &call_form.args, call_form.meta)?;
                import_nodes.extend(nodes);
                mod_env = env;
            }
            "def" => clauses.push(function::parse_def(&mod_env, call_form, true)?),
            "defp" => clauses.push(function::parse_def(&mod_env, call_form, false)?),
            "defmacro" | "defmacrop" => {
                // Macro semantics live in the expansion collaborator;
                // only the (name, arity) registration is kept, feeding
                // `only: :macros` import filtering.
                let parsed = function::parse_def(&mod_env, call_form, tag == "defmacro")?;
                ctx.add_macro(&fq, parsed.name, parsed.arity);
            }
            "defstruct" => {
                struct_fields = Some(parse_struct_fields(
                    &call_form.args,
                    call_form.meta.span,
                    false,
                )?);
            }
            "defexception" => {
                struct_fields = Some(parse_struct_fields(
                    &call_form.args,
                    call_form.meta.span,
                    true,
                )?);
            }
            "defprotocol" => {
                protocol::defprotocol(ctx, &mod_env, &call_form.args, call_form.meta)?;
            }
            "defimpl" => {
                protocol::defimpl(ctx, &mod_env, &call_form.args, call_form.meta)?;
            }
            "@" if is_attribute_definition(&call_form.args) => {
                body_nodes.push(expr::attribute_declaration(
                    ctx,
                    &mod_env,
                    &call_form.args,
                    call_form.meta,
                )?);
            }
            _ => {
                body_nodes.extend(Translator::statements(ctx, &mod_env, &[form])?);
            }
        }
    }

    for clause in &clauses {
        ctx.add_function(&fq, clause.name.clone(), clause.arity, clause.public);
    }
    let groups = function::group(clauses);

    let mut exports: Vec<String> = Vec::new();
    let mut function_nodes = Vec::with_capacity(groups.len());
    for (name, group) in &groups {
        function_nodes.push(function::emit_group(ctx, name, group)?);
        if group.iter().any(|clause| clause.public) {
            exports.push(primitives::filter_identifier(name));
        }
    }

    let factory = match struct_fields {
        Some(fields) => Some(struct_factory(ctx, &mod_env, &fq, &fields)?),
        None => None,
    };

    // Imports owed by qualified references the body made without an
    // explicit alias/import directive.
    for (local, canonical) in ctx.take_auto_imports() {
        import_nodes.push(import_default(local, canonical.file_path()));
    }
    ctx.restore_auto_imports(saved_imports);

    let mut body = import_nodes;
    body.push(const_decl(
        identifier("__MODULE__"),
        primitives::atom_node(&fq.name()),
    ));
    if let Some(factory) = factory {
        body.push(factory);
        exports.insert(0, "defstruct".to_string());
    }
    body.extend(body_nodes);
    body.extend(function_nodes);
    body.push(export_named(exports));

    ctx.set_module_program(&fq, program(body));
    Ok(primitives::atom_node(&fq.name()))
}

fn is_attribute_definition(args: &[Form]) -> bool {
    matches!(
        args,
        [Form::Call(inner)] if matches!(&inner.target, Callee::Name(_)) && inner.args.len() == 1
    )
}

/// The auto-generated struct factory. Construction sites dispatch to
/// `Module.defstruct(values)`; defaults are merged by the runtime.
fn struct_factory(
    ctx: &mut CompilationContext,
    env: &Env,
    fq: &ModulePath,
    fields: &[(String, Form)],
) -> TranslateResult<Node> {
    let mut defaults = Vec::with_capacity(fields.len());
    for (name, default) in fields {
        defaults.push(array(vec![
            primitives::atom_node(name),
            Translator::translate(ctx, env, default)?,
        ]));
    }
    let defaults_map = call(primitives::special_forms("map"), vec![array(defaults)]);
    Ok(const_decl(
        identifier("defstruct"),
        arrow(
            vec![identifier("values")],
            call(
                primitives::special_forms("struct"),
                vec![
                    primitives::atom_node(&fq.name()),
                    defaults_map,
                    identifier("values"),
                ],
            ),
        ),
    ))
}

fn parse_struct_fields(
    args: &[Form],
    span: TextRange,
    exception: bool,
) -> TranslateResult<Vec<(String, Form)>> {
    let empty = Form::List(Vec::new());
    let fields_form = match args {
        [form] => form,
        [] if exception => &empty,
        _ => return Err(TranslateError::shape("defstruct", "expected a field list", span)),
    };
    let Form::List(items) = fields_form else {
        return Err(TranslateError::shape("defstruct", "expected a field list", span));
    };
    let mut fields = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Form::Pair(key, default) => match key.as_ref() {
                Form::Atom(name) => fields.push((name.clone(), default.as_ref().clone())),
                _ => return Err(TranslateError::shape("defstruct", "malformed field", span)),
            },
            Form::Atom(name) => fields.push((name.clone(), Form::Nil)),
            _ => return Err(TranslateError::shape("defstruct", "malformed field", span)),
        }
    }
    if exception && !fields.iter().any(|(name, _)| name == "message") {
        fields.push(("message".to_string(), Form::Nil));
    }
    Ok(fields)
}

/// `alias`, `import` and `require` directives: register with the
/// context, extend the environment, and emit the matching target
/// import declaration(s).
pub fn directive(
    ctx: &mut CompilationContext,
    env: &Env,
    name: &str,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<(Vec<Node>, Env)> {
    let [target, rest @ ..] = args else {
        return Err(TranslateError::shape("alias", "expected a module", meta.span));
    };
    let opts = rest.first();

    match name {
        "alias" | "require" => {
            // `alias A.{B, C}` expands to one binding per member.
            if let Some((base, members)) = multi_alias_members(target) {
                let mut nodes = Vec::new();
                let mut env = env.clone();
                for member in members {
                    let member_segments = member.alias_segments().ok_or_else(|| {
                        TranslateError::shape("alias", "malformed module name", meta.span)
                    })?;
                    let mut written = base.clone();
                    written.extend(member_segments);
                    let (node, extended) = bind_alias(ctx, &env, &written, None, meta)?;
                    nodes.push(node);
                    env = extended;
                }
                return Ok((nodes, env));
            }
            let written = target
                .alias_segments()
                .ok_or_else(|| TranslateError::shape("alias", "malformed module name", meta.span))?;
            let as_name = match opts.and_then(|o| o.keyword_get("as")) {
                Some(form) => Some(form.alias_segments().ok_or_else(|| {
                    TranslateError::shape("alias", "malformed as: option", meta.span)
                })?),
                None => None,
            };
            let local = as_name.as_ref().and_then(|segs| segs.last().cloned());
            let (node, env) = bind_alias(ctx, env, &written, local, meta)?;
            Ok((vec![node], env))
        }
        "import" => {
            let written = target
                .alias_segments()
                .ok_or_else(|| TranslateError::shape("import", "malformed module name", meta.span))?;
            let canonical = env.resolve_alias(&written);
            let opts = match opts {
                Some(form) => parse_import_opts(form, meta.span)?,
                None => ImportOpts::default(),
            };
            let directive = ImportDirective {
                module: canonical.clone(),
                opts,
            };
            ctx.add_import(env.module(), directive.clone());
            let env = env.with_import(directive);
            let node = import_default(canonical.last().to_string(), canonical.file_path());
            Ok((vec![node], env))
        }
        other => Err(TranslateError::shape(
            "alias",
            format!("unknown directive `{}`", other),
            meta.span,
        )),
    }
}

fn bind_alias(
    ctx: &mut CompilationContext,
    env: &Env,
    written: &[String],
    local: Option<String>,
    meta: Meta,
) -> TranslateResult<(Node, Env)> {
    let canonical = env.resolve_alias(written);
    let local = match local.or_else(|| written.last().cloned()) {
        Some(local) => local,
        None => {
            return Err(TranslateError::shape("alias", "empty module path", meta.span));
        }
    };
    ctx.add_alias(env.module(), &local, canonical.clone());
    let node = import_default(local.clone(), canonical.file_path());
    Ok((node, env.with_alias(local, canonical)))
}

/// `A.{B, C}` arrives as a dotted call on `{}`; returns the base
/// segments and the member forms.
fn multi_alias_members(target: &Form) -> Option<(Vec<String>, &[Form])> {
    let Form::Call(call) = target else {
        return None;
    };
    let Callee::Remote(dot_form) = &call.target else {
        return None;
    };
    let dot = dot_form.call_named(".")?;
    let [base, Form::Atom(curly)] = dot.args.as_slice() else {
        return None;
    };
    if curly != "{}" {
        return None;
    }
    Some((base.alias_segments()?, call.args.as_slice()))
}

fn parse_import_opts(form: &Form, span: TextRange) -> TranslateResult<ImportOpts> {
    let mut opts = ImportOpts::default();
    let Some(pairs) = form.as_keyword_list() else {
        return Err(TranslateError::shape("import", "malformed options", span));
    };
    for (key, value) in pairs {
        match key {
            "only" => {
                opts.only = Some(match value {
                    Form::Atom(kind) if kind == "functions" => ImportFilter::Functions,
                    Form::Atom(kind) if kind == "macros" => ImportFilter::Macros,
                    list => ImportFilter::Names(parse_fun_refs(list, span)?),
                });
            }
            "except" => opts.except = parse_fun_refs(value, span)?,
            _ => {}
        }
    }
    Ok(opts)
}

fn parse_fun_refs(form: &Form, span: TextRange) -> TranslateResult<Vec<FunRef>> {
    let Some(pairs) = form.as_keyword_list() else {
        return Err(TranslateError::shape("import", "expected name: arity pairs", span));
    };
    let mut refs = Vec::with_capacity(pairs.len());
    for (name, arity) in pairs {
        let Form::Int(arity) = arity else {
            return Err(TranslateError::shape("import", "expected name: arity pairs", span));
        };
        refs.push((name.to_string(), *arity as usize));
    }
    Ok(refs)
}
