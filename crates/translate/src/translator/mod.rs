//! The translator dispatcher.
//!
//! [`Translator::translate`] discriminates the shape of a source form
//! and routes it to the matching sub-translator. Dispatch order
//! follows the shape rules of the source language: primitive values,
//! atoms, sequences, tuples, bare identifiers, then tagged forms, with
//! a generic-call fallthrough that consults the Kernel builtin table
//! and the macro expander before settling on a local or imported call.

pub mod capture;
pub mod comprehension;
pub mod control;
pub mod expr;
pub mod function;
pub mod kernel;
pub mod module;
pub mod primitives;
pub mod protocol;
pub mod quote;

use crate::context::CompilationContext;
use crate::error::{TranslateError, TranslateResult};
use basalt_estree::builder::{arrow, arrow_block, call as call_node, expr_stmt, identifier, literal_null, member, ret};
use basalt_estree::Node;
use basalt_syntax::{Call, Callee, Env, Form, ImportFilter};

pub struct Translator;

impl Translator {
    /// Translate one form in expression position.
    pub fn translate(
        ctx: &mut CompilationContext,
        env: &Env,
        form: &Form,
    ) -> TranslateResult<Node> {
        match form {
            Form::Int(_) | Form::Float(_) | Form::Str(_) | Form::Bool(_) | Form::Nil => {
                Ok(primitives::literal(form))
            }
            Form::Atom(name) => Ok(primitives::atom_node(name)),
            Form::List(items) => Self::translate_list(ctx, env, items),
            Form::Pair(a, b) => Ok(primitives::tuple_node(vec![
                Self::translate(ctx, env, a)?,
                Self::translate(ctx, env, b)?,
            ])),
            Form::Var(v) => match v.name.as_str() {
                "__CALLER__" | "__ENV__" => {
                    Err(TranslateError::unsupported(&v.name, v.meta.span))
                }
                "__MODULE__" => Ok(identifier("__MODULE__")),
                "__DIR__" => Ok(identifier("__dirname")),
                name => Ok(primitives::identifier_node(name)),
            },
            Form::Call(call) => Self::translate_call(ctx, env, call),
        }
    }

    fn translate_call(
        ctx: &mut CompilationContext,
        env: &Env,
        call: &Call,
    ) -> TranslateResult<Node> {
        match &call.target {
            Callee::Remote(target) => expr::dotted_call(ctx, env, target, &call.args, call.meta),
            Callee::Name(name) => match name.as_str() {
                "&" => capture::translate(ctx, env, &call.args, call.meta),
                "@" => expr::attribute_read(&call.args, call.meta),
                "%" => expr::struct_literal(ctx, env, &call.args, call.meta),
                "%{}" => expr::map(ctx, env, &call.args, call.meta),
                "<<>>" => expr::bitstring(ctx, env, &call.args, call.meta),
                "__aliases__" => expr::module_reference(ctx, env, &call.args, call.meta),
                "__block__" => expr::block(ctx, env, &call.args),
                "__DIR__" => Ok(identifier("__dirname")),
                "try" => control::try_form(ctx, env, &call.args, call.meta),
                "receive" => control::receive(ctx, env, &call.args, call.meta),
                "quote" => quote::translate(ctx, env, &call.args, call.meta),
                "unquote" => Err(TranslateError::shape(
                    "unquote",
                    "unquote outside of quote",
                    call.meta.span,
                )),
                "alias" | "import" | "require" => {
                    let (nodes, _env) = module::directive(ctx, env, name, &call.args, call.meta)?;
                    // In expression position only the first declaration
                    // is meaningful; multi-alias forms appear at module
                    // scope where the walker keeps every declaration.
                    Ok(nodes.into_iter().next().unwrap_or_else(literal_null))
                }
                "case" => control::case_form(ctx, env, &call.args, call.meta),
                "cond" => control::cond_form(ctx, env, &call.args, call.meta),
                "for" => comprehension::translate(ctx, env, &call.args, call.meta),
                "fn" => function::anonymous(ctx, env, &call.args, call.meta),
                "{}" => {
                    let elements = Self::translate_args(ctx, env, &call.args)?;
                    Ok(primitives::tuple_node(elements))
                }
                "=" => expr::assignment_expression(ctx, env, &call.args, call.meta),
                "|" => expr::cons(ctx, env, &call.args, call.meta),
                "|>" => kernel::pipe(ctx, env, &call.args, call.meta),
                "def" | "defp" | "defmacro" | "defmacrop" | "defstruct" | "defexception" => {
                    Err(TranslateError::shape(
                        "definition",
                        format!("`{}` outside of a module body", name),
                        call.meta.span,
                    ))
                }
                "defmodule" => module::translate(ctx, env, &call.args, call.meta),
                "defprotocol" => protocol::defprotocol(ctx, env, &call.args, call.meta),
                "defimpl" => protocol::defimpl(ctx, env, &call.args, call.meta),
                "super" | "__CALLER__" | "__ENV__" => {
                    Err(TranslateError::unsupported(name, call.meta.span))
                }
                _ => Self::generic_call(ctx, env, name, call),
            },
        }
    }

    /// Rule 7: Kernel builtins first, then the expansion fixed point,
    /// then import requalification, finally a local call.
    fn generic_call(
        ctx: &mut CompilationContext,
        env: &Env,
        name: &str,
        call: &Call,
    ) -> TranslateResult<Node> {
        let arity = call.args.len();
        if kernel::is_builtin(name, arity) {
            return kernel::lower(ctx, env, name, &call.args, call.meta);
        }

        let original = Form::Call(call.clone());
        let expanded = ctx.expand(&original, env)?;
        if expanded != original {
            return Self::translate(ctx, env, &expanded);
        }

        let arguments = Self::translate_args(ctx, env, &call.args)?;
        let callee_name = primitives::filter_identifier(name);
        match Self::resolve_import(ctx, env, name, arity) {
            Some(local) => Ok(call_node(
                member(identifier(local), identifier(callee_name)),
                arguments,
            )),
            // An unresolved bare name is not an error: it stays a local
            // identifier and the target runtime binds it at load time.
            None => Ok(call_node(identifier(callee_name), arguments)),
        }
    }

    /// The local binding through which an imported function is
    /// reachable, when some in-scope directive admits `name/arity`.
    fn resolve_import(
        ctx: &CompilationContext,
        env: &Env,
        name: &str,
        arity: usize,
    ) -> Option<String> {
        for directive in env.imports().iter().rev() {
            match &directive.opts.only {
                Some(ImportFilter::Names(names)) => {
                    if names.iter().any(|(n, a)| n == name && *a == arity) {
                        return Some(directive.module.last().to_string());
                    }
                }
                only => {
                    let Some(target) = ctx.get_module(&directive.module) else {
                        continue;
                    };
                    if !directive.opts.admits(name, arity) {
                        continue;
                    }
                    let key = (name.to_string(), arity);
                    let found = match only {
                        Some(ImportFilter::Functions) => target.functions.contains(&key),
                        Some(ImportFilter::Macros) => target.macros.contains(&key),
                        _ => target.functions.contains(&key) || target.macros.contains(&key),
                    };
                    if found {
                        return Some(directive.module.last().to_string());
                    }
                }
            }
        }
        None
    }

    pub fn translate_args(
        ctx: &mut CompilationContext,
        env: &Env,
        args: &[Form],
    ) -> TranslateResult<Vec<Node>> {
        args.iter()
            .map(|arg| Self::translate(ctx, env, arg))
            .collect()
    }

    fn translate_list(
        ctx: &mut CompilationContext,
        env: &Env,
        items: &[Form],
    ) -> TranslateResult<Node> {
        if let Some((last, heads)) = items.split_last() {
            if let Some(cons) = last.call_named("|") {
                let mut elements = Self::translate_args(ctx, env, heads)?;
                let [cons_head, cons_tail] = cons.args.as_slice() else {
                    return Err(TranslateError::shape("list", "malformed cons", cons.meta.span));
                };
                elements.push(Self::translate(ctx, env, cons_head)?);
                let tail = Self::translate(ctx, env, cons_tail)?;
                return Ok(call_node(
                    primitives::special_forms("list_prepend"),
                    vec![primitives::list_node(elements), tail],
                ));
            }
        }
        let elements = Self::translate_args(ctx, env, items)?;
        Ok(primitives::list_node(elements))
    }

    /// Translate a statement sequence. Assignments become match
    /// declarations; scope directives update the local environment
    /// without emitting (imports are module-level declarations in the
    /// target).
    pub fn statements(
        ctx: &mut CompilationContext,
        env: &Env,
        forms: &[&Form],
    ) -> TranslateResult<Vec<Node>> {
        let mut scope = env.clone();
        let mut nodes = Vec::new();
        for form in forms {
            Self::push_statement(ctx, &mut scope, form, &mut nodes)?;
        }
        Ok(nodes)
    }

    /// A statement sequence whose final expression is returned.
    pub fn statements_with_return(
        ctx: &mut CompilationContext,
        env: &Env,
        forms: &[&Form],
    ) -> TranslateResult<Vec<Node>> {
        let mut scope = env.clone();
        let mut nodes = Vec::new();
        let Some((last, init)) = forms.split_last() else {
            return Ok(vec![ret(literal_null())]);
        };
        for form in init {
            Self::push_statement(ctx, &mut scope, form, &mut nodes)?;
        }
        match last {
            Form::Call(call) if matches!(&call.target, Callee::Name(n) if n == "=") => {
                let (stmts, value) =
                    expr::assignment_statements(ctx, &scope, &call.args, call.meta, true)?;
                nodes.extend(stmts);
                nodes.push(ret(value.unwrap_or_else(literal_null)));
            }
            Form::Call(call) if matches!(&call.target, Callee::Name(n) if n == "__block__") => {
                let inner: Vec<&Form> = call.args.iter().collect();
                nodes.extend(Self::statements_with_return(ctx, &scope, &inner)?);
            }
            form => {
                nodes.push(ret(Self::translate(ctx, &scope, form)?));
            }
        }
        Ok(nodes)
    }

    fn push_statement(
        ctx: &mut CompilationContext,
        scope: &mut Env,
        form: &Form,
        nodes: &mut Vec<Node>,
    ) -> TranslateResult<()> {
        match form {
            Form::Call(call) => match &call.target {
                Callee::Name(n) if n == "=" => {
                    let (stmts, _) =
                        expr::assignment_statements(ctx, scope, &call.args, call.meta, false)?;
                    nodes.extend(stmts);
                }
                Callee::Name(n) if n == "__block__" => {
                    for inner in &call.args {
                        Self::push_statement(ctx, scope, inner, nodes)?;
                    }
                }
                Callee::Name(n) if matches!(n.as_str(), "alias" | "import" | "require") => {
                    let (_, env) = module::directive(ctx, scope, n, &call.args, call.meta)?;
                    *scope = env;
                }
                _ => nodes.push(expr_stmt(Self::translate(ctx, scope, form)?)),
            },
            _ => nodes.push(expr_stmt(Self::translate(ctx, scope, form)?)),
        }
        Ok(())
    }

    /// A zero-parameter thunk over a body.
    pub fn thunk(
        ctx: &mut CompilationContext,
        env: &Env,
        forms: &[&Form],
    ) -> TranslateResult<Node> {
        Self::arrow_over(ctx, env, Vec::new(), forms)
    }

    /// An arrow with the given parameters over a body; single plain
    /// expressions stay expression-bodied.
    pub fn arrow_over(
        ctx: &mut CompilationContext,
        env: &Env,
        params: Vec<Node>,
        forms: &[&Form],
    ) -> TranslateResult<Node> {
        if let [form] = forms {
            let simple = !matches!(
                form,
                Form::Call(call) if matches!(
                    &call.target,
                    Callee::Name(n) if n == "=" || n == "__block__"
                )
            );
            if simple {
                return Ok(arrow(params, Self::translate(ctx, env, form)?));
            }
        }
        Ok(arrow_block(
            params,
            Self::statements_with_return(ctx, env, forms)?,
        ))
    }
}
