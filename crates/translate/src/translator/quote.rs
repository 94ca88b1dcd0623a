//! `quote` reification.
//!
//! Quoting rebuilds the source tree as runtime data: tagged forms and
//! variables become `{tag, meta, children}` tuples, lists and
//! literals quote to themselves. An `unquote` escape re-enters
//! ordinary translation with quoting switched off.

use crate::context::CompilationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::translator::{primitives, Translator};
use basalt_estree::builder::{array, literal_null};
use basalt_estree::Node;
use basalt_syntax::{Callee, Env, Form, Meta};

/// `quote do body end` (options, when present, are accepted and
/// ignored; hygiene is the expander's concern).
pub fn translate(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let branches = args
        .last()
        .ok_or_else(|| TranslateError::shape("quote", "missing do block", meta.span))?;
    let body = branches
        .keyword_get("do")
        .ok_or_else(|| TranslateError::shape("quote", "missing do block", meta.span))?;
    let quoting = env.with_quote(true);
    quote_form(ctx, &quoting, body)
}

fn quote_form(ctx: &mut CompilationContext, env: &Env, form: &Form) -> TranslateResult<Node> {
    match form {
        Form::Int(_) | Form::Float(_) | Form::Str(_) | Form::Bool(_) | Form::Nil => {
            Ok(primitives::literal(form))
        }
        Form::Atom(name) => Ok(primitives::atom_node(name)),
        Form::List(items) => {
            let quoted = items
                .iter()
                .map(|item| quote_form(ctx, env, item))
                .collect::<TranslateResult<Vec<_>>>()?;
            Ok(array(quoted))
        }
        Form::Pair(a, b) => Ok(primitives::tuple_node(vec![
            quote_form(ctx, env, a)?,
            quote_form(ctx, env, b)?,
        ])),
        Form::Var(v) => Ok(primitives::tuple_node(vec![
            primitives::atom_node(&v.name),
            array(Vec::new()),
            literal_null(),
        ])),
        Form::Call(call) => match &call.target {
            Callee::Name(name) if name == "unquote" => {
                let [escaped] = call.args.as_slice() else {
                    return Err(TranslateError::shape(
                        "unquote",
                        "expected one argument",
                        call.meta.span,
                    ));
                };
                Translator::translate(ctx, &env.with_quote(false), escaped)
            }
            Callee::Name(name) => {
                let children = call
                    .args
                    .iter()
                    .map(|arg| quote_form(ctx, env, arg))
                    .collect::<TranslateResult<Vec<_>>>()?;
                Ok(primitives::tuple_node(vec![
                    primitives::atom_node(name),
                    array(Vec::new()),
                    array(children),
                ]))
            }
            Callee::Remote(target) => {
                let children = call
                    .args
                    .iter()
                    .map(|arg| quote_form(ctx, env, arg))
                    .collect::<TranslateResult<Vec<_>>>()?;
                Ok(primitives::tuple_node(vec![
                    quote_form(ctx, env, target)?,
                    array(Vec::new()),
                    array(children),
                ]))
            }
        },
    }
}
