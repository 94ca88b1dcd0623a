//! `for` comprehension lowering.
//!
//! A comprehension is handed to the runtime as a fold over the
//! generator product: each generator carries a pattern and its
//! collection, filters become predicates over the accumulated
//! bindings, and the body produces one element per surviving
//! combination. An `into:` target, when present, is the fold's
//! initial collectable.

use crate::context::CompilationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::patterns::{self, emit};
use crate::translator::{primitives, Translator};
use basalt_estree::builder::{array, arrow, call, identifier, literal_null};
use basalt_estree::Node;
use basalt_syntax::{Env, Form, Meta};

pub fn translate(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let Some((options, generators_and_filters)) = args.split_last() else {
        return Err(TranslateError::shape("for", "empty comprehension", meta.span));
    };
    let body = options
        .keyword_get("do")
        .ok_or_else(|| TranslateError::shape("for", "missing do block", meta.span))?;
    let into = options.keyword_get("into");

    let mut generator_nodes = Vec::new();
    let mut filter_nodes = Vec::new();
    let mut names: Vec<String> = Vec::new();

    for form in generators_and_filters {
        if let Some(generator) = form.call_named("<-") {
            let [pattern_form, collection] = generator.args.as_slice() else {
                return Err(TranslateError::shape(
                    "for",
                    "malformed generator",
                    generator.meta.span,
                ));
            };
            let pattern = patterns::lower(env, pattern_form)?;
            for name in pattern.bindings() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            generator_nodes.push(call(
                primitives::special_forms("generator"),
                vec![
                    emit::pattern_node(&pattern),
                    Translator::translate(ctx, env, collection)?,
                ],
            ));
        } else {
            // A filter sees every binding introduced so far.
            let params: Vec<Node> = names.iter().map(identifier).collect();
            filter_nodes.push(arrow(params, Translator::translate(ctx, env, form)?));
        }
    }

    if generator_nodes.is_empty() {
        return Err(TranslateError::shape("for", "expected a generator", meta.span));
    }

    let params: Vec<Node> = names.iter().map(identifier).collect();
    let body_node = Translator::arrow_over(ctx, env, params, &body.body_forms())?;
    let into_node = match into {
        Some(form) => Translator::translate(ctx, env, form)?,
        None => literal_null(),
    };

    Ok(call(
        primitives::special_forms("for"),
        vec![
            array(generator_nodes),
            array(filter_nodes),
            body_node,
            into_node,
        ],
    ))
}
