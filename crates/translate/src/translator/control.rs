//! Control-form translators: `case`, `cond`, `try`, `receive`.

use crate::context::CompilationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::patterns::emit;
use crate::translator::{function, primitives, Translator};
use basalt_estree::builder::{array, call, literal_null};
use basalt_estree::Node;
use basalt_syntax::{Env, Form, Meta};

/// `case subject do clauses end`: an expression-position clause table
/// keyed on the scrutinee.
pub fn case_form(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [subject, branches] = args else {
        return Err(TranslateError::shape("case", "expected subject and clauses", meta.span));
    };
    let clauses_form = branches
        .keyword_get("do")
        .ok_or_else(|| TranslateError::shape("case", "missing do block", meta.span))?;
    let subject_node = Translator::translate(ctx, env, subject)?;
    let clauses = function::arrow_clause_table(ctx, env, clauses_form, "case")?;
    Ok(emit::make_case_node(subject_node, clauses))
}

/// `cond`: ordered `[test, thunk]` pairs; the runtime runs the first
/// body whose test is truthy.
pub fn cond_form(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [branches] = args else {
        return Err(TranslateError::shape("cond", "expected clauses", meta.span));
    };
    let clauses_form = branches
        .keyword_get("do")
        .ok_or_else(|| TranslateError::shape("cond", "missing do block", meta.span))?;
    let Form::List(clauses) = clauses_form else {
        return Err(TranslateError::shape("cond", "expected clause list", meta.span));
    };
    let mut pairs = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let arrow = clause
            .call_named("->")
            .ok_or_else(|| TranslateError::shape("cond", "expected `->`", clause.span()))?;
        let [tests, body] = arrow.args.as_slice() else {
            return Err(TranslateError::shape("cond", "malformed clause", arrow.meta.span));
        };
        let test = match tests {
            Form::List(items) if items.len() == 1 => &items[0],
            other => other,
        };
        pairs.push(array(vec![
            Translator::translate(ctx, env, test)?,
            Translator::thunk(ctx, env, &body.body_forms())?,
        ]));
    }
    Ok(call(primitives::special_forms("cond"), vec![array(pairs)]))
}

/// `try`: each section becomes a distinct handler — the body and
/// `after` as thunks, `rescue`/`catch`/`else` as clause tables.
pub fn try_form(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [sections] = args else {
        return Err(TranslateError::shape("try", "expected sections", meta.span));
    };
    let body = sections
        .keyword_get("do")
        .ok_or_else(|| TranslateError::shape("try", "missing do block", meta.span))?;
    let body_thunk = Translator::thunk(ctx, env, &body.body_forms())?;

    let mut handlers = Vec::with_capacity(4);
    for section in ["rescue", "catch", "else"] {
        handlers.push(match sections.keyword_get(section) {
            Some(form) => {
                let clauses = function::arrow_clause_table(ctx, env, form, "try")?;
                emit::defmatch_node(clauses)
            }
            None => literal_null(),
        });
    }
    handlers.push(match sections.keyword_get("after") {
        Some(form) => Translator::thunk(ctx, env, &form.body_forms())?,
        None => literal_null(),
    });

    let mut arguments = vec![body_thunk];
    arguments.extend(handlers);
    Ok(call(primitives::special_forms("try"), arguments))
}

/// `receive`: the runtime's mailbox waiter takes the clause table and
/// an optional timeout with its handler.
pub fn receive(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [sections] = args else {
        return Err(TranslateError::shape("receive", "expected sections", meta.span));
    };
    let clauses_form = sections
        .keyword_get("do")
        .ok_or_else(|| TranslateError::shape("receive", "missing do block", meta.span))?;
    let clauses = function::arrow_clause_table(ctx, env, clauses_form, "receive")?;
    let table = emit::defmatch_node(clauses);

    let (timeout, handler) = match sections.keyword_get("after") {
        Some(Form::List(after)) if after.len() == 1 => {
            let arrow = after[0]
                .call_named("->")
                .ok_or_else(|| TranslateError::shape("receive", "malformed after", meta.span))?;
            let [tests, body] = arrow.args.as_slice() else {
                return Err(TranslateError::shape("receive", "malformed after", arrow.meta.span));
            };
            let timeout = match tests {
                Form::List(items) if items.len() == 1 => &items[0],
                other => other,
            };
            (
                Translator::translate(ctx, env, timeout)?,
                Translator::thunk(ctx, env, &body.body_forms())?,
            )
        }
        Some(other) => {
            return Err(TranslateError::shape(
                "receive",
                format!("malformed after section {}", other),
                meta.span,
            ));
        }
        None => (literal_null(), literal_null()),
    };

    Ok(call(
        primitives::special_forms("receive"),
        vec![table, timeout, handler],
    ))
}
