//! Function translation: `def`/`defp` clause grouping and the clause
//! machinery shared by anonymous functions, `case`, `try` and
//! `receive`.
//!
//! All clauses of one function name collapse into a single clause
//! table; the runtime dispatches on argument count and pattern,
//! top-to-bottom, first match wins.

use crate::context::CompilationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::patterns::{self, emit};
use crate::translator::{primitives, Translator};
use basalt_estree::builder::{arrow, const_decl, identifier};
use basalt_estree::Node;
use basalt_syntax::{Call, Callee, Env, Form, Meta};
use indexmap::IndexMap;

/// One parsed `def`/`defp` clause. The environment is captured at
/// parse time so aliases declared later in the module body do not
/// leak backwards into earlier clauses.
#[derive(Debug, Clone)]
pub struct FunctionClause {
    pub name: String,
    pub arity: usize,
    pub public: bool,
    pub params: Vec<Form>,
    pub guard: Option<Form>,
    pub body: Vec<Form>,
    pub env: Env,
}

/// Parse a `def`/`defp` call form.
pub fn parse_def(env: &Env, call: &Call, public: bool) -> TranslateResult<FunctionClause> {
    let [head, branches] = call.args.as_slice() else {
        return Err(TranslateError::shape("def", "expected head and body", call.meta.span));
    };
    let (head, guard) = split_guard(head);
    let (name, params) = match head {
        Form::Call(c) => match &c.target {
            Callee::Name(name) => (name.clone(), c.args.clone()),
            Callee::Remote(_) => {
                return Err(TranslateError::shape("def", "malformed head", c.meta.span));
            }
        },
        Form::Var(v) => (v.name.clone(), Vec::new()),
        other => {
            return Err(TranslateError::shape(
                "def",
                format!("malformed head {}", other),
                call.meta.span,
            ));
        }
    };
    let body = branches
        .keyword_get("do")
        .ok_or_else(|| TranslateError::shape("def", "missing do block", call.meta.span))?;
    Ok(FunctionClause {
        arity: params.len(),
        name,
        public,
        params,
        guard: guard.cloned(),
        body: body.body_forms().into_iter().cloned().collect(),
        env: env.clone(),
    })
}

fn split_guard(head: &Form) -> (&Form, Option<&Form>) {
    if let Some(when) = head.call_named("when") {
        if let [inner, guard] = when.args.as_slice() {
            return (inner, Some(guard));
        }
    }
    (head, None)
}

/// Group clauses by emitted function name, preserving first-seen
/// order. The target has one binding per name, so every arity of a
/// name shares one table.
pub fn group(clauses: Vec<FunctionClause>) -> IndexMap<String, Vec<FunctionClause>> {
    let mut groups: IndexMap<String, Vec<FunctionClause>> = IndexMap::new();
    for clause in clauses {
        groups.entry(clause.name.clone()).or_default().push(clause);
    }
    groups
}

/// Emit one grouped function as `const name = Patterns.defmatch(…)`.
pub fn emit_group(
    ctx: &mut CompilationContext,
    name: &str,
    clauses: &[FunctionClause],
) -> TranslateResult<Node> {
    let mut nodes = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let body: Vec<&Form> = clause.body.iter().collect();
        nodes.push(clause_node(
            ctx,
            &clause.env,
            &clause.params,
            clause.guard.as_ref(),
            &body,
        )?);
    }
    Ok(const_decl(
        identifier(primitives::filter_identifier(name)),
        emit::defmatch_node(nodes),
    ))
}

/// An anonymous function: a clause table usable as a value.
pub fn anonymous(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    _meta: Meta,
) -> TranslateResult<Node> {
    let clauses = args
        .iter()
        .map(|clause| arrow_clause(ctx, env, clause))
        .collect::<TranslateResult<Vec<_>>>()?;
    Ok(emit::defmatch_node(clauses))
}

/// One `params -> body` clause.
pub fn arrow_clause(
    ctx: &mut CompilationContext,
    env: &Env,
    form: &Form,
) -> TranslateResult<Node> {
    let clause = form
        .call_named("->")
        .ok_or_else(|| TranslateError::shape("clause", "expected `->`", form.span()))?;
    let [params_form, body] = clause.args.as_slice() else {
        return Err(TranslateError::shape("clause", "malformed clause", clause.meta.span));
    };
    let Form::List(params) = params_form else {
        return Err(TranslateError::shape("clause", "malformed parameters", clause.meta.span));
    };
    // A guard wraps the whole parameter row:
    // `fn x, y when x > y -> …` arrives as `[when(x, y, guard)]`.
    let (params, guard): (Vec<Form>, Option<&Form>) = match params.as_slice() {
        [single] if single.call_named("when").is_some() => {
            let when = single.call_named("when").map(|w| w.args.as_slice()).unwrap_or(&[]);
            match when.split_last() {
                Some((guard, heads)) => (heads.to_vec(), Some(guard)),
                None => (Vec::new(), None),
            }
        }
        _ => (params.clone(), None),
    };
    clause_node(ctx, env, &params, guard, &body.body_forms())
}

/// The clause table for a list of `->` clauses (a `case` body, a
/// rescue/catch section, a receive body).
pub fn arrow_clause_table(
    ctx: &mut CompilationContext,
    env: &Env,
    form: &Form,
    construct: &'static str,
) -> TranslateResult<Vec<Node>> {
    let Form::List(clauses) = form else {
        return Err(TranslateError::shape(construct, "expected clause list", form.span()));
    };
    clauses
        .iter()
        .map(|clause| arrow_clause(ctx, env, clause))
        .collect()
}

/// Lower one clause: patterns, the guard thunk and the body thunk,
/// both over the bound slots in binding order.
pub fn clause_node(
    ctx: &mut CompilationContext,
    env: &Env,
    param_forms: &[Form],
    guard: Option<&Form>,
    body_forms: &[&Form],
) -> TranslateResult<Node> {
    let lowered = param_forms
        .iter()
        .map(|param| patterns::lower(env, param))
        .collect::<TranslateResult<Vec<_>>>()?;

    let mut names: Vec<String> = Vec::new();
    for pattern in &lowered {
        for name in pattern.bindings() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    let params: Vec<Node> = names.iter().map(identifier).collect();

    let body = Translator::arrow_over(ctx, env, params.clone(), body_forms)?;
    let guard = match guard {
        Some(form) => Some(arrow(params, Translator::translate(ctx, env, form)?)),
        None => None,
    };
    let pattern_nodes = lowered.iter().map(emit::pattern_node).collect();
    Ok(emit::clause_node(pattern_nodes, body, guard))
}
