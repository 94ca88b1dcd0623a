//! Capture translation: `&f/n`, `&Mod.f/n` and `&expr`.

use crate::context::CompilationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::translator::{expr, primitives, Translator};
use basalt_estree::builder::{arrow, identifier, member};
use basalt_estree::Node;
use basalt_syntax::{Call, Callee, Env, Form, Meta};

pub fn translate(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [captured] = args else {
        return Err(TranslateError::shape("capture", "expected one operand", meta.span));
    };

    // `&name/arity` and `&Mod.name/arity` reference an existing clause
    // table directly; it is already a callable value.
    if let Some(slash) = captured.call_named("/") {
        if let [target, Form::Int(_)] = slash.args.as_slice() {
            return capture_reference(ctx, env, target, slash.meta);
        }
    }

    // `&expr`: placeholders `&1 … &n` become fresh parameters and the
    // expression is wrapped as an anonymous function of the highest
    // placeholder arity.
    let mut max_placeholder = 0usize;
    let substituted = substitute_placeholders(captured, &mut max_placeholder);
    let params: Vec<Node> = (1..=max_placeholder)
        .map(|i| identifier(placeholder_name(i)))
        .collect();
    let body = Translator::translate(ctx, env, &substituted)?;
    Ok(arrow(params, body))
}

fn capture_reference(
    ctx: &mut CompilationContext,
    env: &Env,
    target: &Form,
    meta: Meta,
) -> TranslateResult<Node> {
    match target {
        Form::Var(v) => Ok(primitives::identifier_node(&v.name)),
        Form::Call(call) => match &call.target {
            // `&Mod.f/2` carries a zero-argument remote call as the
            // numerator.
            Callee::Remote(dot_form) => {
                let Some(dot) = dot_form.call_named(".") else {
                    return Err(TranslateError::shape("capture", "malformed reference", meta.span));
                };
                let [module, Form::Atom(fun)] = dot.args.as_slice() else {
                    return Err(TranslateError::shape("capture", "malformed reference", meta.span));
                };
                let segments = module.alias_segments().ok_or_else(|| {
                    TranslateError::shape("capture", "malformed module reference", meta.span)
                })?;
                let local = expr::module_binding(ctx, env, &segments);
                Ok(member(
                    identifier(local),
                    identifier(primitives::filter_identifier(fun)),
                ))
            }
            Callee::Name(name) => Ok(primitives::identifier_node(name)),
        },
        other => Err(TranslateError::shape(
            "capture",
            format!("cannot capture {}", other),
            meta.span,
        )),
    }
}

fn placeholder_name(index: usize) -> String {
    format!("__{}", index)
}

/// Replace `&n` placeholders with the synthesized parameter names,
/// tracking the highest index seen.
fn substitute_placeholders(form: &Form, max: &mut usize) -> Form {
    match form {
        Form::Call(call) => {
            if let Callee::Name(name) = &call.target {
                if name == "&" {
                    if let [Form::Int(index)] = call.args.as_slice() {
                        let index = *index as usize;
                        *max = (*max).max(index);
                        return Form::var(placeholder_name(index));
                    }
                }
            }
            let args = call
                .args
                .iter()
                .map(|arg| substitute_placeholders(arg, max))
                .collect();
            let target = match &call.target {
                Callee::Name(name) => Callee::Name(name.clone()),
                Callee::Remote(inner) => {
                    Callee::Remote(Box::new(substitute_placeholders(inner, max)))
                }
            };
            Form::Call(Call {
                target,
                meta: call.meta,
                args,
            })
        }
        Form::List(items) => Form::List(
            items
                .iter()
                .map(|item| substitute_placeholders(item, max))
                .collect(),
        ),
        Form::Pair(a, b) => Form::Pair(
            Box::new(substitute_placeholders(a, max)),
            Box::new(substitute_placeholders(b, max)),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_placeholders() {
        let mut max = 0;
        let form = Form::call(
            "+",
            vec![
                Form::call("&", vec![Form::Int(1)]),
                Form::call("&", vec![Form::Int(2)]),
            ],
        );
        let substituted = substitute_placeholders(&form, &mut max);
        assert_eq!(max, 2);
        assert_eq!(
            substituted,
            Form::call("+", vec![Form::var("__1"), Form::var("__2")])
        );
    }
}
