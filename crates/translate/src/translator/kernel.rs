//! Kernel builtin lowering.
//!
//! Operators lower to target operators (or runtime list helpers);
//! named builtins lower to qualified calls into the runtime `Kernel`
//! namespace. The table is consulted before macro expansion, so a
//! builtin name is never treated as a local call.

use crate::error::{TranslateError, TranslateResult};
use crate::translator::{primitives, Translator};
use crate::CompilationContext;
use basalt_estree::builder::{binary, call, literal_null, unary};
use basalt_estree::Node;
use basalt_syntax::{Env, Form, Meta};
use phf::{phf_map, phf_set};

/// Binary operators with a direct target spelling.
static BINARY_OPS: phf::Map<&'static str, &'static str> = phf_map! {
    "+" => "+",
    "-" => "-",
    "*" => "*",
    "/" => "/",
    "==" => "==",
    "!=" => "!=",
    "===" => "===",
    "!==" => "!==",
    "<" => "<",
    ">" => ">",
    "<=" => "<=",
    ">=" => ">=",
    "<>" => "+",
    "and" => "&&",
    "&&" => "&&",
    "or" => "||",
    "||" => "||",
    "rem" => "%",
};

/// Named builtins dispatched by `name/arity`.
static KERNEL_CALLS: phf::Set<&'static str> = phf_set! {
    "hd/1", "tl/1", "length/1",
    "elem/2", "put_elem/3", "tuple_size/1",
    "map_size/1",
    "abs/1", "div/2", "max/2", "min/2", "trunc/1", "round/1",
    "to_string/1", "to_charlist/1", "inspect/1",
    "is_atom/1", "is_binary/1", "is_bitstring/1", "is_boolean/1",
    "is_float/1", "is_function/1", "is_function/2", "is_integer/1",
    "is_list/1", "is_map/1", "is_nil/1", "is_number/1", "is_pid/1",
    "is_tuple/1",
    "apply/2", "apply/3",
    "send/2", "self/0", "spawn/1",
    "throw/1", "raise/1", "raise/2",
};

/// Whether `name/arity` is a Kernel builtin of some kind.
pub fn is_builtin(name: &str, arity: usize) -> bool {
    match arity {
        1 if matches!(name, "not" | "!" | "-" | "+") => true,
        2 if BINARY_OPS.contains_key(name) => true,
        2 if matches!(name, "++" | "--" | "in" | "if" | "unless") => true,
        _ => KERNEL_CALLS.contains(format!("{}/{}", name, arity).as_str()),
    }
}

pub fn lower(
    ctx: &mut CompilationContext,
    env: &Env,
    name: &str,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    match (name, args) {
        ("not" | "!", [operand]) => Ok(unary("!", Translator::translate(ctx, env, operand)?)),
        ("-" | "+", [operand]) => Ok(unary(name, Translator::translate(ctx, env, operand)?)),
        ("++", [left, right]) => Ok(call(
            primitives::special_forms("list_concat"),
            vec![
                Translator::translate(ctx, env, left)?,
                Translator::translate(ctx, env, right)?,
            ],
        )),
        ("--", [left, right]) => Ok(call(
            primitives::special_forms("list_subtract"),
            vec![
                Translator::translate(ctx, env, left)?,
                Translator::translate(ctx, env, right)?,
            ],
        )),
        ("in", [left, right]) => Ok(call(
            primitives::kernel_ns("is_in"),
            vec![
                Translator::translate(ctx, env, left)?,
                Translator::translate(ctx, env, right)?,
            ],
        )),
        ("if" | "unless", [condition, branches]) => {
            lower_conditional(ctx, env, name, condition, branches, meta)
        }
        (op, [left, right]) if BINARY_OPS.contains_key(op) => {
            let spelled = BINARY_OPS.get(op).copied().unwrap_or(op);
            Ok(binary(
                spelled,
                Translator::translate(ctx, env, left)?,
                Translator::translate(ctx, env, right)?,
            ))
        }
        _ => {
            let arguments = args
                .iter()
                .map(|arg| Translator::translate(ctx, env, arg))
                .collect::<TranslateResult<Vec<_>>>()?;
            Ok(call(
                primitives::kernel_ns(&primitives::filter_identifier(name)),
                arguments,
            ))
        }
    }
}

/// `if`/`unless` lower to the runtime's two-thunk conditional.
fn lower_conditional(
    ctx: &mut CompilationContext,
    env: &Env,
    name: &str,
    condition: &Form,
    branches: &Form,
    meta: Meta,
) -> TranslateResult<Node> {
    let mut test = Translator::translate(ctx, env, condition)?;
    if name == "unless" {
        test = unary("!", test);
    }
    let consequent = branches
        .keyword_get("do")
        .ok_or_else(|| TranslateError::shape("if", "missing do block", meta.span))?;
    let consequent = Translator::thunk(ctx, env, &consequent.body_forms())?;
    let alternate = match branches.keyword_get("else") {
        Some(form) => Translator::thunk(ctx, env, &form.body_forms())?,
        None => literal_null(),
    };
    Ok(call(
        primitives::special_forms("if_else"),
        vec![test, consequent, alternate],
    ))
}

/// Pipe desugaring: `left |> f(a, b)` rewrites to `f(left, a, b)`
/// before translation.
pub fn pipe(
    ctx: &mut CompilationContext,
    env: &Env,
    args: &[Form],
    meta: Meta,
) -> TranslateResult<Node> {
    let [left, right] = args else {
        return Err(TranslateError::shape("|>", "expected two operands", meta.span));
    };
    let piped = match right {
        Form::Call(call) => {
            let mut call = call.clone();
            call.args.insert(0, left.clone());
            Form::Call(call)
        }
        Form::Var(v) => Form::call(v.name.clone(), vec![left.clone()]),
        other => {
            return Err(TranslateError::shape(
                "|>",
                format!("cannot pipe into {}", other),
                meta.span,
            ));
        }
    };
    Translator::translate(ctx, env, &piped)
}
