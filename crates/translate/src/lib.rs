//! # Basalt translation core
//!
//! A tree rewriter that turns source forms — a homoiconic,
//! pattern-matching functional language — into module-shaped target
//! programs. The pipeline:
//!
//! 1. **Input**: parsed source trees, one per file, plus an initial
//!    environment with the compilation root
//! 2. **Dispatch**: shape discrimination routes every node to its
//!    sub-translator, with the Kernel table and the macro-expansion
//!    fixed point ahead of the generic call fallthrough
//! 3. **Lowering**: pattern matching becomes clause tables the target
//!    runtime dispatches at call time
//! 4. **Registration**: modules, aliases, imports and protocol
//!    implementations accumulate in the [`CompilationContext`]
//! 5. **Resolution**: a second pass materializes imports once every
//!    module's exports are known
//! 6. **Output**: one target program per module and per protocol,
//!    handed to the emitter

pub mod context;
pub mod error;
pub mod expand;
pub mod patterns;
pub mod translator;

pub use context::{CompilationContext, ModuleRecord, ProtocolRecord, ResolvedImport, TranslatedProgram};
pub use error::{TranslateError, TranslateResult};
pub use expand::{ExpandError, Expander, NullExpander};
pub use translator::Translator;

use basalt_estree::builder::program;
use basalt_estree::Node;
use basalt_syntax::{Callee, Form};

/// Translate one source file's root form.
///
/// Module-defining forms register their programs in the context;
/// anything else at file scope (directives, expressions) collects into
/// a file-scope program, returned when non-empty.
pub fn translate_source(
    ctx: &mut CompilationContext,
    form: &Form,
) -> TranslateResult<Option<Node>> {
    ctx.reset_temporaries();
    let saved_imports = ctx.take_auto_imports();
    let mut env = ctx.env().clone();
    let mut nodes: Vec<Node> = Vec::new();

    for form in form.body_forms() {
        match form {
            Form::Call(call) if matches!(&call.target, Callee::Name(n) if matches!(n.as_str(), "defmodule" | "defprotocol" | "defimpl")) =>
            {
                Translator::translate(ctx, &env, form)?;
            }
            Form::Call(call) if matches!(&call.target, Callee::Name(n) if matches!(n.as_str(), "alias" | "import" | "require")) =>
            {
                let Callee::Name(name) = &call.target else {
                    continue;
                };
                let (directives, extended) =
                    translator::module::directive(ctx, &env, name, &call.args, call.meta)?;
                nodes.extend(directives);
                env = extended;
            }
            Form::Call(call) if matches!(&call.target, Callee::Name(n) if n == "=") => {
                let (statements, _) = translator::expr::assignment_statements(
                    ctx, &env, &call.args, call.meta, false,
                )?;
                nodes.extend(statements);
            }
            other => {
                nodes.push(basalt_estree::builder::expr_stmt(Translator::translate(
                    ctx, &env, other,
                )?));
            }
        }
    }

    // Imports owed by qualified references made at file scope.
    let owed = ctx.take_auto_imports();
    ctx.restore_auto_imports(saved_imports);
    if !owed.is_empty() {
        let mut imports: Vec<Node> = owed
            .into_iter()
            .map(|(local, canonical)| {
                basalt_estree::builder::import_default(local, canonical.file_path())
            })
            .collect();
        imports.append(&mut nodes);
        nodes = imports;
    }

    if nodes.is_empty() {
        Ok(None)
    } else {
        Ok(Some(program(nodes)))
    }
}
