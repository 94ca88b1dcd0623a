//! Source AST and compilation environment for the Basalt translator.
//!
//! The source language is homoiconic: every construct arrives from the
//! (external) parser as a shallow tagged form. This crate defines that
//! form as a closed variant ([`Form`]), the node metadata carried for
//! error reporting ([`Meta`]), and the immutable environment value
//! ([`Env`]) threaded through translation.

pub mod ast;
pub mod env;

pub use ast::{Call, Callee, Form, Meta, Var};
pub use env::{Env, FunRef, ImportDirective, ImportFilter, ImportOpts, ModulePath};
