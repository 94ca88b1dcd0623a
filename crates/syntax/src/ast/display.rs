//! Compact rendering of source forms for error messages.

use super::{Callee, Form};
use std::fmt;

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::Int(i) => write!(f, "{}", i),
            Form::Float(x) => write!(f, "{}", x),
            Form::Str(s) => write!(f, "{:?}", s),
            Form::Bool(b) => write!(f, "{}", b),
            Form::Nil => write!(f, "nil"),
            Form::Atom(a) => write!(f, ":{}", a),
            Form::List(items) => {
                write!(f, "[")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
            Form::Pair(a, b) => write!(f, "{{{}, {}}}", a, b),
            Form::Var(v) => write!(f, "{}", v.name),
            Form::Call(c) => {
                match &c.target {
                    Callee::Name(name) => write!(f, "{}(", name)?,
                    Callee::Remote(form) => write!(f, "({})(", form)?,
                }
                write_joined(f, &c.args)?;
                write!(f, ")")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Form]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
