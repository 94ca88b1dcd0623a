//! Factory functions for target AST nodes.
//!
//! These are the construction surface the translator is written
//! against; nothing else in the workspace builds [`Node`] values by
//! hand.

use crate::node::{DeclarationKind, LiteralValue, Node};

pub fn program(body: Vec<Node>) -> Node {
    Node::Program { body }
}

pub fn identifier(name: impl Into<String>) -> Node {
    Node::Identifier { name: name.into() }
}

pub fn literal_int(value: i64) -> Node {
    Node::Literal {
        value: LiteralValue::Int(value),
    }
}

pub fn literal_float(value: f64) -> Node {
    Node::Literal {
        value: LiteralValue::Float(value),
    }
}

pub fn literal_str(value: impl Into<String>) -> Node {
    Node::Literal {
        value: LiteralValue::Str(value.into()),
    }
}

pub fn literal_bool(value: bool) -> Node {
    Node::Literal {
        value: LiteralValue::Bool(value),
    }
}

pub fn literal_null() -> Node {
    Node::Literal {
        value: LiteralValue::Null,
    }
}

pub fn call(callee: Node, arguments: Vec<Node>) -> Node {
    Node::CallExpression {
        callee: Box::new(callee),
        arguments,
    }
}

pub fn member(object: Node, property: Node) -> Node {
    Node::MemberExpression {
        object: Box::new(object),
        property: Box::new(property),
        computed: false,
    }
}

pub fn member_computed(object: Node, property: Node) -> Node {
    Node::MemberExpression {
        object: Box::new(object),
        property: Box::new(property),
        computed: true,
    }
}

pub fn object(properties: Vec<Node>) -> Node {
    Node::ObjectExpression { properties }
}

pub fn property(key: Node, value: Node) -> Node {
    Node::Property {
        key: Box::new(key),
        value: Box::new(value),
    }
}

pub fn array(elements: Vec<Node>) -> Node {
    Node::ArrayExpression { elements }
}

pub fn array_pattern(elements: Vec<Node>) -> Node {
    Node::ArrayPattern { elements }
}

pub fn binary(operator: impl Into<String>, left: Node, right: Node) -> Node {
    Node::BinaryExpression {
        operator: operator.into(),
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn unary(operator: impl Into<String>, argument: Node) -> Node {
    Node::UnaryExpression {
        operator: operator.into(),
        argument: Box::new(argument),
    }
}

/// An arrow whose body is a single expression.
pub fn arrow(params: Vec<Node>, body: Node) -> Node {
    Node::ArrowFunctionExpression {
        params,
        body: Box::new(body),
        expression: true,
    }
}

/// An arrow whose body is a statement block.
pub fn arrow_block(params: Vec<Node>, body: Vec<Node>) -> Node {
    Node::ArrowFunctionExpression {
        params,
        body: Box::new(block(body)),
        expression: false,
    }
}

pub fn block(body: Vec<Node>) -> Node {
    Node::BlockStatement { body }
}

pub fn ret(argument: Node) -> Node {
    Node::ReturnStatement {
        argument: Some(Box::new(argument)),
    }
}

pub fn expr_stmt(expression: Node) -> Node {
    Node::ExpressionStatement {
        expression: Box::new(expression),
    }
}

pub fn const_decl(id: Node, init: Node) -> Node {
    Node::VariableDeclaration {
        kind: DeclarationKind::Const,
        declarations: vec![Node::VariableDeclarator {
            id: Box::new(id),
            init: Some(Box::new(init)),
        }],
    }
}

pub fn function_declaration(name: impl Into<String>, params: Vec<Node>, body: Vec<Node>) -> Node {
    Node::FunctionDeclaration {
        id: Box::new(identifier(name)),
        params,
        body: Box::new(block(body)),
    }
}

/// `import Local from 'source'`.
pub fn import_default(local: impl Into<String>, source: impl Into<String>) -> Node {
    Node::ImportDeclaration {
        specifiers: vec![Node::ImportDefaultSpecifier {
            local: Box::new(identifier(local)),
        }],
        source: Box::new(literal_str(source)),
    }
}

/// `import { a, b } from 'source'`.
pub fn import_named(names: Vec<String>, source: impl Into<String>) -> Node {
    Node::ImportDeclaration {
        specifiers: names
            .into_iter()
            .map(|name| Node::ImportSpecifier {
                imported: Box::new(identifier(name.clone())),
                local: Box::new(identifier(name)),
            })
            .collect(),
        source: Box::new(literal_str(source)),
    }
}

/// `export { a, b }`.
pub fn export_named(names: Vec<String>) -> Node {
    Node::ExportNamedDeclaration {
        specifiers: names
            .into_iter()
            .map(|name| Node::ExportSpecifier {
                local: Box::new(identifier(name.clone())),
                exported: Box::new(identifier(name)),
            })
            .collect(),
    }
}
