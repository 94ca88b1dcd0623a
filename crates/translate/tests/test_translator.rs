//! Dispatcher-level tests: primitive shapes, operators, dotted calls,
//! special forms and the macro-expansion fixed point.

use basalt_estree::builder::{array, call, identifier, literal_int, literal_str, member};
use basalt_estree::Node;
use basalt_syntax::{Env, Form};
use basalt_translate::expand::{ExpandError, Expander};
use basalt_translate::{CompilationContext, TranslateError, Translator};

fn translate(form: &Form) -> Node {
    let mut ctx = CompilationContext::new(".");
    Translator::translate(&mut ctx, &Env::new(), form).unwrap()
}

fn translate_err(form: &Form) -> TranslateError {
    let mut ctx = CompilationContext::new(".");
    Translator::translate(&mut ctx, &Env::new(), form).unwrap_err()
}

fn atom_node(name: &str) -> Node {
    call(
        member(identifier("SpecialForms"), identifier("atom")),
        vec![literal_str(name)],
    )
}

#[test]
fn test_literals() {
    assert_eq!(translate(&Form::Int(42)), literal_int(42));
    assert_eq!(translate(&Form::Str("hi".into())), literal_str("hi"));
    assert_eq!(
        translate(&Form::Nil),
        basalt_estree::builder::literal_null()
    );
}

#[test]
fn test_atoms_including_non_ascii() {
    assert_eq!(translate(&Form::atom("ok")), atom_node("ok"));
    assert_eq!(translate(&Form::atom("héllo_wörld")), atom_node("héllo_wörld"));
}

#[test]
fn test_list_and_tuples() {
    assert_eq!(
        translate(&Form::List(vec![Form::Int(1), Form::Int(2)])),
        array(vec![literal_int(1), literal_int(2)])
    );
    assert_eq!(
        translate(&Form::pair(Form::Int(1), Form::Int(2))),
        call(
            member(identifier("SpecialForms"), identifier("tuple")),
            vec![literal_int(1), literal_int(2)],
        )
    );
    // N-ary tuple shape.
    assert_eq!(
        translate(&Form::call("{}", vec![Form::Int(1), Form::Int(2), Form::Int(3)])),
        call(
            member(identifier("SpecialForms"), identifier("tuple")),
            vec![literal_int(1), literal_int(2), literal_int(3)],
        )
    );
}

#[test]
fn test_identifier_filtering() {
    assert_eq!(translate(&Form::var("valid?")), identifier("valid__qmark__"));
    assert_eq!(translate(&Form::var("save!")), identifier("save__emark__"));
}

#[test]
fn test_reflective_forms_are_unsupported() {
    assert!(matches!(
        translate_err(&Form::var("__ENV__")),
        TranslateError::Unsupported { .. }
    ));
    assert!(matches!(
        translate_err(&Form::call("super", vec![])),
        TranslateError::Unsupported { .. }
    ));
}

#[test]
fn test_remote_call_passes_through() {
    // Integer.parse("34") lowers to the same qualified call.
    let form = Form::remote_call(
        Form::dot(Form::aliases(&["Integer"]), "parse"),
        vec![Form::string("34")],
    );
    assert_eq!(
        translate(&form),
        call(
            member(identifier("Integer"), identifier("parse")),
            vec![literal_str("34")],
        )
    );
}

#[test]
fn test_known_module_lowerings() {
    let logger = Form::remote_call(
        Form::dot(Form::aliases(&["Logger"]), "info"),
        vec![Form::string("started")],
    );
    assert_eq!(
        translate(&logger),
        call(
            member(identifier("console"), identifier("info")),
            vec![literal_str("started")],
        )
    );

    let access = Form::remote_call(
        Form::dot(Form::aliases(&["Access"]), "get"),
        vec![Form::var("m"), Form::atom("k")],
    );
    assert!(matches!(
        translate(&access),
        Node::MemberExpression { computed: true, .. }
    ));

    let js = Form::remote_call(
        Form::dot(Form::aliases(&["JS"]), "alert"),
        vec![Form::string("hi")],
    );
    assert_eq!(
        translate(&js),
        call(identifier("alert"), vec![literal_str("hi")])
    );
}

#[test]
fn test_access_get_with_default() {
    // Access.get(m, k, default) keeps the fallback in a runtime call
    // instead of a plain computed member.
    let form = Form::remote_call(
        Form::dot(Form::aliases(&["Access"]), "get"),
        vec![Form::var("m"), Form::atom("k"), Form::Int(0)],
    );
    assert_eq!(
        translate(&form),
        call(
            member(identifier("SpecialForms"), identifier("access")),
            vec![identifier("m"), atom_node("k"), literal_int(0)],
        )
    );
}

#[test]
fn test_zero_arg_dotted_call_uses_property_accessor() {
    let form = Form::remote_call(Form::dot(Form::var("server"), "state"), vec![]);
    assert_eq!(
        translate(&form),
        call(
            member(identifier("SpecialForms"), identifier("dot")),
            vec![identifier("server"), atom_node("state")],
        )
    );
}

#[test]
fn test_anonymous_value_call() {
    // f.(1)
    let form = Form::remote_call(Form::call(".", vec![Form::var("f")]), vec![Form::Int(1)]);
    assert_eq!(
        translate(&form),
        call(identifier("f"), vec![literal_int(1)])
    );
}

#[test]
fn test_operators() {
    let sum = Form::call("+", vec![Form::Int(1), Form::Int(2)]);
    assert_eq!(
        translate(&sum),
        basalt_estree::builder::binary("+", literal_int(1), literal_int(2))
    );

    let concat = Form::call("<>", vec![Form::string("a"), Form::string("b")]);
    assert_eq!(
        translate(&concat),
        basalt_estree::builder::binary("+", literal_str("a"), literal_str("b"))
    );

    let both = Form::call("and", vec![Form::Bool(true), Form::Bool(false)]);
    assert!(matches!(
        translate(&both),
        Node::BinaryExpression { operator, .. } if operator == "&&"
    ));

    let append = Form::call("++", vec![Form::List(vec![]), Form::var("t")]);
    let rendered = serde_json::to_string(&translate(&append)).unwrap();
    assert!(rendered.contains("list_concat"));
}

#[test]
fn test_kernel_builtin_call() {
    let form = Form::call("hd", vec![Form::var("list")]);
    assert_eq!(
        translate(&form),
        call(
            member(identifier("Kernel"), identifier("hd")),
            vec![identifier("list")],
        )
    );
}

#[test]
fn test_pipe_desugars_before_translation() {
    // 1 |> f(2) becomes f(1, 2); `f` is unresolved, so it stays local.
    let form = Form::call(
        "|>",
        vec![Form::Int(1), Form::call("f", vec![Form::Int(2)])],
    );
    assert_eq!(
        translate(&form),
        call(identifier("f"), vec![literal_int(1), literal_int(2)])
    );
}

#[test]
fn test_capture_with_placeholders() {
    // &(&1 + &2)
    let form = Form::call(
        "&",
        vec![Form::call(
            "+",
            vec![
                Form::call("&", vec![Form::Int(1)]),
                Form::call("&", vec![Form::Int(2)]),
            ],
        )],
    );
    match translate(&form) {
        Node::ArrowFunctionExpression { params, .. } => {
            assert_eq!(params, vec![identifier("__1"), identifier("__2")]);
        }
        other => panic!("expected arrow, got {other:?}"),
    }
}

#[test]
fn test_capture_by_name_and_arity() {
    let local = Form::call(
        "&",
        vec![Form::call("/", vec![Form::var("f"), Form::Int(2)])],
    );
    assert_eq!(translate(&local), identifier("f"));

    let remote = Form::call(
        "&",
        vec![Form::call(
            "/",
            vec![
                Form::remote_call(Form::dot(Form::aliases(&["Mod"]), "f"), vec![]),
                Form::Int(2),
            ],
        )],
    );
    assert_eq!(
        translate(&remote),
        member(identifier("Mod"), identifier("f"))
    );
}

#[test]
fn test_string_interpolation() {
    // <<"a", x::binary>> is string concatenation.
    let form = Form::call(
        "<<>>",
        vec![
            Form::string("a"),
            Form::call("::", vec![Form::var("x"), Form::var("binary")]),
        ],
    );
    match translate(&form) {
        Node::BinaryExpression { operator, right, .. } => {
            assert_eq!(operator, "+");
            let rendered = serde_json::to_string(&right).unwrap();
            assert!(rendered.contains("to_string"));
        }
        other => panic!("expected concatenation, got {other:?}"),
    }
}

#[test]
fn test_bitstring_constructor() {
    // <<1, x::size(16)>> is a bitstring, not a string.
    let form = Form::call(
        "<<>>",
        vec![
            Form::Int(1),
            Form::call(
                "::",
                vec![Form::var("x"), Form::call("size", vec![Form::Int(16)])],
            ),
        ],
    );
    let rendered = serde_json::to_string(&translate(&form)).unwrap();
    assert!(rendered.contains("bitstring"));
    assert!(rendered.contains("\"size\""));
}

#[test]
fn test_map_construction_and_update() {
    let build = Form::call(
        "%{}",
        vec![Form::pair(Form::atom("a"), Form::Int(1))],
    );
    let rendered = serde_json::to_string(&translate(&build)).unwrap();
    assert!(rendered.contains("\"name\":\"map\""));

    let update = Form::call(
        "%{}",
        vec![Form::call(
            "|",
            vec![
                Form::var("m"),
                Form::List(vec![Form::pair(Form::atom("a"), Form::Int(2))]),
            ],
        )],
    );
    let rendered = serde_json::to_string(&translate(&update)).unwrap();
    assert!(rendered.contains("map_update"));
}

#[test]
fn test_case_lowers_to_make_case() {
    let form = Form::call(
        "case",
        vec![
            Form::var("x"),
            Form::kw(vec![(
                "do",
                Form::List(vec![
                    Form::call(
                        "->",
                        vec![Form::List(vec![Form::atom("ok")]), Form::Int(1)],
                    ),
                    Form::call(
                        "->",
                        vec![Form::List(vec![Form::var("_")]), Form::Int(2)],
                    ),
                ]),
            )]),
        ],
    );
    match translate(&form) {
        Node::CallExpression { callee, arguments } => {
            let rendered = serde_json::to_string(&callee).unwrap();
            assert!(rendered.contains("make_case"));
            // Scrutinee plus two clauses.
            assert_eq!(arguments.len(), 3);
        }
        other => panic!("expected make_case call, got {other:?}"),
    }
}

#[test]
fn test_quote_reifies_calls_as_tuples() {
    let form = Form::call(
        "quote",
        vec![Form::kw(vec![(
            "do",
            Form::call("foo", vec![Form::Int(1)]),
        )])],
    );
    assert_eq!(
        translate(&form),
        call(
            member(identifier("SpecialForms"), identifier("tuple")),
            vec![atom_node("foo"), array(vec![]), array(vec![literal_int(1)])],
        )
    );
}

#[test]
fn test_quote_unquote_equals_direct_translation() {
    let quoted = Form::call(
        "quote",
        vec![Form::kw(vec![(
            "do",
            Form::call("unquote", vec![Form::var("x")]),
        )])],
    );
    assert_eq!(translate(&quoted), translate(&Form::var("x")));
}

#[test]
fn test_unquote_outside_quote_is_malformed() {
    assert!(matches!(
        translate_err(&Form::call("unquote", vec![Form::var("x")])),
        TranslateError::ShapeMismatch { .. }
    ));
}

/// An expander that rewrites `double(n)` to `n * 2` and leaves
/// everything else alone.
struct DoubleExpander;

impl Expander for DoubleExpander {
    fn expand(&self, form: &Form, _env: &Env) -> Result<Form, ExpandError> {
        if let Some(call) = form.call_named("double") {
            if let [arg] = call.args.as_slice() {
                return Ok(Form::call("*", vec![arg.clone(), Form::Int(2)]));
            }
        }
        Ok(form.clone())
    }
}

#[test]
fn test_macro_expansion_recurses_on_changed_forms() {
    let mut ctx = CompilationContext::with_expander(".", Box::new(DoubleExpander));
    let form = Form::call("double", vec![Form::Int(21)]);
    let node = Translator::translate(&mut ctx, &Env::new(), &form).unwrap();
    assert_eq!(
        node,
        basalt_estree::builder::binary("*", literal_int(21), literal_int(2))
    );
}

#[test]
fn test_expansion_fixed_point_is_a_plain_call() {
    let mut ctx = CompilationContext::with_expander(".", Box::new(DoubleExpander));
    let form = Form::call("triple", vec![Form::Int(3)]);
    let node = Translator::translate(&mut ctx, &Env::new(), &form).unwrap();
    assert_eq!(node, call(identifier("triple"), vec![literal_int(3)]));
}

/// An expander that always fails, checking verbatim propagation.
struct FailingExpander;

impl Expander for FailingExpander {
    fn expand(&self, _form: &Form, _env: &Env) -> Result<Form, ExpandError> {
        Err(ExpandError::new("undefined macro `boom`"))
    }
}

#[test]
fn test_expansion_failure_propagates_verbatim() {
    let mut ctx = CompilationContext::with_expander(".", Box::new(FailingExpander));
    let form = Form::call("boom", vec![]);
    let err = Translator::translate(&mut ctx, &Env::new(), &form).unwrap_err();
    assert_eq!(
        err.to_string(),
        "macro expansion failed: undefined macro `boom`"
    );
}

#[test]
fn test_cond_pairs_tests_with_thunks() {
    let form = Form::call(
        "cond",
        vec![Form::kw(vec![(
            "do",
            Form::List(vec![Form::call(
                "->",
                vec![Form::List(vec![Form::Bool(true)]), Form::Int(1)],
            )]),
        )])],
    );
    let rendered = serde_json::to_string(&translate(&form)).unwrap();
    assert!(rendered.contains("\"name\":\"cond\""));
}

#[test]
fn test_if_lowers_through_kernel() {
    let form = Form::call(
        "if",
        vec![
            Form::Bool(true),
            Form::kw(vec![("do", Form::Int(1)), ("else", Form::Int(2))]),
        ],
    );
    let rendered = serde_json::to_string(&translate(&form)).unwrap();
    assert!(rendered.contains("if_else"));
}

#[test]
fn test_receive_with_timeout() {
    let form = Form::call(
        "receive",
        vec![Form::kw(vec![
            (
                "do",
                Form::List(vec![Form::call(
                    "->",
                    vec![Form::List(vec![Form::var("msg")]), Form::var("msg")],
                )]),
            ),
            (
                "after",
                Form::List(vec![Form::call(
                    "->",
                    vec![Form::List(vec![Form::Int(500)]), Form::atom("timeout")],
                )]),
            ),
        ])],
    );
    let rendered = serde_json::to_string(&translate(&form)).unwrap();
    assert!(rendered.contains("receive"));
    assert!(rendered.contains("500"));
}

#[test]
fn test_try_sections_become_handlers() {
    let form = Form::call(
        "try",
        vec![Form::kw(vec![
            ("do", Form::Int(1)),
            (
                "rescue",
                Form::List(vec![Form::call(
                    "->",
                    vec![
                        Form::List(vec![Form::call(
                            "in",
                            vec![Form::var("e"), Form::aliases(&["RuntimeError"])],
                        )]),
                        Form::var("e"),
                    ],
                )]),
            ),
            ("after", Form::Int(0)),
        ])],
    );
    let rendered = serde_json::to_string(&translate(&form)).unwrap();
    assert!(rendered.contains("\"name\":\"try\""));
    assert!(rendered.contains("RuntimeError"));
}

#[test]
fn test_for_comprehension() {
    // for x <- list, x > 1, do: x * 2
    let form = Form::call(
        "for",
        vec![
            Form::call("<-", vec![Form::var("x"), Form::var("list")]),
            Form::call(">", vec![Form::var("x"), Form::Int(1)]),
            Form::kw(vec![(
                "do",
                Form::call("*", vec![Form::var("x"), Form::Int(2)]),
            )]),
        ],
    );
    let rendered = serde_json::to_string(&translate(&form)).unwrap();
    assert!(rendered.contains("\"name\":\"for\""));
    assert!(rendered.contains("generator"));
}
