//! Round-trip tests: lower a source pattern, then match original
//! values against the lowered descriptor with the host-side matcher.

use basalt_syntax::{Env, Form, ModulePath};
use basalt_translate::patterns::matcher::{first_match, match_term, matches, Term};
use basalt_translate::patterns::{lower, Pattern};

fn lowered(form: &Form) -> Pattern {
    lower(&Env::new(), form).unwrap()
}

#[test]
fn test_literal_roundtrip() {
    let pattern = lowered(&Form::Int(34));
    assert!(matches(&pattern, &Term::Int(34)));
    assert!(!matches(&pattern, &Term::Int(35)));
    assert!(!matches(&pattern, &Term::Str("34".into())));
}

#[test]
fn test_bind_roundtrip() {
    let pattern = lowered(&Form::var("value"));
    assert_eq!(
        match_term(&pattern, &Term::Atom("ok".into())).unwrap(),
        vec![("value".to_string(), Term::Atom("ok".into()))]
    );
}

#[test]
fn test_wildcard_binds_nothing() {
    let pattern = lowered(&Form::var("_"));
    assert_eq!(match_term(&pattern, &Term::Int(1)).unwrap(), vec![]);
}

#[test]
fn test_tuple_pattern_roundtrip() {
    // {:ok, result}
    let pattern = lowered(&Form::pair(Form::atom("ok"), Form::var("result")));
    let value = Term::Tuple(vec![Term::Atom("ok".into()), Term::Int(34)]);
    assert_eq!(
        match_term(&pattern, &value).unwrap(),
        vec![("result".to_string(), Term::Int(34))]
    );

    let error = Term::Tuple(vec![Term::Atom("error".into()), Term::Int(34)]);
    assert!(match_term(&pattern, &error).is_none());
}

#[test]
fn test_parse_result_tuple_elements() {
    // Integer.parse("34") returns {34, ""}: elem 0 and elem 1 check.
    let value = Term::Tuple(vec![Term::Int(34), Term::Str(String::new())]);
    let pattern = lowered(&Form::pair(Form::var("n"), Form::var("rest")));
    let bindings = match_term(&pattern, &value).unwrap();
    assert_eq!(bindings[0].1, Term::Int(34));
    assert_eq!(bindings[1].1, Term::Str(String::new()));
}

#[test]
fn test_head_tail_roundtrip() {
    let form = Form::List(vec![
        Form::var("h"),
        Form::call("|", vec![Form::var("h2"), Form::var("t")]),
    ]);
    let pattern = lowered(&form);
    let value = Term::List(vec![Term::Int(1), Term::Int(2), Term::Int(3)]);
    let bindings = match_term(&pattern, &value).unwrap();
    assert_eq!(
        bindings,
        vec![
            ("h".to_string(), Term::Int(1)),
            ("h2".to_string(), Term::Int(2)),
            ("t".to_string(), Term::List(vec![Term::Int(3)])),
        ]
    );

    // Too short for the heads.
    assert!(match_term(&pattern, &Term::List(vec![Term::Int(1)])).is_none());
}

#[test]
fn test_map_pattern_roundtrip() {
    let form = Form::call(
        "%{}",
        vec![Form::pair(Form::atom("name"), Form::var("name"))],
    );
    let pattern = lowered(&form);
    let value = Term::Map(vec![
        (Term::Atom("name".into()), Term::Str("basalt".into())),
        (Term::Atom("age".into()), Term::Int(3)),
    ]);
    assert_eq!(
        match_term(&pattern, &value).unwrap(),
        vec![("name".to_string(), Term::Str("basalt".into()))]
    );
    assert!(match_term(&pattern, &Term::Map(vec![])).is_none());
}

#[test]
fn test_struct_pattern_respects_aliases() {
    let env = Env::new().with_alias("E", ModulePath::from_segments(["Animals", "Elephant"]));
    let form = Form::call(
        "%",
        vec![
            Form::aliases(&["E"]),
            Form::call(
                "%{}",
                vec![Form::pair(Form::atom("trunk"), Form::var("trunk"))],
            ),
        ],
    );
    let pattern = lower(&env, &form).unwrap();

    let elephant = Term::Struct {
        tag: "Animals.Elephant".into(),
        fields: vec![(Term::Atom("trunk".into()), Term::Bool(true))],
    };
    assert_eq!(
        match_term(&pattern, &elephant).unwrap(),
        vec![("trunk".to_string(), Term::Bool(true))]
    );

    let impostor = Term::Struct {
        tag: "Animals.Mouse".into(),
        fields: vec![(Term::Atom("trunk".into()), Term::Bool(true))],
    };
    assert!(match_term(&pattern, &impostor).is_none());
}

#[test]
fn test_as_pattern_binds_whole_value() {
    // {a, b} = pair
    let form = Form::call(
        "=",
        vec![
            Form::pair(Form::var("a"), Form::var("b")),
            Form::var("pair"),
        ],
    );
    let pattern = lowered(&form);
    let value = Term::Tuple(vec![Term::Int(1), Term::Int(2)]);
    let bindings = match_term(&pattern, &value).unwrap();
    assert_eq!(bindings.len(), 3);
    assert_eq!(bindings[2], ("pair".to_string(), value));
}

#[test]
fn test_pin_pattern_roundtrip() {
    let form = Form::pair(
        Form::var("x"),
        Form::call("^", vec![Form::var("x")]),
    );
    let pattern = lowered(&form);
    assert!(matches(
        &pattern,
        &Term::Tuple(vec![Term::Int(5), Term::Int(5)])
    ));
    assert!(!matches(
        &pattern,
        &Term::Tuple(vec![Term::Int(5), Term::Int(6)])
    ));
}

#[test]
fn test_clause_order_first_match_wins() {
    let clauses = vec![
        vec![lowered(&Form::Int(0))],
        vec![lowered(&Form::var("n"))],
        // Unreachable, but legal.
        vec![lowered(&Form::Int(0))],
    ];
    assert_eq!(first_match(&clauses, &[Term::Int(0)]).unwrap().0, 0);
    assert_eq!(first_match(&clauses, &[Term::Int(9)]).unwrap().0, 1);
}

#[test]
fn test_no_clause_matches() {
    let clauses = vec![vec![lowered(&Form::atom("ok"))]];
    assert!(first_match(&clauses, &[Term::Atom("error".into())]).is_none());
    // Zero-clause tables always fail.
    assert!(first_match(&[], &[Term::Atom("ok".into())]).is_none());
}

#[test]
fn test_bitstring_pattern_roundtrip() {
    // <<version, rest::binary>>
    let form = Form::call(
        "<<>>",
        vec![
            Form::var("version"),
            Form::call("::", vec![Form::var("rest"), Form::var("binary")]),
        ],
    );
    let pattern = lowered(&form);
    let value = Term::Bits(vec![2, b'h', b'i']);
    let bindings = match_term(&pattern, &value).unwrap();
    assert_eq!(bindings[0], ("version".to_string(), Term::Int(2)));
    assert_eq!(bindings[1], ("rest".to_string(), Term::Str("hi".into())));

    // Strings are binaries too.
    let pattern = lowered(&Form::call(
        "<<>>",
        vec![Form::call(
            "::",
            vec![Form::var("all"), Form::var("binary")],
        )],
    ));
    assert!(matches(&pattern, &Term::Str("basalt".into())));
}

#[test]
fn test_nested_pattern_bindings_in_traversal_order() {
    // {:user, [first | _], %{id: id}}
    let form = Form::call(
        "{}",
        vec![
            Form::atom("user"),
            Form::List(vec![Form::call(
                "|",
                vec![Form::var("first"), Form::var("_")],
            )]),
            Form::call("%{}", vec![Form::pair(Form::atom("id"), Form::var("id"))]),
        ],
    );
    let pattern = lowered(&form);
    assert_eq!(pattern.bindings(), vec!["first".to_string(), "id".to_string()]);

    let value = Term::Tuple(vec![
        Term::Atom("user".into()),
        Term::List(vec![Term::Str("a".into()), Term::Str("b".into())]),
        Term::Map(vec![(Term::Atom("id".into()), Term::Int(7))]),
    ]);
    let bindings = match_term(&pattern, &value).unwrap();
    assert_eq!(bindings[0], ("first".to_string(), Term::Str("a".into())));
    assert_eq!(bindings[1], ("id".to_string(), Term::Int(7)));
}
