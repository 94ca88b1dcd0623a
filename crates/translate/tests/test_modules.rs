//! Tests for module translation: registration, aliases, imports,
//! inner modules and export lists.

use basalt_estree::builder::{call, const_decl, identifier, import_default, literal_str, member};
use basalt_estree::Node;
use basalt_syntax::Form;
use basalt_translate::{translate_source, CompilationContext, TranslateError};

fn defmodule(segments: &[&str], body: Vec<Form>) -> Form {
    Form::call(
        "defmodule",
        vec![
            Form::aliases(segments),
            Form::kw(vec![("do", Form::block(body))]),
        ],
    )
}

fn module_const(name: &str) -> Node {
    const_decl(
        identifier("__MODULE__"),
        call(
            member(identifier("SpecialForms"), identifier("atom")),
            vec![literal_str(name)],
        ),
    )
}

fn export_names(program: &Node) -> Vec<String> {
    let body = program.program_body().expect("expected a program");
    body.iter()
        .find_map(|node| match node {
            Node::ExportNamedDeclaration { specifiers } => Some(
                specifiers
                    .iter()
                    .filter_map(|spec| match spec {
                        Node::ExportSpecifier { exported, .. } => {
                            exported.identifier_name().map(str::to_string)
                        }
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
        .expect("expected an export declaration")
}

#[test]
fn test_empty_module() {
    let mut ctx = CompilationContext::new(".");
    let file = translate_source(&mut ctx, &defmodule(&["Elephant"], vec![])).unwrap();
    assert!(file.is_none());

    let programs = ctx.into_programs();
    assert_eq!(programs.len(), 1);
    assert_eq!(programs[0].path.name(), "Elephant");

    let body = programs[0].program.program_body().unwrap();
    assert_eq!(body.len(), 2);
    assert_eq!(body[0], module_const("Elephant"));
    assert_eq!(export_names(&programs[0].program), Vec::<String>::new());
}

#[test]
fn test_module_with_alias() {
    let mut ctx = CompilationContext::new(".");
    let module = defmodule(
        &["A"],
        vec![Form::call("alias", vec![Form::aliases(&["Hello", "World"])])],
    );
    translate_source(&mut ctx, &module).unwrap();

    let programs = ctx.into_programs();
    assert_eq!(programs.len(), 1);
    let body = programs[0].program.program_body().unwrap();
    assert_eq!(body[0], import_default("World", "hello/world"));
    assert_eq!(body[1], module_const("A"));
    assert_eq!(export_names(&programs[0].program), Vec::<String>::new());
}

#[test]
fn test_file_scope_alias_with_rename() {
    let mut ctx = CompilationContext::new(".");
    let alias = Form::call(
        "alias",
        vec![
            Form::aliases(&["Hello", "World"]),
            Form::kw(vec![("as", Form::aliases(&["Test"]))]),
        ],
    );
    let file = translate_source(&mut ctx, &alias).unwrap().unwrap();
    let body = file.program_body().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0], import_default("Test", "hello/world"));
}

#[test]
fn test_realiasing_replaces_binding() {
    let mut ctx = CompilationContext::new(".");
    let module = defmodule(
        &["A"],
        vec![
            Form::call("alias", vec![Form::aliases(&["First", "T"])]),
            Form::call(
                "alias",
                vec![
                    Form::aliases(&["Second", "X"]),
                    Form::kw(vec![("as", Form::aliases(&["T"]))]),
                ],
            ),
            // The struct reference resolves through the latest binding.
            Form::call(
                "def",
                vec![
                    Form::var("make"),
                    Form::kw(vec![(
                        "do",
                        Form::call(
                            "%",
                            vec![Form::aliases(&["T"]), Form::call("%{}", vec![])],
                        ),
                    )]),
                ],
            ),
        ],
    );
    translate_source(&mut ctx, &module).unwrap();
    let programs = ctx.into_programs();
    let body = programs[0].program.program_body().unwrap();
    assert_eq!(body[0], import_default("T", "first/t"));
    assert_eq!(body[1], import_default("T", "second/x"));
}

#[test]
fn test_multi_alias_expands_per_member() {
    let mut ctx = CompilationContext::new(".");
    let target = Form::remote_call(
        Form::dot(Form::aliases(&["Deep"]), "{}"),
        vec![Form::aliases(&["A"]), Form::aliases(&["B"])],
    );
    let alias = Form::call("alias", vec![target]);
    let file = translate_source(&mut ctx, &alias).unwrap().unwrap();
    let body = file.program_body().unwrap();
    assert_eq!(body[0], import_default("A", "deep/a"));
    assert_eq!(body[1], import_default("B", "deep/b"));
}

#[test]
fn test_inner_modules_emit_before_enclosing() {
    let inner = defmodule(
        &["Elephant"],
        vec![Form::call(
            "defstruct",
            vec![Form::kw(vec![("trunk", Form::Bool(true))])],
        )],
    );
    let make = Form::call(
        "def",
        vec![
            Form::var("f"),
            Form::kw(vec![(
                "do",
                Form::call(
                    "%",
                    vec![Form::aliases(&["Elephant"]), Form::call("%{}", vec![])],
                ),
            )]),
        ],
    );
    let outer = defmodule(&["Animals"], vec![inner, make]);

    let mut ctx = CompilationContext::new(".");
    translate_source(&mut ctx, &outer).unwrap();
    let programs = ctx.into_programs();

    assert_eq!(programs.len(), 2);
    assert_eq!(programs[0].path.name(), "Animals.Elephant");
    assert_eq!(programs[1].path.name(), "Animals");

    // The inner module exports its struct factory.
    assert!(export_names(&programs[0].program).contains(&"defstruct".to_string()));

    // The enclosing module imports the inner one from its
    // fully-qualified path.
    let body = programs[1].program.program_body().unwrap();
    assert_eq!(body[0], import_default("Elephant", "animals/elephant"));
    assert!(export_names(&programs[1].program).contains(&"f".to_string()));
}

#[test]
fn test_unaliased_struct_reference_imports_the_module() {
    // %Animals.Elephant{} with no alias in scope must still reach a
    // bound identifier.
    let module = defmodule(
        &["App"],
        vec![Form::call(
            "def",
            vec![
                Form::var("make"),
                Form::kw(vec![(
                    "do",
                    Form::call(
                        "%",
                        vec![
                            Form::aliases(&["Animals", "Elephant"]),
                            Form::call("%{}", vec![]),
                        ],
                    ),
                )]),
            ],
        )],
    );
    let mut ctx = CompilationContext::new(".");
    translate_source(&mut ctx, &module).unwrap();
    let programs = ctx.into_programs();

    let body = programs[0].program.program_body().unwrap();
    assert_eq!(body[0], import_default("Animals__Elephant", "animals/elephant"));

    let rendered = serde_json::to_string(&programs[0].program).unwrap();
    assert!(rendered.contains("\"name\":\"Animals__Elephant\""));
    // The raw last segment is never referenced on its own.
    assert!(!rendered.contains("\"object\":{\"type\":\"Identifier\",\"name\":\"Elephant\"}"));
}

#[test]
fn test_unaliased_qualified_call_imports_the_module() {
    let module = defmodule(
        &["App"],
        vec![Form::call(
            "def",
            vec![
                Form::var("run"),
                Form::kw(vec![(
                    "do",
                    Form::remote_call(
                        Form::dot(Form::aliases(&["MyApp", "Users", "Repo"]), "get"),
                        vec![Form::Int(1)],
                    ),
                )]),
            ],
        )],
    );
    let mut ctx = CompilationContext::new(".");
    translate_source(&mut ctx, &module).unwrap();
    let programs = ctx.into_programs();

    let body = programs[0].program.program_body().unwrap();
    assert_eq!(
        body[0],
        import_default("MyApp__Users__Repo", "myapp/users/repo")
    );
    let rendered = serde_json::to_string(&programs[0].program).unwrap();
    assert!(rendered.contains("\"name\":\"MyApp__Users__Repo\""));
}

#[test]
fn test_auto_import_is_emitted_once_per_module() {
    // Two references to the same unaliased module share one import.
    let make = |name: &str| {
        Form::call(
            "def",
            vec![
                Form::var(name),
                Form::kw(vec![(
                    "do",
                    Form::call(
                        "%",
                        vec![
                            Form::aliases(&["Animals", "Elephant"]),
                            Form::call("%{}", vec![]),
                        ],
                    ),
                )]),
            ],
        )
    };
    let module = defmodule(&["App"], vec![make("one"), make("two")]);
    let mut ctx = CompilationContext::new(".");
    translate_source(&mut ctx, &module).unwrap();
    let programs = ctx.into_programs();

    let body = programs[0].program.program_body().unwrap();
    let imports = body
        .iter()
        .filter(|node| matches!(node, Node::ImportDeclaration { .. }))
        .count();
    assert_eq!(imports, 1);
}

#[test]
fn test_duplicate_module_is_fatal() {
    let mut ctx = CompilationContext::new(".");
    ctx.set_source_label("lib/first.ex");
    translate_source(&mut ctx, &defmodule(&["M"], vec![])).unwrap();

    ctx.set_source_label("lib/second.ex");
    let err = translate_source(&mut ctx, &defmodule(&["M"], vec![])).unwrap_err();
    match err {
        TranslateError::DuplicateModule { name, first, second } => {
            assert_eq!(name, "M");
            assert_eq!(first, "lib/first.ex");
            assert_eq!(second, "lib/second.ex");
        }
        other => panic!("expected duplicate module error, got {other}"),
    }
}

#[test]
fn test_import_registers_directive_and_emits_declaration() {
    let mut ctx = CompilationContext::new(".");
    let lib = defmodule(
        &["Lib"],
        vec![Form::call(
            "def",
            vec![
                Form::call("go", vec![Form::var("x")]),
                Form::kw(vec![("do", Form::var("x"))]),
            ],
        )],
    );
    let app = defmodule(
        &["App"],
        vec![Form::call("import", vec![Form::aliases(&["Lib"])])],
    );
    translate_source(&mut ctx, &lib).unwrap();
    translate_source(&mut ctx, &app).unwrap();
    ctx.process_imports();

    let record = ctx
        .get_module(&basalt_syntax::ModulePath::from_segments(["App"]))
        .unwrap();
    assert_eq!(record.resolved_imports.len(), 1);
    assert_eq!(
        record.resolved_imports[0].functions,
        vec![("go".to_string(), 1)]
    );

    let programs = ctx.into_programs();
    let app_program = programs
        .iter()
        .find(|p| p.path.name() == "App")
        .unwrap();
    let body = app_program.program.program_body().unwrap();
    assert_eq!(body[0], import_default("Lib", "lib"));
}

#[test]
fn test_imported_call_requalifies() {
    let mut ctx = CompilationContext::new(".");
    let lib = defmodule(
        &["Lib"],
        vec![Form::call(
            "def",
            vec![
                Form::call("go", vec![Form::var("x")]),
                Form::kw(vec![("do", Form::var("x"))]),
            ],
        )],
    );
    translate_source(&mut ctx, &lib).unwrap();

    let app = defmodule(
        &["App"],
        vec![
            Form::call("import", vec![Form::aliases(&["Lib"])]),
            Form::call(
                "def",
                vec![
                    Form::var("run"),
                    Form::kw(vec![("do", Form::call("go", vec![Form::Int(1)]))]),
                ],
            ),
        ],
    );
    translate_source(&mut ctx, &app).unwrap();

    let programs = ctx.into_programs();
    let app_program = programs.iter().find(|p| p.path.name() == "App").unwrap();
    let rendered = serde_json::to_string(&app_program.program).unwrap();
    // The bare `go(1)` was rewritten to a qualified call on the
    // imported module binding.
    assert!(rendered.contains("\"name\":\"Lib\""));
    assert!(!rendered.contains("\"callee\":{\"type\":\"Identifier\",\"name\":\"go\"}"));
}

#[test]
fn test_unresolved_bare_call_stays_local() {
    let mut ctx = CompilationContext::new(".");
    let module = defmodule(
        &["A"],
        vec![Form::call(
            "def",
            vec![
                Form::var("run"),
                Form::kw(vec![("do", Form::call("helper", vec![]))]),
            ],
        )],
    );
    translate_source(&mut ctx, &module).unwrap();
    let programs = ctx.into_programs();
    let rendered = serde_json::to_string(&programs[0].program).unwrap();
    assert!(rendered.contains("\"callee\":{\"type\":\"Identifier\",\"name\":\"helper\"}"));
}

#[test]
fn test_module_attribute_definition_and_read() {
    let mut ctx = CompilationContext::new(".");
    let module = defmodule(
        &["Config"],
        vec![
            Form::call(
                "@",
                vec![Form::call("timeout", vec![Form::Int(5000)])],
            ),
            Form::call(
                "def",
                vec![
                    Form::var("current"),
                    Form::kw(vec![(
                        "do",
                        Form::call("@", vec![Form::var("timeout")]),
                    )]),
                ],
            ),
        ],
    );
    translate_source(&mut ctx, &module).unwrap();
    let programs = ctx.into_programs();
    let body = programs[0].program.program_body().unwrap();
    // The attribute becomes a constant declaration after __MODULE__.
    assert!(matches!(&body[1], Node::VariableDeclaration { declarations, .. }
        if matches!(&declarations[0], Node::VariableDeclarator { id, .. }
            if id.identifier_name() == Some("timeout"))));
}

#[test]
fn test_translating_same_tree_twice_is_shape_stable() {
    let module = defmodule(
        &["Stable"],
        vec![Form::call(
            "def",
            vec![
                Form::var("f"),
                Form::kw(vec![(
                    "do",
                    Form::call(
                        "=",
                        vec![Form::var("x"), Form::Int(1)],
                    ),
                )]),
            ],
        )],
    );

    let mut first = CompilationContext::new(".");
    translate_source(&mut first, &module).unwrap();
    let first_programs = first.into_programs();

    let mut second = CompilationContext::new(".");
    translate_source(&mut second, &module).unwrap();
    let second_programs = second.into_programs();

    assert_eq!(first_programs[0].program, second_programs[0].program);
}
