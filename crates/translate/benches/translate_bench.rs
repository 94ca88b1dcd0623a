use basalt_syntax::Form;
use basalt_translate::{translate_source, CompilationContext};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// A module with `count` two-clause functions, each dispatching on a
/// literal and a bind, which is the common clause-table shape.
fn sample_module(count: usize) -> Form {
    let mut body = Vec::with_capacity(count * 2);
    for i in 0..count {
        let name = format!("handler_{}", i);
        body.push(Form::call(
            "def",
            vec![
                Form::call(name.clone(), vec![Form::Int(0)]),
                Form::kw(vec![("do", Form::atom("zero"))]),
            ],
        ));
        body.push(Form::call(
            "def",
            vec![
                Form::call(name, vec![Form::var("n")]),
                Form::kw(vec![(
                    "do",
                    Form::call("*", vec![Form::var("n"), Form::Int(2)]),
                )]),
            ],
        ));
    }
    Form::call(
        "defmodule",
        vec![
            Form::aliases(&["Bench"]),
            Form::kw(vec![("do", Form::block(body))]),
        ],
    )
}

fn bench_translate_module(c: &mut Criterion) {
    let module = sample_module(50);
    c.bench_function("translate_module_50_functions", |b| {
        b.iter(|| {
            let mut ctx = CompilationContext::new(".");
            translate_source(&mut ctx, black_box(&module)).unwrap();
            ctx.into_programs().len()
        })
    });
}

criterion_group!(benches, bench_translate_module);
criterion_main!(benches);
