use criterion::{Criterion, black_box, criterion_group, criterion_main};

use monkey::backend::Backend;
use monkey::evaluator::Evaluator;
use monkey::vm::{VM, VmBackend};
use monkey::{compiler, lexer, parser};

/// A long chain of conditionals and arithmetic, large enough that dispatch
/// dominates over setup.
fn bench_source() -> String {
    let mut source = String::from("0");
    for index in 0..200 {
        source.push_str(&format!(
            " + if ({index} > 100) {{ {index} * 3 }} else {{ {index} / 2 + 1 }}"
        ));
    }
    source.push(';');
    source
}

fn bench_backends(c: &mut Criterion) {
    let source = bench_source();
    let tokens = lexer::tokenize(&source).expect("tokenize bench source");
    let program = parser::parse_tokens(tokens.clone()).expect("parse bench source");

    c.bench_function("frontend_tokenize", |b| {
        b.iter(|| {
            let out = lexer::tokenize(black_box(&source)).expect("tokenize");
            black_box(out);
        })
    });

    c.bench_function("frontend_parse_only", |b| {
        b.iter(|| {
            let out = parser::parse_tokens(black_box(tokens.clone())).expect("parse");
            black_box(out);
        })
    });

    c.bench_function("backend_evaluator_total", |b| {
        let evaluator = Evaluator::new();
        b.iter(|| {
            let output = evaluator.run(black_box(&program)).expect("run");
            black_box(output);
        })
    });

    c.bench_function("backend_vm_compile_only", |b| {
        b.iter(|| {
            let bytecode = compiler::compile(black_box(&program)).expect("compile");
            black_box(bytecode);
        })
    });

    c.bench_function("backend_vm_execute_prepared", |b| {
        let bytecode = compiler::compile(&program).expect("compile");
        b.iter(|| {
            let mut vm = VM::new(black_box(bytecode.clone()));
            vm.run().expect("run compiled");
            black_box(vm.last_popped_stack_element().clone());
        })
    });

    c.bench_function("backend_vm_total", |b| {
        let vm_backend = VmBackend::new();
        b.iter(|| {
            let output = vm_backend.run(black_box(&program)).expect("run");
            black_box(output);
        })
    });
}

criterion_group!(benches, bench_backends);
criterion_main!(benches);
