//! Performance benchmarks for the playground runner
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Program assembly (import rewriting and harness splicing)
//! - TypeScript stripping throughput
//! - Full runs, from a fresh interpreter context to the decoded report

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use playground_runner::{assembler, typescript, ResourceRegistry, Runner, RunnerConfig};

const TESTS: &str = r#"import { square } from './square';

describe('square', () => {
  test('one', () => expect(square(1)).toBe(1));
  test('two', () => expect(square(2)).toBe(4));
  test('objects', () => expect({ a: [square(3)] }).toEqual({ a: [9] }));
});
"#;

const CODE: &str = "export const square = (x) => x * x;";

const TS_CODE: &str = r#"export enum Unit { Gram, Kilogram }

interface Scale {
  weigh(item: string): number;
}

export class Kitchen implements Scale {
  constructor(private readonly items: Map<string, number>) {}

  weigh(item: string): number {
    return this.items.get(item) ?? 0;
  }
}

export function total<T extends { weight: number }>(things: T[]): number {
  return things.reduce((sum: number, t: T) => sum + t.weight, 0);
}
"#;

/// Benchmark: assembling the program pair
fn bench_assemble(c: &mut Criterion) {
    let globals = vec!["@jest/globals".to_string()];
    c.bench_function("assemble", |b| {
        let registry = ResourceRegistry::new();
        b.iter(|| {
            let program = assembler::assemble(&registry, black_box(TESTS), CODE, "square", &globals);
            registry.release(&program.resources());
            black_box(program)
        })
    });
}

/// Benchmark: TypeScript stripping at increasing input sizes
fn bench_transpile(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpile");

    for copies in [1usize, 10, 50] {
        let source = TS_CODE.repeat(copies);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(copies), &source, |b, source| {
            b.iter(|| typescript::transpile(black_box(source)).unwrap())
        });
    }

    group.finish();
}

/// Benchmark: complete runs
fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("run");
    group.sample_size(20);

    group.bench_function("passing", |b| {
        let runner = Runner::new(RunnerConfig::default());
        b.iter(|| {
            let outcome = runner.run_tests(black_box(TESTS), CODE, "square");
            outcome.cleanup.release();
            black_box(outcome.report)
        })
    });

    group.bench_function("failing_fast", |b| {
        let runner = Runner::new(RunnerConfig::default());
        let broken = "export const square = (x) => x + x;";
        b.iter(|| black_box(runner.run_tests(black_box(TESTS), broken, "square").report))
    });

    group.finish();
}

criterion_group!(benches, bench_assemble, bench_transpile, bench_run);
criterion_main!(benches);
