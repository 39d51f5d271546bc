//! Shared test helpers for integration tests

use playground_runner::{RunOutcome, RunResult, Runner, RunnerConfig};

/// Run `tests` against `code` with the default configuration.
#[allow(dead_code)]
pub fn run(tests: &str, code: &str, slug: &str) -> RunOutcome {
    Runner::new(RunnerConfig::default()).run_tests(tests, code, slug)
}

/// Run and unwrap the completed aggregate.
#[allow(dead_code)]
pub fn run_completed(tests: &str, code: &str, slug: &str) -> RunResult {
    let outcome = run(tests, code, slug);
    match outcome.report.as_completed() {
        Some(result) => result.clone(),
        None => panic!("run did not complete: {}", outcome.report),
    }
}

/// Wrap assertions in a single test of a suite importing nothing.
#[allow(dead_code)]
pub fn single_test(body: &str) -> String {
    format!("describe('suite', () => {{\n  test('case', () => {{\n{}\n  }});\n}});", body)
}
