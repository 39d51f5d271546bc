//! TypeScript track: type stripping followed by a full run

use playground_runner::{
    typescript, DirectorySource, ExerciseSource, Runner, RunnerConfig, Track,
};
use pretty_assertions::assert_eq;
use std::fs;

const LASAGNA_TESTS: &str = r#"import { Lasagna, Layer, preparationTime } from './lasagna';

describe('lasagna', () => {
  test('remaining minutes', () => {
    const lasagna: Lasagna = new Lasagna(40);
    expect(lasagna.remaining(30)).toBe(10);
  });

  test('preparation time', () => {
    expect(preparationTime(3)).toBe(6);
  });

  test('layers', () => {
    expect(Layer.Sauce).toBe(1);
    expect(Layer[0]).toBe('Pasta');
  });
});
"#;

const LASAGNA: &str = r#"export enum Layer { Pasta, Sauce }

interface Timer {
  remaining(elapsed: number): number;
}

export class Lasagna implements Timer {
  constructor(private readonly expected: number) {}

  remaining(elapsed: number): number {
    return this.expected - elapsed;
  }
}

export function preparationTime(layers: number, perLayer: number = 2): number {
  return layers * perLayer;
}
"#;

#[test]
fn test_typescript_exercise_runs() {
    let outcome = Runner::default().run_exercise(Track::TypeScript, LASAGNA_TESTS, LASAGNA, "lasagna");
    let result = outcome.report.as_completed().expect("completed run");
    assert_eq!(result.passed, 3, "{:?}", result.messages);
    assert!(outcome.is_solved());
}

#[test]
fn test_transpiled_learner_code_shape() {
    let js = typescript::transpile(LASAGNA).unwrap();
    assert!(js.contains("export class Lasagna {"));
    assert!(js.contains("constructor(expected) { this.expected = expected;}"));
    assert!(js.contains("export function preparationTime(layers, perLayer = 2) {"));
    assert_eq!(js.lines().count(), LASAGNA.lines().count());
}

#[test]
fn test_transpile_error_is_a_failed_run() {
    let outcome = Runner::default().run_exercise(
        Track::TypeScript,
        LASAGNA_TESTS,
        "namespace Kitchen {\n}\n",
        "lasagna",
    );
    let failed = outcome.report.as_failed().expect("failed run");
    assert!(failed.message.starts_with("TranspileError:"), "{}", failed.message);
}

#[test]
fn test_javascript_track_is_not_transformed() {
    let tests = "import { f } from './f';\ntest('f', () => expect(f()).toBe(1));";
    let outcome = Runner::default().run_exercise(Track::JavaScript, tests, "export const f = () => 1;", "f");
    assert!(outcome.is_solved());
}

#[test]
fn test_exercise_directory_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("practice").join("lasagna");
    fs::create_dir_all(dir.join(".docs")).unwrap();
    fs::write(dir.join("lasagna.ts"), LASAGNA).unwrap();
    fs::write(dir.join("lasagna.test.ts"), LASAGNA_TESTS).unwrap();
    fs::write(dir.join(".docs/after.md"), "Well done").unwrap();

    let exercise = DirectorySource::new(root.path())
        .fetch(Track::TypeScript, "lasagna")
        .unwrap();
    assert_eq!(exercise.after.as_deref(), Some("Well done"));

    let runner = Runner::new(RunnerConfig::default());
    let outcome = runner.run_exercise(exercise.track, &exercise.tests, &exercise.stub, &exercise.slug);
    assert!(outcome.is_solved());
}
