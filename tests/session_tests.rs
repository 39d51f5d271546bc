//! Run ownership across superseded and completed runs

use playground_runner::{ResourceRegistry, RunSession, Runner, RunnerConfig};

const TESTS: &str = "import { f } from './f';\ntest('f', () => expect(f()).toBe(1));";
const CODE: &str = "export const f = () => 1;";

fn runner() -> (Runner, ResourceRegistry) {
    let registry = ResourceRegistry::new();
    (
        Runner::with_registry(RunnerConfig::default(), registry.clone()),
        registry,
    )
}

#[test]
fn test_completed_run_becomes_current() {
    let (runner, registry) = runner();
    let mut session = RunSession::new();

    let ticket = session.begin();
    let outcome = runner.run_tests(TESTS, CODE, "f");
    let current = session.complete(ticket, outcome).expect("current run");
    assert!(current.is_solved());
    assert_eq!(registry.live(), 2);
}

#[test]
fn test_stale_outcome_is_released_and_dropped() {
    let (runner, registry) = runner();
    let mut session = RunSession::new();

    let stale = session.begin();
    let fresh = session.begin();
    assert!(!session.is_current(stale));
    assert!(session.is_current(fresh));

    let outcome = runner.run_tests(TESTS, CODE, "f");
    assert!(session.complete(stale, outcome).is_none());
    assert!(session.current().is_none());
    assert_eq!(registry.live(), 0);
}

#[test]
fn test_new_run_releases_previous_one() {
    let (runner, registry) = runner();
    let mut session = RunSession::new();

    let first = session.begin();
    session.complete(first, runner.run_tests(TESTS, CODE, "f"));
    assert_eq!(registry.live(), 2);

    let second = session.begin();
    assert_eq!(registry.live(), 0);
    session.complete(second, runner.run_tests(TESTS, CODE, "f"));
    assert_eq!(registry.live(), 2);
    assert!(second.generation() > first.generation());
}

#[test]
fn test_teardown_and_drop_release() {
    let (runner, registry) = runner();

    let mut session = RunSession::new();
    let ticket = session.begin();
    session.complete(ticket, runner.run_tests(TESTS, CODE, "f"));
    session.teardown();
    assert_eq!(registry.live(), 0);
    assert!(session.current().is_none());

    {
        let mut scoped = RunSession::new();
        let ticket = scoped.begin();
        scoped.complete(ticket, runner.run_tests(TESTS, CODE, "f"));
        assert_eq!(registry.live(), 2);
    }
    assert_eq!(registry.live(), 0);
}
