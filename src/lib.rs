//! Playground Runner: run exercise test suites against learner code
//!
//! The runner takes an exercise's test file, the learner's solution and the
//! exercise slug, and executes the tests inside an embedded ECMAScript
//! interpreter. It returns a structured report (`passed`/`failed`/`skipped`
//! counts plus per-test messages) or, when the program could not be loaded or
//! evaluated, a failed-run report carrying the error text.
//!
//! # Quick Start
//!
//! ```no_run
//! use playground_runner::{RunReport, Runner, RunnerConfig};
//!
//! let runner = Runner::new(RunnerConfig::default());
//! let outcome = runner.run_tests(
//!     "import { twoFer } from './two-fer';\n\
//!      describe('twoFer', () => {\n\
//!        test('no name', () => expect(twoFer()).toBe('One for you, one for me.'));\n\
//!      });",
//!     "export const twoFer = (name = 'you') => `One for ${name}, one for me.`;",
//!     "two-fer",
//! );
//! if let RunReport::Completed(result) = &outcome.report {
//!     println!("{} / {} passed", result.passed, result.total());
//! }
//! outcome.cleanup.release();
//! ```
//!
//! # Module Overview
//!
//! A run flows: [`assembler`] → [`loader`] → [`runner`] → [`report`]
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Core** | [`runner`], [`assembler`], [`harness`], [`loader`], [`report`], [`error`](Error) |
//! | **Tracks** | [`typescript`], [`exercise`] |
//! | **Embedding** | [`session`], [`config`] |

mod error;

pub mod assembler;
pub mod config;
pub mod exercise;
pub mod harness;
pub mod loader;
pub mod report;
pub mod runner;
pub mod session;
pub mod typescript;

pub use config::RunnerConfig;
pub use error::{Error, LoadStage, Result};
pub use exercise::{DirectorySource, Exercise, ExerciseSource, Track};
pub use harness::{ConsoleEntry, ConsoleLevel};
pub use loader::{Resource, ResourceRegistry};
pub use report::{FailedRun, RunReport, RunResult, TestMessage, TestStatus};
pub use runner::{run_tests, Cleanup, RunOutcome, Runner};
pub use session::{RunSession, RunTicket};

/// Version of the playground runner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
