//! Run orchestration
//!
//! The public entry point: assemble the program pair, load the test program
//! into a fresh interpreter context, drain the job queue, read the run
//! aggregate off the module namespace and hand it back together with a
//! [`Cleanup`] handle. Nothing escapes as an error: every failure along the way
//! becomes a [`FailedRun`] carrying the same cleanup.
//!
//! ```no_run
//! use playground_runner::run_tests;
//!
//! let outcome = run_tests(
//!     "import { square } from './square';\ntest('squares', () => expect(square(2)).toBe(4));",
//!     "export const square = (x) => x * x;",
//!     "square",
//! );
//! assert!(outcome.is_solved());
//! outcome.cleanup.release();
//! ```

use boa_engine::builtins::promise::PromiseState;
use boa_engine::{Context, JsError, JsString, JsValue, Module, Source};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::assembler::{self, AssembledProgram};
use crate::config::RunnerConfig;
use crate::error::{Error, LoadStage, Result};
use crate::exercise::Track;
use crate::harness::{self, ConsoleEntry, ConsoleLevel};
use crate::loader::{describe_error, Resource, ResourceModuleLoader, ResourceRegistry};
use crate::report::{FailedRun, RunReport, RunResult};
use crate::typescript;

/// `tracing` target console output is replayed under.
pub const CONSOLE_TARGET: &str = "playground::console";

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

/// Releases the resources of exactly one run.
///
/// Idempotent; also runs on drop.
pub struct Cleanup {
    registry: ResourceRegistry,
    resources: Vec<Resource>,
    released: Cell<bool>,
}

impl Cleanup {
    fn new(registry: ResourceRegistry, resources: Vec<Resource>) -> Self {
        Self {
            registry,
            resources,
            released: Cell::new(false),
        }
    }

    pub fn release(&self) {
        if self.released.replace(true) {
            return;
        }
        self.registry.release(&self.resources);
    }

    pub fn is_released(&self) -> bool {
        self.released.get()
    }

    /// Resources this handle owns.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup")
            .field("resources", &self.resources)
            .field("released", &self.released.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// RunOutcome
// ---------------------------------------------------------------------------

/// What [`Runner::run_tests`] hands back.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    /// Console output produced during the run, in call order.
    pub console: Vec<ConsoleEntry>,
    pub cleanup: Cleanup,
}

impl RunOutcome {
    pub fn is_solved(&self) -> bool {
        self.report.is_solved()
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Runs test files against learner code.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    config: RunnerConfig,
    registry: ResourceRegistry,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_registry(config, ResourceRegistry::new())
    }

    /// Share a registry with other runners (or inspect it from tests).
    pub fn with_registry(config: RunnerConfig, registry: ResourceRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Run a JavaScript test file against JavaScript learner code.
    pub fn run_tests(&self, tests_source: &str, learner_code: &str, slug: &str) -> RunOutcome {
        let _span = tracing::info_span!("run", slug).entered();

        let program = assembler::assemble(
            &self.registry,
            tests_source,
            learner_code,
            slug,
            &self.config.globals_packages,
        );
        let cleanup = Cleanup::new(self.registry.clone(), program.resources());

        let mut console = Vec::new();
        let report = match self.execute(&program, &mut console) {
            Ok(result) => {
                tracing::info!(
                    passed = result.passed,
                    failed = result.failed,
                    skipped = result.skipped,
                    complete = ?result.complete,
                    "run finished"
                );
                RunReport::Completed(result)
            }
            Err(err) => Self::failed(err),
        };

        RunOutcome {
            report,
            console,
            cleanup,
        }
    }

    /// Run an exercise of any track, transforming TypeScript sources first.
    pub fn run_exercise(
        &self,
        track: Track,
        tests_source: &str,
        learner_code: &str,
        slug: &str,
    ) -> RunOutcome {
        match track {
            Track::JavaScript => self.run_tests(tests_source, learner_code, slug),
            Track::TypeScript => {
                let transformed = typescript::transpile(tests_source).and_then(|tests| {
                    typescript::transpile(learner_code).map(|code| (tests, code))
                });
                match transformed {
                    Ok((tests, code)) => self.run_tests(&tests, &code, slug),
                    Err(err) => RunOutcome {
                        report: Self::failed(err),
                        console: Vec::new(),
                        cleanup: Cleanup::new(self.registry.clone(), Vec::new()),
                    },
                }
            }
        }
    }

    fn failed(err: Error) -> RunReport {
        tracing::info!(error = %err, "tests did not run to completion");
        RunReport::Failed(FailedRun {
            message: err.to_string(),
        })
    }

    fn execute(
        &self,
        program: &AssembledProgram,
        console: &mut Vec<ConsoleEntry>,
    ) -> Result<RunResult> {
        let loader = Rc::new(ResourceModuleLoader::new(self.registry.clone()));
        let mut context = Context::builder()
            .module_loader(loader.clone())
            .build()
            .map_err(|e| Error::Engine(e.to_string()))?;

        let limits = context.runtime_limits_mut();
        limits.set_loop_iteration_limit(self.config.loop_iteration_limit);
        limits.set_recursion_limit(self.config.recursion_limit);

        let prelude = harness::prelude(&self.config.harness_options());
        if let Err(err) = context.eval(Source::from_bytes(prelude.as_bytes())) {
            return Err(Error::Engine(describe_error(err, &mut context)));
        }

        let result = Self::evaluate(&loader, program, &mut context);
        *console = self.collect_console(&mut context);
        result
    }

    fn evaluate(
        loader: &ResourceModuleLoader,
        program: &AssembledProgram,
        context: &mut Context,
    ) -> Result<RunResult> {
        let _span = tracing::debug_span!("load", resource = %program.tests()).entered();

        let module = loader
            .load(program.tests().id(), context)
            .map_err(|e| Error::load(LoadStage::Parse, describe_error(e, context)))?;

        let promise = module.load_link_evaluate(context);
        context.run_jobs();

        match promise.state() {
            PromiseState::Fulfilled(_) => {}
            PromiseState::Rejected(reason) => {
                let message = describe_error(JsError::from_opaque(reason), context);
                return Err(Error::load(LoadStage::Evaluate, message));
            }
            PromiseState::Pending => {
                tracing::warn!("module evaluation still pending after the job queue drained");
            }
        }

        read_report(&module, context)
    }

    fn collect_console(&self, context: &mut Context) -> Vec<ConsoleEntry> {
        let script = harness::console_snapshot_script();
        let mut entries = match context.eval(Source::from_bytes(script.as_bytes())) {
            Ok(value) => value
                .as_string()
                .map(|s| s.to_std_string_escaped())
                .and_then(|json| serde_json::from_str::<Vec<ConsoleEntry>>(&json).ok())
                .unwrap_or_default(),
            Err(err) => {
                tracing::debug!(error = %err, "console capture unavailable");
                Vec::new()
            }
        };
        entries.truncate(self.config.max_console_entries);

        for entry in &entries {
            match entry.level {
                ConsoleLevel::Warn | ConsoleLevel::Error => {
                    tracing::warn!(target: CONSOLE_TARGET, level = %entry.level, "{}", entry.text)
                }
                _ => tracing::debug!(target: CONSOLE_TARGET, level = %entry.level, "{}", entry.text),
            }
        }
        entries
    }
}

/// Call the exported `__report()` and decode its JSON snapshot.
fn read_report(module: &Module, context: &mut Context) -> Result<RunResult> {
    let namespace = module.namespace(context);
    let export = namespace
        .get(JsString::from(harness::REPORT_EXPORT), context)
        .map_err(|e| Error::load(LoadStage::Report, describe_error(e, context)))?;

    let report = export.as_callable().ok_or_else(|| {
        Error::load(
            LoadStage::Report,
            format!("test program does not export {}()", harness::REPORT_EXPORT),
        )
    })?;

    let value = report
        .call(&JsValue::undefined(), &[], context)
        .map_err(|e| Error::load(LoadStage::Report, describe_error(e, context)))?;

    let json = value
        .as_string()
        .map(|s| s.to_std_string_escaped())
        .ok_or_else(|| Error::load(LoadStage::Report, "report is not a string"))?;

    Ok(serde_json::from_str(&json)?)
}

/// Run with a default [`Runner`].
pub fn run_tests(tests_source: &str, learner_code: &str, slug: &str) -> RunOutcome {
    Runner::default().run_tests(tests_source, learner_code, slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_releases_once_and_on_drop() {
        let registry = ResourceRegistry::new();
        let a = registry.create("a");
        let b = registry.create("b");

        let cleanup = Cleanup::new(registry.clone(), vec![a.clone()]);
        cleanup.release();
        cleanup.release();
        assert!(cleanup.is_released());
        assert!(!registry.is_live(&a));

        {
            let _dropped = Cleanup::new(registry.clone(), vec![b.clone()]);
        }
        assert!(!registry.is_live(&b));
    }

    #[test]
    fn test_transpile_failure_is_a_failed_run() {
        let runner = Runner::default();
        let outcome = runner.run_exercise(Track::TypeScript, "enum E {", "", "e");
        let failed = outcome.report.as_failed().unwrap();
        assert!(failed.message.starts_with("TranspileError:"));
        assert!(outcome.cleanup.resources().is_empty());
        assert_eq!(runner.registry().live(), 0);
    }
}
