//! Run reports
//!
//! The data a run hands back to its caller: either a [`RunResult`] with
//! per-test messages, or a [`FailedRun`] when the assembled program never
//! loaded. The two are told apart structurally: a run result always carries a
//! `complete` field (possibly `null`), a failed run never does.
//!
//! ```
//! use playground_runner::report::RunReport;
//!
//! let json = r#"{"passed":1,"failed":0,"skipped":0,"complete":true,"messages":[]}"#;
//! let report: RunReport = serde_json::from_str(json).unwrap();
//! assert!(report.is_solved());
//!
//! let failed: RunReport = serde_json::from_str(r#"{"message":"SyntaxError"}"#).unwrap();
//! assert!(failed.as_failed().is_some());
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TestStatus / TestMessage
// ---------------------------------------------------------------------------

/// Outcome recorded for a test that actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "passed"),
            TestStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One line of the result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestMessage {
    /// Name given to `test`/`it`.
    pub test: String,
    /// Whether the test passed.
    pub message: TestStatus,
    /// Captured error text, only present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl TestMessage {
    pub fn passed(test: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            message: TestStatus::Passed,
            details: None,
        }
    }

    pub fn failed(test: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            message: TestStatus::Failed,
            details: Some(details.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// RunResult
// ---------------------------------------------------------------------------

/// Aggregate produced by the suite harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `None` while asynchronous work is outstanding, `Some(failed == 0)` once
    /// every suite settled. Always serialized and required when decoding.
    #[serde(deserialize_with = "present_or_null")]
    pub complete: Option<bool>,
    pub messages: Vec<TestMessage>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer)
}

impl RunResult {
    /// Number of tests attempted (run or skipped).
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// The exercise counts as solved only when the run completed without failures.
    pub fn is_solved(&self) -> bool {
        self.complete == Some(true)
    }

    /// Failed messages in declaration order.
    pub fn failures(&self) -> impl Iterator<Item = &TestMessage> {
        self.messages
            .iter()
            .filter(|m| m.message == TestStatus::Failed)
    }
}

// ---------------------------------------------------------------------------
// FailedRun / RunReport
// ---------------------------------------------------------------------------

/// The assembled program could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRun {
    pub message: String,
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunReport {
    Completed(RunResult),
    Failed(FailedRun),
}

impl RunReport {
    pub fn as_completed(&self) -> Option<&RunResult> {
        match self {
            RunReport::Completed(result) => Some(result),
            RunReport::Failed(_) => None,
        }
    }

    pub fn as_failed(&self) -> Option<&FailedRun> {
        match self {
            RunReport::Completed(_) => None,
            RunReport::Failed(failed) => Some(failed),
        }
    }

    pub fn is_solved(&self) -> bool {
        self.as_completed().is_some_and(RunResult::is_solved)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<RunResult> for RunReport {
    fn from(result: RunResult) -> Self {
        RunReport::Completed(result)
    }
}

impl From<FailedRun> for RunReport {
    fn from(failed: FailedRun) -> Self {
        RunReport::Failed(failed)
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in &self.messages {
            let icon = match message.message {
                TestStatus::Passed => "✓",
                TestStatus::Failed => "✗",
            };
            writeln!(f, "  {} {}", icon, message.test)?;
            if let Some(ref details) = message.details {
                writeln!(f, "      {}", details)?;
            }
        }
        if self.skipped > 0 {
            writeln!(f, "  ○ {} skipped after a failure", self.skipped)?;
        }
        writeln!(f)?;
        write!(f, "Ran {} / {} tests", self.passed, self.total())?;
        if self.complete.is_none() {
            write!(f, " (still running)")?;
        }
        Ok(())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunReport::Completed(result) => write!(f, "{}", result),
            RunReport::Failed(failed) => {
                writeln!(f, "Tests did not run to completion")?;
                write!(f, "{}", failed.message)
            }
        }
    }
}
