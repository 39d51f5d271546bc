//! Program assembly
//!
//! Turns the raw test file and the learner's code into two loadable resources:
//! the learner module, and the test program rewritten to import the learner
//! module by its resource identity, with the harness source spliced in right
//! after the leading import block.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

use crate::harness;
use crate::loader::{Resource, ResourceRegistry};

/// Marker prefixed to import lines of packages the harness stands in for.
const NEUTRALIZED: &str = "// [playground] provided by harness: ";

fn import_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*import(\s|\{|\*|['"])"#).expect("valid regex"))
}

fn import_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(^|[\s}*])from\s*['"][^'"]*['"]|^\s*import\s*['"][^'"]*['"]"#)
            .expect("valid regex")
    })
}

// ---------------------------------------------------------------------------
// AssembledProgram
// ---------------------------------------------------------------------------

/// The two resources of one run plus the assembled test text.
#[derive(Debug, Clone)]
pub struct AssembledProgram {
    tests: Resource,
    learner: Resource,
    text: String,
}

impl AssembledProgram {
    /// Resource holding the rewritten test program (the module that gets loaded).
    pub fn tests(&self) -> &Resource {
        &self.tests
    }

    /// Resource holding the learner's code.
    pub fn learner(&self) -> &Resource {
        &self.learner
    }

    /// The rewritten test program.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Both resources, for cleanup.
    pub fn resources(&self) -> Vec<Resource> {
        vec![self.tests.clone(), self.learner.clone()]
    }
}

/// Register `learner_code` and the rewritten `tests_source` in `registry`.
pub fn assemble(
    registry: &ResourceRegistry,
    tests_source: &str,
    learner_code: &str,
    slug: &str,
    globals_packages: &[String],
) -> AssembledProgram {
    let _span = tracing::debug_span!("assemble", slug).entered();

    let learner = registry.create(learner_code);
    let text = rewrite_tests(tests_source, slug, learner.id(), globals_packages);
    let tests = registry.create(text.clone());

    tracing::debug!(tests = %tests, learner = %learner, "assembled program");
    AssembledProgram {
        tests,
        learner,
        text,
    }
}

/// Rewrite a test file so it imports `learner_id` and carries the harness.
pub fn rewrite_tests(
    tests_source: &str,
    slug: &str,
    learner_id: &str,
    globals_packages: &[String],
) -> String {
    let source = rewrite_learner_import(tests_source, slug, learner_id);
    let mut lines: Vec<String> = source.split('\n').map(str::to_string).collect();

    let statements = scan_import_block(&lines);
    for range in &statements {
        let statement = lines[range.clone()].join("\n");
        if imports_any(&statement, globals_packages) {
            for line in &mut lines[range.clone()] {
                *line = format!("{}{}", NEUTRALIZED, line);
            }
        }
    }

    let splice = splice_line(&statements);
    let harness = harness::source();

    let mut out = String::with_capacity(source.len() + harness.len() + 2);
    for line in &lines[..splice] {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&harness);
    out.push('\n');
    out.push_str(&lines[splice..].join("\n"));
    out
}

/// Replace the first `'./<slug>'` and the first `"./<slug>"`.
fn rewrite_learner_import(source: &str, slug: &str, learner_id: &str) -> String {
    let replacement = format!("'{}'", learner_id);
    let mut text = source.to_string();
    for quote in ['\'', '"'] {
        let specifier = format!("{q}./{slug}{q}", q = quote, slug = slug);
        text = text.replacen(&specifier, &replacement, 1);
    }
    text
}

fn imports_any(statement: &str, packages: &[String]) -> bool {
    packages.iter().any(|package| {
        statement.contains(&format!("'{}'", package)) || statement.contains(&format!("\"{}\"", package))
    })
}

/// Line ranges of the import statements at the head of the file.
///
/// Blank lines, comments, a shebang and directive prologues may precede or
/// separate them; any other line ends the block.
fn scan_import_block<S: AsRef<str>>(lines: &[S]) -> Vec<Range<usize>> {
    let mut statements = Vec::new();
    let mut in_comment = false;
    let mut i = 0;

    while i < lines.len() {
        let raw = lines[i].as_ref();
        let line = raw.trim();

        if in_comment {
            in_comment = !line.contains("*/");
            i += 1;
            continue;
        }
        if line.is_empty() || line.starts_with("//") || line.starts_with("#!") || is_directive(line) {
            i += 1;
            continue;
        }
        if line.starts_with("/*") {
            in_comment = !line.contains("*/");
            i += 1;
            continue;
        }
        if !import_start().is_match(raw) {
            break;
        }

        let start = i;
        let end = (i..lines.len()).find(|&j| import_end().is_match(lines[j].as_ref()));
        match end {
            Some(end) => {
                statements.push(start..end + 1);
                i = end + 1;
            }
            None => break,
        }
    }

    statements
}

fn is_directive(line: &str) -> bool {
    let line = line.trim_end_matches(';');
    line == "'use strict'" || line == "\"use strict\""
}

/// Index of the line the harness goes in front of; `0` without imports.
fn splice_line(statements: &[Range<usize>]) -> usize {
    statements.last().map(|range| range.end).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ID: &str = "blob:playground/0000abcd-1";

    fn globals() -> Vec<String> {
        vec!["@jest/globals".to_string()]
    }

    fn harness_line(text: &str) -> usize {
        text.lines()
            .position(|l| l.starts_with("// playground harness"))
            .unwrap()
    }

    #[test]
    fn test_rewrites_single_and_double_quoted_specifier_once() {
        let source = "import { a } from './two-fer';\nimport { b } from \"./two-fer\";\nconst s = './two-fer';";
        let text = rewrite_learner_import(source, "two-fer", ID);
        assert_eq!(
            text,
            format!(
                "import {{ a }} from '{id}';\nimport {{ b }} from '{id}';\nconst s = './two-fer';",
                id = ID
            )
        );
    }

    #[test]
    fn test_specifier_must_match_exactly() {
        let source = "import { a } from './two-fer.js';";
        assert_eq!(rewrite_learner_import(source, "two-fer", ID), source);
    }

    #[test]
    fn test_harness_follows_import_block() {
        let source = "import { square } from './square';\n\ntest('x', () => {});";
        let text = rewrite_tests(source, "square", ID, &globals());
        assert_eq!(harness_line(&text), 1);
        assert!(text.starts_with(&format!("import {{ square }} from '{}';\n", ID)));
        assert!(text.ends_with("\ntest('x', () => {});"));
    }

    #[test]
    fn test_multiline_imports_and_comments() {
        let source = "/**\n * header\n */\nimport {\n  a,\n  b,\n} from './lib';\n// note\nimport './side-effect';\nconst x = 1;";
        let lines: Vec<&str> = source.split('\n').collect();
        let statements = scan_import_block(&lines);
        assert_eq!(statements, vec![3..7, 8..9]);
        assert_eq!(splice_line(&statements), 9);
    }

    #[test]
    fn test_no_imports_splices_at_start() {
        let text = rewrite_tests("test('x', () => {});", "x", ID, &globals());
        assert_eq!(harness_line(&text), 0);
        assert!(text.ends_with("test('x', () => {});"));
    }

    #[test]
    fn test_code_before_imports_ends_block() {
        let lines = ["const a = 1;", "import { b } from './b';"];
        assert!(scan_import_block(&lines).is_empty());
    }

    #[test]
    fn test_globals_package_is_neutralized() {
        let source = "import {\n  describe,\n  expect,\n} from '@jest/globals';\nimport { f } from './f';";
        let text = rewrite_tests(source, "f", ID, &globals());
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[..4].iter().all(|l| l.starts_with(NEUTRALIZED)));
        assert_eq!(lines[4], format!("import {{ f }} from '{}';", ID));
        assert_eq!(harness_line(&text), 5);
    }

    #[test]
    fn test_globals_left_alone_when_not_configured() {
        let source = "import { expect } from '@jest/globals';";
        let text = rewrite_tests(source, "f", ID, &[]);
        assert!(text.starts_with("import { expect } from '@jest/globals';\n"));
    }

    #[test]
    fn test_assemble_registers_learner_first() {
        let registry = ResourceRegistry::new();
        let program = assemble(
            &registry,
            "import { f } from './f';",
            "export const f = 1;",
            "f",
            &[],
        );
        assert_eq!(registry.live(), 2);
        assert!(program.text().contains(program.learner().id()));
        assert_eq!(
            registry.resolve(program.tests().id()).as_deref(),
            Some(program.text())
        );
        assert!(program.learner().id().ends_with("-1"));
    }
}
