//! Exercise content
//!
//! An [`Exercise`] bundles the stub the learner starts from, the test file and
//! the optional documents shown beside the editor. Content comes from an
//! [`ExerciseSource`]; [`DirectorySource`] reads a local checkout laid out like
//! the exercise repositories:
//!
//! ```text
//! <root>/<slug>/<slug>.js           stub
//! <root>/<slug>/<slug>.spec.js      tests
//! <root>/<slug>/.docs/*.md          introduction, instructions, hints, after
//! <root>/<slug>/global.d.ts         ambient types (TypeScript track)
//! ```
//!
//! `concept/` and `practice/` subdirectories of the root are searched too.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

/// Language track an exercise belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Track {
    #[default]
    JavaScript,
    TypeScript,
}

impl Track {
    /// Extension of the stub and solution file.
    pub fn source_ext(self) -> &'static str {
        match self {
            Track::JavaScript => "js",
            Track::TypeScript => "ts",
        }
    }

    /// Extension of the test file.
    pub fn tests_ext(self) -> &'static str {
        match self {
            Track::JavaScript => "spec.js",
            Track::TypeScript => "test.ts",
        }
    }

    /// Guess the track from a file name (`*.ts` is TypeScript).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") | Some("mts") => Track::TypeScript,
            _ => Track::JavaScript,
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::JavaScript => write!(f, "javascript"),
            Track::TypeScript => write!(f, "typescript"),
        }
    }
}

impl FromStr for Track {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Track::JavaScript),
            "typescript" | "ts" => Ok(Track::TypeScript),
            other => Err(Error::Exercise(format!("unsupported track '{}'", other))),
        }
    }
}

// ---------------------------------------------------------------------------
// Exercise
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub slug: String,
    pub track: Track,
    /// Starting code for the learner.
    pub stub: String,
    /// The exercise's test file.
    pub tests: String,
    pub introduction: Option<String>,
    pub instructions: Option<String>,
    pub hints: Option<String>,
    /// Shown once the exercise is solved.
    pub after: Option<String>,
    /// Ambient declarations (`global.d.ts`).
    pub types: Option<String>,
}

/// Where exercise content comes from.
pub trait ExerciseSource {
    fn fetch(&self, track: Track, slug: &str) -> Result<Exercise>;
}

// ---------------------------------------------------------------------------
// DirectorySource
// ---------------------------------------------------------------------------

/// Reads exercises from a directory tree.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn exercise_dir(&self, slug: &str) -> Result<PathBuf> {
        if slug.is_empty() || slug.contains(['/', '\\']) || slug == ".." {
            return Err(Error::Exercise(format!("invalid exercise slug '{}'", slug)));
        }
        ["", "concept", "practice"]
            .iter()
            .map(|kind| self.root.join(kind).join(slug))
            .find(|dir| dir.is_dir())
            .ok_or_else(|| {
                Error::Exercise(format!(
                    "exercise '{}' not found under {}",
                    slug,
                    self.root.display()
                ))
            })
    }
}

impl ExerciseSource for DirectorySource {
    fn fetch(&self, track: Track, slug: &str) -> Result<Exercise> {
        let dir = self.exercise_dir(slug)?;
        tracing::debug!(dir = %dir.display(), %track, "reading exercise");

        let required = |name: String| -> Result<String> {
            let path = dir.join(&name);
            std::fs::read_to_string(&path)
                .map_err(|e| Error::Exercise(format!("{}: {}", path.display(), e)))
        };
        let docs = dir.join(".docs");

        Ok(Exercise {
            slug: slug.to_string(),
            track,
            stub: required(format!("{}.{}", slug, track.source_ext()))?,
            tests: required(format!("{}.{}", slug, track.tests_ext()))?,
            introduction: read_optional(&docs.join("introduction.md"))?,
            instructions: read_optional(&docs.join("instructions.md"))?,
            hints: read_optional(&docs.join("hints.md"))?,
            after: read_optional(&docs.join("after.md"))?,
            types: read_optional(&dir.join("global.d.ts"))?,
        })
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_exercise(root: &Path, sub: &str, slug: &str) {
        let dir = root.join(sub).join(slug);
        fs::create_dir_all(dir.join(".docs")).unwrap();
        fs::write(dir.join(format!("{}.js", slug)), "export const f = () => {};").unwrap();
        fs::write(dir.join(format!("{}.spec.js", slug)), "test('f', () => {});").unwrap();
        fs::write(dir.join(".docs/hints.md"), "# Hints").unwrap();
    }

    #[test]
    fn test_track_extensions() {
        assert_eq!(Track::JavaScript.tests_ext(), "spec.js");
        assert_eq!(Track::TypeScript.source_ext(), "ts");
        assert_eq!("TS".parse::<Track>().unwrap(), Track::TypeScript);
        assert!("python".parse::<Track>().is_err());
        assert_eq!(Track::from_path(Path::new("a/b.test.ts")), Track::TypeScript);
    }

    #[test]
    fn test_directory_source_reads_files_and_docs() {
        let root = tempfile::tempdir().unwrap();
        write_exercise(root.path(), "", "lasagna");

        let exercise = DirectorySource::new(root.path())
            .fetch(Track::JavaScript, "lasagna")
            .unwrap();
        assert_eq!(exercise.stub, "export const f = () => {};");
        assert_eq!(exercise.hints.as_deref(), Some("# Hints"));
        assert!(exercise.introduction.is_none());
        assert!(exercise.types.is_none());
    }

    #[test]
    fn test_directory_source_searches_kind_dirs() {
        let root = tempfile::tempdir().unwrap();
        write_exercise(root.path(), "concept", "lasagna");
        assert!(DirectorySource::new(root.path())
            .fetch(Track::JavaScript, "lasagna")
            .is_ok());
    }

    #[test]
    fn test_missing_exercise_and_bad_slug() {
        let root = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(root.path());
        let err = source.fetch(Track::JavaScript, "nope").unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(source.fetch(Track::JavaScript, "../etc").is_err());
    }

    #[test]
    fn test_missing_test_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        write_exercise(root.path(), "", "lasagna");
        assert!(DirectorySource::new(root.path())
            .fetch(Track::TypeScript, "lasagna")
            .is_err());
    }
}
