//! `INCLUDE` expansion.
//!
//! `INCLUDE 'path'` may appear anywhere in a deck, starting in column 1.
//! Relative paths resolve against the directory of the including file. A
//! quoted path may continue on the following lines.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use bdf_inp::{InpError, LineSource};
use tracing::debug;

use crate::error::{IoError, Result};

/// Deck lines with every `INCLUDE` statement replaced by the lines of the
/// file it names.
#[derive(Debug, Clone, Default)]
pub struct IncludeLines {
    lines: VecDeque<String>,
    files: Vec<PathBuf>,
}

impl IncludeLines {
    /// Read `path` and the files it includes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut expander = Expander::default();
        expander.expand_file(path.as_ref())?;
        Ok(expander.finish())
    }

    /// Expand the includes of in-memory text, resolving relative paths
    /// against `base_dir`.
    pub fn from_text(text: &str, base_dir: impl AsRef<Path>) -> Result<Self> {
        let mut expander = Expander::default();
        expander.expand_text(text, base_dir.as_ref())?;
        Ok(expander.finish())
    }

    /// Files read, in the order they were opened.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Lines not yet consumed.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl LineSource for IncludeLines {
    fn next_line(&mut self) -> std::result::Result<Option<String>, InpError> {
        Ok(self.lines.pop_front())
    }
}

#[derive(Default)]
struct Expander {
    include_stack: Vec<PathBuf>,
    active: HashSet<PathBuf>,
    lines: VecDeque<String>,
    files: Vec<PathBuf>,
}

impl Expander {
    fn finish(self) -> IncludeLines {
        IncludeLines {
            lines: self.lines,
            files: self.files,
        }
    }

    fn expand_file(&mut self, path: &Path) -> Result<()> {
        let normalized_path = normalize_path(path);
        if self.active.contains(&normalized_path) {
            let mut chain = self
                .include_stack
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>();
            chain.push(normalized_path.display().to_string());
            return Err(IoError::include(
                path,
                format!("include cycle detected: {}", chain.join(" -> ")),
            ));
        }

        let raw = fs::read_to_string(path)
            .map_err(|e| IoError::include(path, format!("failed to read: {e}")))?;
        debug!(path = %path.display(), depth = self.include_stack.len(), "reading deck file");

        self.include_stack.push(normalized_path.clone());
        self.active.insert(normalized_path);
        self.files.push(path.to_path_buf());

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let result = self.expand_text(&raw, base_dir);

        if let Some(done) = self.include_stack.pop() {
            self.active.remove(&done);
        }
        result
    }

    fn expand_text(&mut self, text: &str, base_dir: &Path) -> Result<()> {
        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            let Some(rest) = include_argument(line) else {
                self.lines.push_back(line.to_string());
                continue;
            };
            let mut argument = rest.to_string();
            while argument.matches('\'').count() == 1 {
                match lines.next() {
                    Some(next) => argument.push_str(next.trim()),
                    None => break,
                }
            }
            let target = parse_include_path(&argument).ok_or_else(|| {
                IoError::include(base_dir, format!("malformed INCLUDE statement {line:?}"))
            })?;
            let include_path = resolve_include_path(base_dir, &target);
            self.expand_file(&include_path)?;
        }
        Ok(())
    }
}

/// Text after the `INCLUDE` keyword, when `line` is an include statement.
fn include_argument(line: &str) -> Option<&str> {
    let head = line.get(..7)?;
    if !head.eq_ignore_ascii_case("INCLUDE") {
        return None;
    }
    let rest = &line[7..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '\'' => Some(rest.trim()),
        Some(_) => None,
    }
}

fn parse_include_path(argument: &str) -> Option<String> {
    let argument = argument.trim();
    let path = match argument.strip_prefix('\'') {
        Some(quoted) => quoted.split('\'').next()?,
        None => argument.split_whitespace().next()?,
    };
    let path = path.trim();
    (!path.is_empty()).then(|| path.to_string())
}

fn resolve_include_path(base_dir: &Path, include: &str) -> PathBuf {
    let raw_path = Path::new(include);
    let joined = if raw_path.is_absolute() {
        raw_path.to_path_buf()
    } else {
        base_dir.join(raw_path)
    };
    normalize_path(&joined)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
