//! Glob path groups.
//!
//! A `PathSet` is a list of glob patterns resolved against the project root.
//! Patterns use `/` separators, `**` for any depth and `{a,b}` alternation.
//! A leading `./` is accepted and ignored.

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use jwalk::{Parallelism, WalkDir};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// A directory under a glob base could not be listed.
#[derive(Debug, Error)]
#[error("cannot list `{}`", path.display())]
pub struct WalkError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Compiled set of glob patterns relative to a root directory.
#[derive(Debug, Clone)]
pub struct PathSet {
    root: PathBuf,
    /// Literal directory prefix of each pattern, relative to root
    bases: Vec<PathBuf>,
    matcher: GlobSet,
}

impl PathSet {
    /// Compile `patterns` relative to `root`.
    pub fn new<S: AsRef<str>>(root: &Path, patterns: &[S]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        let mut bases = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let pattern = normalize_pattern(pattern.as_ref());
            builder.add(compile(pattern)?);
            bases.push(PathBuf::from(base_dir(pattern)));
        }

        Ok(Self {
            root: root.to_path_buf(),
            bases,
            matcher: builder.build()?,
        })
    }

    /// Compile a single pattern.
    pub fn single(root: &Path, pattern: &str) -> Result<Self, globset::Error> {
        Self::new(root, &[pattern])
    }

    /// Check whether `path` (absolute, or relative to root) belongs to the set.
    pub fn is_match(&self, path: &Path) -> bool {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        self.matcher.is_match(rel)
    }

    /// Absolute directories that can contain matches, deduplicated.
    ///
    /// Used as watch roots. Directories that do not exist are included.
    pub fn base_dirs(&self) -> Vec<PathBuf> {
        let set: BTreeSet<PathBuf> = self.bases.iter().map(|b| self.root.join(b)).collect();
        set.into_iter().collect()
    }

    /// Path of `file` relative to the literal base of the first pattern
    /// it matches.
    ///
    /// `src/img/icons/a.png` matched by `src/img/**/*.png` gives `icons/a.png`.
    pub fn relative(&self, file: &Path) -> Option<PathBuf> {
        let rel = file.strip_prefix(&self.root).unwrap_or(file);
        let idx = self.matcher.matches(rel).into_iter().min()?;
        rel.strip_prefix(&self.bases[idx]).ok().map(Path::to_path_buf)
    }

    /// All existing files matching the set, sorted and deduplicated.
    ///
    /// The walk is serial: callers often run inside the rayon pool, and a
    /// parallel walk there can starve and come back empty.
    pub fn files(&self) -> Result<Vec<PathBuf>, WalkError> {
        let mut files = BTreeSet::new();

        for base in self.base_dirs() {
            if base.is_file() {
                if self.is_match(&base) {
                    files.insert(base);
                }
                continue;
            }
            if !base.is_dir() {
                continue;
            }

            let walk = WalkDir::new(&base)
                .skip_hidden(false)
                .parallelism(Parallelism::Serial);
            for entry in walk {
                let entry = entry.map_err(|e| WalkError {
                    path: base.clone(),
                    source: io::Error::other(e.to_string()),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = entry.file_name().to_str().unwrap_or_default();
                if IGNORED_FILES.contains(&name) {
                    continue;
                }
                let path = entry.path();
                if self.is_match(&path) {
                    files.insert(path);
                }
            }
        }

        Ok(files.into_iter().collect())
    }
}

fn compile(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
}

/// Strip a leading `./` (repeated) from a pattern.
pub fn normalize_pattern(pattern: &str) -> &str {
    let mut p = pattern.trim();
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p
}

fn has_meta(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Longest directory prefix of `pattern` without glob syntax.
///
/// - `src/scss/**/*.scss` -> `src/scss`
/// - `src/js/index.js` -> `src/js`
/// - `*.html` -> ``
pub fn base_dir(pattern: &str) -> String {
    let components: Vec<&str> = pattern.split('/').collect();
    let literal = match components.iter().position(|c| has_meta(c)) {
        Some(idx) => &components[..idx],
        None => &components[..components.len().saturating_sub(1)],
    };
    literal.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_base_dir() {
        assert_eq!(base_dir("src/scss/**/*.scss"), "src/scss");
        assert_eq!(base_dir("src/js/index.js"), "src/js");
        assert_eq!(base_dir("src/img/**/*.{png,jpg}"), "src/img");
        assert_eq!(base_dir("*.html"), "");
    }

    #[test]
    fn test_normalize_pattern() {
        assert_eq!(normalize_pattern("./src/js/**/*.js"), "src/js/**/*.js");
        assert_eq!(normalize_pattern("src/js"), "src/js");
    }

    #[test]
    fn test_files_respects_separator() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/templates/pages/index.html");
        touch(dir.path(), "src/templates/pages/nested/skip.html");
        touch(dir.path(), "src/templates/layout.html");

        let set = PathSet::single(dir.path(), "./src/templates/pages/*.html").unwrap();
        let files = set.files().unwrap();

        assert_eq!(files, vec![dir.path().join("src/templates/pages/index.html")]);
    }

    #[test]
    fn test_files_brace_alternation_sorted() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/img/b.jpg");
        touch(dir.path(), "src/img/a.png");
        touch(dir.path(), "src/img/deep/c.gif");
        touch(dir.path(), "src/img/notes.txt");

        let set = PathSet::single(dir.path(), "src/img/**/*.{png,jpg,jpeg,gif}").unwrap();
        let files = set.files().unwrap();

        assert_eq!(
            files,
            vec![
                dir.path().join("src/img/a.png"),
                dir.path().join("src/img/b.jpg"),
                dir.path().join("src/img/deep/c.gif"),
            ]
        );
    }

    #[test]
    fn test_literal_pattern() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/js/index.js");

        let set = PathSet::single(dir.path(), "src/js/index.js").unwrap();
        assert_eq!(set.files().unwrap(), vec![dir.path().join("src/js/index.js")]);
        assert!(set.is_match(&dir.path().join("src/js/index.js")));
        assert!(!set.is_match(&dir.path().join("src/js/other.js")));
    }

    #[test]
    fn test_relative_to_base() {
        let root = Path::new("/project");
        let set = PathSet::single(root, "src/img/**/*.png").unwrap();
        assert_eq!(
            set.relative(Path::new("/project/src/img/icons/a.png")),
            Some(PathBuf::from("icons/a.png"))
        );
        assert_eq!(set.relative(Path::new("/project/src/other/a.png")), None);
    }

    #[test]
    fn test_missing_base_is_empty() {
        let dir = TempDir::new().unwrap();
        let set = PathSet::single(dir.path(), "src/fonts/**/*").unwrap();
        assert!(set.files().unwrap().is_empty());
        assert_eq!(set.base_dirs(), vec![dir.path().join("src/fonts")]);
    }

    #[test]
    fn test_files_inside_busy_pool() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/fonts/a.woff2");
        touch(dir.path(), "src/img/deep/b.png");
        let fonts = PathSet::single(dir.path(), "src/fonts/**/*").unwrap();
        let images = PathSet::single(dir.path(), "src/img/**/*.png").unwrap();

        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let (a, b) = pool.install(|| rayon::join(|| fonts.files(), || images.files()));

        assert_eq!(a.unwrap(), vec![dir.path().join("src/fonts/a.woff2")]);
        assert_eq!(b.unwrap(), vec![dir.path().join("src/img/deep/b.png")]);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(PathSet::single(Path::new("/"), "src/{a,b").is_err());
    }
}
