//! In-memory transform pipeline.
//!
//! A transformer describes its work as an ordered list of named stages over
//! a stream of [`VirtualFile`]s. Nothing touches the disk until [`emit`],
//! which is only reached when every stage succeeded.
//!
//! ```ignore
//! let files = Pipeline::new()
//!     .pipe(stage("parse", parse))
//!     .pipe_if(mode.minify(), stage("minify", minify))
//!     .run(sources)?;
//! emit(&files, &out_dir)?;
//! ```

use crate::transform::TaskError;
use crate::utils::fs::write_atomic;
use std::path::{Path, PathBuf};

/// A file in flight through a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualFile {
    /// Output path, relative to the destination directory
    pub path: PathBuf,
    pub contents: Vec<u8>,
    /// Sources concatenated into this file, for source maps
    pub origins: Vec<Origin>,
}

/// A source segment of a concatenated file.
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub source: PathBuf,
    pub contents: String,
    /// Zero-based line where the segment starts in the combined file
    pub first_line: u32,
}

impl VirtualFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            origins: Vec::new(),
        }
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> Result<&str, TaskError> {
        std::str::from_utf8(&self.contents).map_err(|_| {
            TaskError::setup(format!("`{}` is not valid UTF-8", self.path.display()))
        })
    }
}

/// One named step of a pipeline.
pub trait Stage {
    fn name(&self) -> &'static str;
    fn apply(&self, files: Vec<VirtualFile>) -> Result<Vec<VirtualFile>, TaskError>;
}

/// Stage backed by a closure.
pub struct FnStage<F> {
    name: &'static str,
    f: F,
}

/// Create a stage from a closure.
pub fn stage<F>(name: &'static str, f: F) -> FnStage<F>
where
    F: Fn(Vec<VirtualFile>) -> Result<Vec<VirtualFile>, TaskError>,
{
    FnStage { name, f }
}

impl<F> Stage for FnStage<F>
where
    F: Fn(Vec<VirtualFile>) -> Result<Vec<VirtualFile>, TaskError>,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, files: Vec<VirtualFile>) -> Result<Vec<VirtualFile>, TaskError> {
        (self.f)(files)
    }
}

/// Ordered list of stages.
#[derive(Default)]
pub struct Pipeline<'a> {
    stages: Vec<Box<dyn Stage + 'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn pipe(mut self, stage: impl Stage + 'a) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Append `stage` only when `enabled`.
    pub fn pipe_if(self, enabled: bool, stage: impl Stage + 'a) -> Self {
        if enabled { self.pipe(stage) } else { self }
    }

    /// Stage names in execution order.
    pub fn stages(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run(&self, mut files: Vec<VirtualFile>) -> Result<Vec<VirtualFile>, TaskError> {
        for stage in &self.stages {
            files = stage.apply(files)?;
            crate::debug!("pipeline"; "{} -> {} file(s)", stage.name(), files.len());
        }
        Ok(files)
    }
}

/// Write every file under `out_dir`, each one atomically.
pub fn emit(files: &[VirtualFile], out_dir: &Path) -> Result<Vec<PathBuf>, TaskError> {
    files
        .iter()
        .map(|file| {
            let dest = out_dir.join(&file.path);
            write_atomic(&dest, &file.contents).map_err(TaskError::io(&dest))?;
            Ok(dest)
        })
        .collect()
}
