//! Clean: remove every output directory.

use super::{BuildContext, TaskError, TaskReport};
use crate::config::KilnConfig;
use crate::utils::fs::remove_dir_if_exists;
use std::path::{Path, PathBuf};

pub fn run(ctx: &BuildContext) -> Result<TaskReport, TaskError> {
    let targets = targets(&ctx.config)?;

    let mut removed = Vec::new();
    for dir in targets {
        if remove_dir_if_exists(&dir).map_err(TaskError::io(&dir))? {
            crate::debug!("clean"; "removed {}", ctx.config.root_relative(&dir).display());
            removed.push(dir);
        }
    }
    Ok(TaskReport::silent(removed))
}

/// Output directories to remove, outermost first, nested ones dropped.
///
/// Fails if any of them is the project root, contains it, or contains a
/// source directory.
pub fn targets(config: &KilnConfig) -> Result<Vec<PathBuf>, TaskError> {
    let sources = source_dirs(config)?;

    let mut dirs: Vec<(&str, &Path)> = config.output_dirs();
    for (field, dir) in &dirs {
        if config.root.starts_with(dir) {
            return Err(TaskError::setup(format!(
                "refusing to clean [{field}] `{}`: it contains the project root",
                dir.display()
            )));
        }
        if let Some(src) = sources.iter().find(|src| src.starts_with(dir)) {
            return Err(TaskError::setup(format!(
                "refusing to clean [{field}] `{}`: it contains sources in `{}`",
                dir.display(),
                config.root_relative(src).display()
            )));
        }
    }

    dirs.sort_by_key(|(_, dir)| dir.components().count());
    let mut out: Vec<PathBuf> = Vec::with_capacity(dirs.len());
    for (_, dir) in dirs {
        if !out.iter().any(|kept| dir.starts_with(kept)) {
            out.push(dir.to_path_buf());
        }
    }
    Ok(out)
}

/// Literal base directory of every source glob, plus the entry script's
/// directory and the grid helper directory.
fn source_dirs(config: &KilnConfig) -> Result<Vec<PathBuf>, TaskError> {
    let mut dirs = Vec::new();
    for (field, patterns) in config.glob_fields() {
        for base in config.path_set(field, patterns)?.base_dirs() {
            if base != config.root {
                dirs.push(base);
            }
        }
    }
    if let Some(dir) = config.scripts.input.parent() {
        dirs.push(dir.to_path_buf());
    }
    dirs.push(config.grid.path.clone());
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildMode;
    use crate::transform::fixture::Project;

    #[test]
    fn test_clean_removes_every_output() {
        let p = Project::new();
        p.write("dist/index.html", "")
            .write("dist/css/bundle.min.css", "")
            .write("public/js/bundle.min.js", "")
            .write("src/js/index.js", "");

        let ctx = p.ctx("[scripts]\noutput = \"public/js\"", BuildMode::Production);
        let report = run(&ctx).unwrap();

        assert!(!p.exists("dist"));
        assert!(!p.exists("public/js"));
        assert!(p.exists("src/js/index.js"));
        assert_eq!(report.outputs.len(), 2);
    }

    #[test]
    fn test_clean_missing_outputs_ok() {
        let p = Project::new();
        let report = run(&p.ctx("", BuildMode::Production)).unwrap();
        assert!(report.outputs.is_empty());
    }

    #[test]
    fn test_targets_drop_nested() {
        let p = Project::new();
        let ctx = p.ctx("", BuildMode::Production);
        let dirs = targets(&ctx.config).unwrap();
        assert_eq!(dirs, vec![p.root().join("dist")]);
    }

    #[test]
    fn test_refuses_root() {
        let p = Project::new();
        let ctx = p.ctx("[markup]\noutput = \".\"", BuildMode::Production);
        let err = run(&ctx).unwrap_err();
        assert!(matches!(err, TaskError::Setup { .. }));
    }

    #[test]
    fn test_refuses_source_dir() {
        let p = Project::new();
        p.write("src/scss/style.scss", "");
        let ctx = p.ctx("[styles]\noutput = \"src\"", BuildMode::Production);

        let err = run(&ctx).unwrap_err();
        assert!(err.to_string().contains("styles.output"));
        assert!(p.exists("src/scss/style.scss"));
    }
}
