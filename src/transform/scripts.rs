//! Scripts: one bundle from the entry module and its dependencies.
//!
//! ```text
//! bundle → [minify] → rename → emit
//! ```

mod bundle;
mod resolve;

pub use bundle::Bundler;

use super::minify::minify_js;
use super::{BuildContext, TaskError, TaskReport};
use crate::pipeline::{Pipeline, VirtualFile, emit, stage};
use std::path::PathBuf;

const TITLE: &str = "Scripts Error";

pub fn run(ctx: &BuildContext) -> Result<TaskReport, TaskError> {
    let scripts = &ctx.config.scripts;

    if !scripts.input.is_file() {
        return Err(TaskError::setup(format!(
            "script entry `{}` not found",
            ctx.config.root_relative(&scripts.input).display()
        )));
    }

    let bundler = Bundler::new(ctx.config.get_root(), &scripts.target, ctx.mode.as_str())
        .map_err(TaskError::setup)?;

    let entry = VirtualFile::new(scripts.input.clone(), Vec::new());
    let files = pipeline(ctx, &bundler).run(vec![entry])?;
    let outputs = emit(&files, &scripts.output)?;
    Ok(TaskReport::page(outputs))
}

/// Stage list for the current mode. Input files name entry modules.
pub fn pipeline<'a>(ctx: &'a BuildContext, bundler: &'a Bundler<'a>) -> Pipeline<'a> {
    let scripts = &ctx.config.scripts;

    Pipeline::new()
        .pipe(stage("bundle", move |files| {
            files
                .into_iter()
                .map(|mut file| {
                    let bundle = bundler
                        .bundle(&file.path)
                        .map_err(|e| TaskError::transform(TITLE, e))?;
                    file.contents = bundle.code.into_bytes();
                    Ok(file)
                })
                .collect()
        }))
        .pipe_if(
            ctx.mode.minify(),
            stage("minify", |files| files.into_iter().map(minify).collect()),
        )
        .pipe(stage("rename", move |files| {
            Ok(files
                .into_iter()
                .map(|mut file| {
                    file.path = PathBuf::from(scripts.file_name(ctx.mode));
                    file
                })
                .collect())
        }))
}

fn minify(mut file: VirtualFile) -> Result<VirtualFile, TaskError> {
    let code = minify_js(file.text()?).map_err(|e| {
        TaskError::transform(TITLE, format!("{}: {}", file.path.display(), e))
    })?;
    file.contents = code.into_bytes();
    Ok(file)
}
