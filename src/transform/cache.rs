//! Clear cache: remove the on-disk cache directory.

use super::{BuildContext, TaskError, TaskReport};
use crate::utils::fs::remove_dir_if_exists;

pub fn run(ctx: &BuildContext) -> Result<TaskReport, TaskError> {
    let dir = &ctx.config.build.cache;
    let removed = remove_dir_if_exists(dir).map_err(TaskError::io(dir))?;
    if removed {
        crate::debug!("clear-cache"; "removed {}", ctx.config.root_relative(dir).display());
    }
    Ok(TaskReport::silent(if removed {
        vec![dir.clone()]
    } else {
        Vec::new()
    }))
}
