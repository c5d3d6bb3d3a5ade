//! Static copy: fonts and raster images.
//!
//! The two groups are copied concurrently and both are awaited; the task
//! fails if either does. Files keep their path relative to the glob base.

use super::{BuildContext, TaskError, TaskReport};
use crate::cache::{ContentHash, ImageCache};
use crate::image::{Encoding, optimize};
use crate::utils::fs::{copy_atomic, write_atomic};
use crate::utils::glob::PathSet;
use crate::utils::plural_count;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

pub fn run(ctx: &BuildContext) -> Result<TaskReport, TaskError> {
    let config = &ctx.config;
    let fonts = &config.static_files.fonts;
    let images = &config.static_files.images;

    let font_set = config.path_set("static.fonts.input", &fonts.input)?;
    let image_set = config.path_set("static.images.input", &images.input)?;

    let optimizer = images
        .optimize
        .then(|| Optimizer::new(&config.build.cache, images.jpeg_quality));

    // Listed up front so the walks never compete with the copies for the pool
    let font_files = font_set.files()?;
    let image_files = image_set.files()?;

    let (fonts_result, images_result) = rayon::join(
        || copy_group(&font_set, &font_files, &fonts.output, None),
        || copy_group(&image_set, &image_files, &images.output, optimizer.as_ref()),
    );

    let mut outputs = fonts_result?;
    let copied_fonts = outputs.len();
    outputs.extend(images_result?);

    crate::debug!(
        "static";
        "{}, {}",
        plural_count(copied_fonts, "font"),
        plural_count(outputs.len() - copied_fonts, "image")
    );
    Ok(TaskReport::page(outputs))
}

/// Image optimization settings plus its cache.
struct Optimizer {
    cache: ImageCache,
    jpeg_quality: u8,
}

impl Optimizer {
    fn new(cache_dir: &Path, jpeg_quality: u8) -> Self {
        Self {
            cache: ImageCache::new(cache_dir),
            jpeg_quality,
        }
    }

    /// Write `src` to `dest`, optimized when the format allows it.
    fn process(&self, src: &Path, dest: &Path) -> Result<(), TaskError> {
        let Some(encoding) = Encoding::for_path(src, self.jpeg_quality) else {
            return copy_atomic(src, dest).map_err(TaskError::io(dest));
        };

        let bytes = fs::read(src).map_err(TaskError::io(src))?;
        let key = ContentHash::of(&bytes, &encoding.tag());

        let optimized = match self.cache.get(key) {
            Some(hit) => hit,
            None => {
                let out = optimize(&bytes, encoding).unwrap_or_else(|e| {
                    crate::log!("warning"; "cannot optimize {}: {}", src.display(), e);
                    bytes.clone()
                });
                if let Err(e) = self.cache.put(key, &out) {
                    crate::debug!("static"; "image cache write failed: {}", e);
                }
                out
            }
        };

        write_atomic(dest, &optimized).map_err(TaskError::io(dest))
    }
}

fn copy_group(
    set: &PathSet,
    files: &[PathBuf],
    out_dir: &Path,
    optimizer: Option<&Optimizer>,
) -> Result<Vec<PathBuf>, TaskError> {
    files
        .par_iter()
        .map(|src| {
            let rel = set
                .relative(src)
                .or_else(|| src.file_name().map(PathBuf::from))
                .unwrap_or_default();
            let dest = out_dir.join(rel);
            match optimizer {
                Some(opt) => opt.process(src, &dest)?,
                None => copy_atomic(src, &dest).map_err(TaskError::io(&dest))?,
            }
            Ok(dest)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildMode;
    use crate::transform::fixture::Project;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    #[test]
    fn test_copies_both_groups_preserving_paths() {
        let p = Project::new();
        p.write("src/fonts/Roboto/roboto.woff2", "font")
            .write("src/img/logo.png", "png")
            .write("src/img/photos/a.jpg", "jpg")
            .write("src/img/svg/icon.svg", "<svg/>");

        let report = run(&p.ctx("", BuildMode::Production)).unwrap();

        assert_eq!(p.read("dist/fonts/Roboto/roboto.woff2"), "font");
        assert_eq!(p.read("dist/img/logo.png"), "png");
        assert_eq!(p.read("dist/img/photos/a.jpg"), "jpg");
        assert!(!p.exists("dist/img/svg/icon.svg"));
        assert_eq!(report.outputs.len(), 3);
    }

    #[test]
    fn test_copies_on_single_thread_pool() {
        let p = Project::new();
        p.write("src/fonts/roboto.woff2", "font")
            .write("src/img/logo.png", "png");
        let ctx = p.ctx("", BuildMode::Production);

        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let report = pool.install(|| run(&ctx)).unwrap();

        assert_eq!(p.read("dist/fonts/roboto.woff2"), "font");
        assert_eq!(p.read("dist/img/logo.png"), "png");
        assert_eq!(report.outputs.len(), 2);
    }

    #[test]
    fn test_empty_groups_ok() {
        let p = Project::new();
        let report = run(&p.ctx("", BuildMode::Production)).unwrap();
        assert!(report.outputs.is_empty());
    }

    #[test]
    fn test_optimize_uses_cache() {
        let p = Project::new();
        let img = RgbImage::from_fn(32, 32, |x, _| Rgb([(x * 8) as u8, 0, 0]));
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png).unwrap();
        let png = png.into_inner();

        let path = p.root().join("src/img/red.png");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, &png).unwrap();

        let ctx = p.ctx("[static.images]\noptimize = true", BuildMode::Production);
        run(&ctx).unwrap();

        let out = fs::read(p.root().join("dist/img/red.png")).unwrap();
        assert!(out.len() <= png.len());

        let key = ContentHash::of(&png, &Encoding::Png.tag());
        assert!(p.exists(&format!(".kiln/cache/images/{}", key.to_hex())));
    }

    #[test]
    fn test_unoptimizable_file_is_copied() {
        let p = Project::new();
        p.write("src/img/broken.png", "not really a png");

        let ctx = p.ctx("[static.images]\noptimize = true", BuildMode::Production);
        run(&ctx).unwrap();

        assert_eq!(p.read("dist/img/broken.png"), "not really a png");
    }
}
