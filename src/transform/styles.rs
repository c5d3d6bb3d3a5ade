//! Styles: Sass entries to one prefixed CSS bundle.
//!
//! ```text
//! parse → prefix → concatenate → [minify] → rename → [sourcemap] → emit
//! ```
//!
//! `minify` runs in production only, `sourcemap` in development only.

use super::minify::minify_css;
use super::{BuildContext, Reload, TaskError, TaskReport};
use crate::pipeline::{Origin, Pipeline, VirtualFile, emit, stage};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::{OriginalLocation, SourceMap};
use std::fs;
use std::path::{Path, PathBuf};

const TITLE: &str = "Styles Error";

pub fn run(ctx: &BuildContext) -> Result<TaskReport, TaskError> {
    let config = &ctx.config;
    let styles = &config.styles;

    let entries = config.path_set("styles.input", &styles.input)?.files()?;
    if entries.is_empty() {
        return Err(TaskError::setup(format!(
            "no stylesheet matched {:?}",
            styles.input
        )));
    }

    let targets = browser_targets(&config.build.browsers)?;
    let sources = entries
        .iter()
        .map(|path| {
            let contents = fs::read(path).map_err(TaskError::io(path))?;
            Ok(VirtualFile::new(path.clone(), contents))
        })
        .collect::<Result<Vec<_>, TaskError>>()?;

    let files = pipeline(ctx, targets).run(sources)?;
    let outputs = emit(&files, &styles.output)?;

    Ok(TaskReport {
        outputs,
        reload: css_reload(ctx),
    })
}

/// Stage list for the current mode.
pub fn pipeline(ctx: &BuildContext, targets: Targets) -> Pipeline<'_> {
    let config = &ctx.config;
    let styles = &config.styles;

    Pipeline::new()
        .pipe(stage("parse", move |files| {
            files
                .into_iter()
                .map(|f| compile_sass(f, &styles.load_paths, config.get_root()))
                .collect()
        }))
        .pipe(stage("prefix", move |files| {
            files.into_iter().map(|f| prefix(f, targets)).collect()
        }))
        .pipe(stage("concatenate", move |files| {
            Ok(vec![concatenate(files, &styles.bundle)])
        }))
        .pipe_if(
            ctx.mode.minify(),
            stage("minify", move |files| {
                files
                    .into_iter()
                    .map(|mut f| {
                        let css = minify_css(f.text()?, targets)
                            .map_err(|e| TaskError::transform(TITLE, e))?;
                        f.contents = css.into_bytes();
                        f.origins.clear();
                        Ok(f)
                    })
                    .collect()
            }),
        )
        .pipe(stage("rename", move |files| {
            Ok(files
                .into_iter()
                .map(|mut f| {
                    f.path = PathBuf::from(styles.file_name());
                    f
                })
                .collect())
        }))
        .pipe_if(
            ctx.mode.is_dev(),
            stage("sourcemap", |files| {
                files.into_iter().map(append_source_map).collect()
            }),
        )
}

/// Build lightningcss targets from browserslist queries.
pub fn browser_targets(queries: &[String]) -> Result<Targets, TaskError> {
    if queries.is_empty() {
        return Ok(Targets::default());
    }
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| TaskError::setup(format!("invalid [build] browsers: {e}")))?;
    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Served path of the bundle, for the live-reload `css` message.
///
/// Falls back to a page reload if the bundle is outside the served root.
fn css_reload(ctx: &BuildContext) -> Reload {
    let config = &ctx.config;
    let file = config.styles.output.join(config.styles.file_name());
    match file.strip_prefix(&config.build.output) {
        Ok(rel) => Reload::Css {
            href: rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        },
        Err(_) => Reload::Page,
    }
}

fn compile_sass(
    file: VirtualFile,
    load_paths: &[PathBuf],
    root: &Path,
) -> Result<VirtualFile, TaskError> {
    let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
    if let Some(dir) = file.path.parent() {
        options = options.load_path(dir);
    }
    for path in load_paths {
        options = options.load_path(path);
    }

    let display = file
        .path
        .strip_prefix(root)
        .unwrap_or(&file.path)
        .to_path_buf();
    let css = grass::from_string(file.text()?.to_owned(), &options)
        .map_err(|e| TaskError::transform(TITLE, format!("{}\n{e}", display.display())))?;

    Ok(VirtualFile::new(display, css))
}

fn prefix(mut file: VirtualFile, targets: Targets) -> Result<VirtualFile, TaskError> {
    let filename = file.path.to_string_lossy().into_owned();
    let code = {
        let source = file.text()?;
        let mut sheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: filename.clone(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| TaskError::transform(TITLE, format!("{filename}: {e}")))?;
        sheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| TaskError::transform(TITLE, format!("{filename}: {e}")))?;
        sheet
            .to_css(PrinterOptions {
                targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| TaskError::transform(TITLE, format!("{filename}: {e}")))?
            .code
    };
    file.contents = code.into_bytes();
    Ok(file)
}

fn concatenate(files: Vec<VirtualFile>, bundle: &str) -> VirtualFile {
    let mut combined = String::new();
    let mut origins = Vec::with_capacity(files.len());

    for file in files {
        let text = String::from_utf8_lossy(&file.contents).into_owned();
        #[allow(clippy::cast_possible_truncation)]
        let first_line = combined.matches('\n').count() as u32;
        combined.push_str(&text);
        if !combined.ends_with('\n') {
            combined.push('\n');
        }
        origins.push(Origin {
            source: file.path,
            contents: text,
            first_line,
        });
    }

    let mut out = VirtualFile::new(bundle, combined);
    out.origins = origins;
    out
}

/// Append an inline base64 source map mapping each bundle line back to the
/// stylesheet it came from.
///
/// grass emits no maps of its own, so the sources are the compiled CSS of
/// each stylesheet, named `<stylesheet>.css` and embedded as source content.
fn append_source_map(mut file: VirtualFile) -> Result<VirtualFile, TaskError> {
    let mut map = SourceMap::new("/");

    for origin in &file.origins {
        let source = format!("{}.css", origin.source.to_string_lossy().replace('\\', "/"));
        let index = map.add_source(&source);
        map.set_source_content(index as usize, &origin.contents)
            .map_err(|e| TaskError::transform(TITLE, format!("source map: {e:?}")))?;
        for (line, _) in origin.contents.lines().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let line = line as u32;
            map.add_mapping(
                origin.first_line + line,
                0,
                Some(OriginalLocation::new(line, 0, index, None)),
            );
        }
    }

    let json = map
        .to_json(None)
        .map_err(|e| TaskError::transform(TITLE, format!("source map: {e:?}")))?;
    let comment = format!(
        "/*# sourceMappingURL=data:application/json;charset=utf-8;base64,{} */\n",
        STANDARD.encode(json)
    );
    file.contents.extend_from_slice(comment.as_bytes());
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildMode;
    use crate::transform::fixture::Project;

    fn project() -> Project {
        let p = Project::new();
        p.write("src/scss/_vars.scss", "$accent: #ff0000;\n")
            .write(
                "src/scss/style.scss",
                "@import \"vars\";\n\n.button {\n  color: $accent;\n  margin: 0px;\n\n  &:hover {\n    color: blue;\n  }\n}\n",
            );
        p
    }

    #[test]
    fn test_stage_order() {
        let p = project();
        let prod = p.ctx("", BuildMode::Production);
        let dev = p.ctx("", BuildMode::Development);
        let targets = Targets::default();

        assert_eq!(
            pipeline(&prod, targets).stages(),
            vec!["parse", "prefix", "concatenate", "minify", "rename"]
        );
        assert_eq!(
            pipeline(&dev, targets).stages(),
            vec!["parse", "prefix", "concatenate", "rename", "sourcemap"]
        );
    }

    #[test]
    fn test_production_bundle() {
        let p = project();
        let report = run(&p.ctx("", BuildMode::Production)).unwrap();

        assert_eq!(report.outputs, vec![p.root().join("dist/css/bundle.min.css")]);
        assert_eq!(
            report.reload,
            Reload::Css {
                href: "css/bundle.min.css".into()
            }
        );

        let css = p.read("dist/css/bundle.min.css");
        assert!(css.contains(".button{color:red;margin:0}"));
        assert!(css.contains(".button:hover{color:#00f}"));
        assert!(!css.contains("sourceMappingURL"));
    }

    #[test]
    fn test_development_bundle_has_source_map() {
        let p = project();
        run(&p.ctx("", BuildMode::Development)).unwrap();

        let css = p.read("dist/css/bundle.min.css");
        assert!(css.contains(".button {"));
        assert!(css.contains("/*# sourceMappingURL=data:application/json;charset=utf-8;base64,"));
    }

    #[test]
    fn test_source_map_names_compiled_css() {
        let p = project();
        run(&p.ctx("", BuildMode::Development)).unwrap();

        let css = p.read("dist/css/bundle.min.css");
        let encoded = css
            .split("base64,")
            .nth(1)
            .and_then(|rest| rest.split(" */").next())
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap();

        let source = json["sources"][0].as_str().unwrap();
        assert!(source.ends_with("src/scss/style.scss.css"));
        let content = json["sourcesContent"][0].as_str().unwrap();
        assert!(content.contains(".button {"));
        assert!(!content.contains("$accent"));
    }

    #[test]
    fn test_production_not_larger_than_development() {
        let p = project();
        run(&p.ctx("", BuildMode::Development)).unwrap();
        let dev = p.read("dist/css/bundle.min.css").len();
        run(&p.ctx("", BuildMode::Production)).unwrap();
        let prod = p.read("dist/css/bundle.min.css").len();
        assert!(prod <= dev);
    }

    #[test]
    fn test_vendor_prefixing() {
        let p = Project::new();
        p.write("src/scss/style.scss", ".a { user-select: none; }\n");
        let ctx = p.ctx("[build]\nbrowsers = [\"safari 12\"]", BuildMode::Production);
        run(&ctx).unwrap();

        assert!(p.read("dist/css/bundle.min.css").contains("-webkit-user-select:none"));
    }

    #[test]
    fn test_multiple_entries_concatenated_in_order() {
        let p = Project::new();
        p.write("src/scss/a.scss", ".first { top: 0; }\n")
            .write("src/scss/b.scss", ".second { top: 0; }\n");
        let ctx = p.ctx(
            "[styles]\ninput = [\"src/scss/a.scss\", \"src/scss/b.scss\"]\nsuffix = \"\"",
            BuildMode::Production,
        );
        run(&ctx).unwrap();

        let css = p.read("dist/css/bundle.css");
        let first = css.find(".first").unwrap();
        let second = css.find(".second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_syntax_error_keeps_previous_output() {
        let p = project();
        run(&p.ctx("", BuildMode::Production)).unwrap();
        let before = p.read("dist/css/bundle.min.css");

        p.write("src/scss/style.scss", ".broken { color: ; \n");
        let err = run(&p.ctx("", BuildMode::Production)).unwrap_err();

        match err {
            TaskError::Transform(n) => assert_eq!(n.title, "Styles Error"),
            other => panic!("expected transform error, got {other:?}"),
        }
        assert_eq!(p.read("dist/css/bundle.min.css"), before);
    }

    #[test]
    fn test_missing_entry_is_setup_error() {
        let p = Project::new();
        let err = run(&p.ctx("", BuildMode::Production)).unwrap_err();
        assert!(matches!(err, TaskError::Setup { .. }));
    }

    #[test]
    fn test_css_reload_outside_output() {
        let p = Project::new();
        let ctx = p.ctx("[styles]\noutput = \"public/css\"", BuildMode::Production);
        assert_eq!(css_reload(&ctx), Reload::Page);
    }
}
