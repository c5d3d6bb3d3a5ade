//! Markup: page templates to HTML.
//!
//! ```text
//! render → [pretty] → emit
//! ```
//!
//! Every template under `[markup] watch` is registered by its path relative
//! to the glob base, so `{% extends "layouts/base.html" %}` works from any
//! page. The JSON data file is read on every run; nothing is cached between
//! runs.

use super::{BuildContext, TaskError, TaskReport, error_chain};
use crate::pipeline::{Pipeline, VirtualFile, emit, stage};
use crate::utils::html;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

const TITLE: &str = "Markup Error";

pub fn run(ctx: &BuildContext) -> Result<TaskReport, TaskError> {
    let config = &ctx.config;
    let markup = &config.markup;

    let watch = config.path_set("markup.watch", &markup.watch)?;
    let pages = config.path_set("markup.input", &markup.input)?;

    let data = load_data(&markup.data.file)?;

    // Pages outside the watch globs are still registered under their own base.
    let mut templates: Vec<(PathBuf, String)> = Vec::new();
    let page_files = pages.files()?;
    for path in watch.files()?.into_iter().chain(page_files.iter().cloned()) {
        if templates.iter().any(|(p, _)| *p == path) {
            continue;
        }
        let name = watch
            .relative(&path)
            .or_else(|| pages.relative(&path))
            .map(|rel| template_name(&rel))
            .unwrap_or_else(|| template_name(&path));
        templates.push((path, name));
    }

    let tera = load_templates(&templates)?;

    let sources = page_files
        .into_iter()
        .filter_map(|path| {
            let (_, name) = templates.iter().find(|(p, _)| *p == path)?;
            let stem = path.file_stem()?.to_string_lossy().into_owned();
            Some(VirtualFile::new(format!("{stem}.html"), name.as_bytes().to_vec()))
        })
        .collect::<Vec<_>>();

    crate::debug!("markup"; "{} templates, {} pages", templates.len(), sources.len());

    let indent = markup.pretty.then_some(markup.indent.as_str());
    let files = pipeline(&tera, &markup.data.variable, &data, indent).run(sources)?;
    let outputs = emit(&files, &markup.output)?;
    Ok(TaskReport::page(outputs))
}

/// Stage list. Input files carry the template name as contents.
pub fn pipeline<'a>(
    tera: &'a Tera,
    variable: &'a str,
    data: &'a serde_json::Value,
    indent: Option<&'a str>,
) -> Pipeline<'a> {
    Pipeline::new()
        .pipe(stage("render", move |files| {
            let mut context = Context::new();
            context.insert(variable, data);
            files
                .into_iter()
                .map(|mut file| {
                    let name = file.text()?.to_owned();
                    let rendered = tera
                        .render(&name, &context)
                        .map_err(|e| TaskError::transform(TITLE, error_chain(&e)))?;
                    file.contents = rendered.into_bytes();
                    Ok(file)
                })
                .collect()
        }))
        .pipe_if(
            indent.is_some(),
            stage("pretty", move |files| {
                let indent = indent.unwrap_or("  ");
                files
                    .into_iter()
                    .map(|mut file| {
                        let pretty = html::pretty(file.text()?, indent);
                        file.contents = pretty.into_bytes();
                        Ok(file)
                    })
                    .collect()
            }),
        )
}

/// Parse the data file. Missing is a setup problem, malformed is a
/// recoverable one.
pub fn load_data(path: &Path) -> Result<serde_json::Value, TaskError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(TaskError::setup(format!(
                "markup data file `{}` not found",
                path.display()
            )));
        }
        Err(e) => return Err(TaskError::Io(path.to_path_buf(), e)),
    };

    serde_json::from_str(&text).map_err(|e| {
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        TaskError::transform(TITLE, format!("{name}: {e}"))
    })
}

fn load_templates(templates: &[(PathBuf, String)]) -> Result<Tera, TaskError> {
    let mut tera = Tera::default();
    tera.add_template_files(
        templates
            .iter()
            .map(|(path, name)| (path.as_path(), Some(name.as_str())))
            .collect::<Vec<_>>(),
    )
    .map_err(|e| TaskError::transform(TITLE, error_chain(&e)))?;
    Ok(tera)
}

/// Template name with forward slashes on every platform.
fn template_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildMode;
    use crate::transform::fixture::Project;

    const LAYOUT: &str = "<!DOCTYPE html>\n<html><head><title>{% block title %}{% endblock %}</title></head><body>{% block body %}{% endblock %}</body></html>";

    fn project() -> Project {
        let p = Project::new();
        p.write("src/templates/layouts/base.html", LAYOUT)
            .write(
                "src/templates/partials/nav.html",
                "<nav><a href=\"/\">{{ sectionContent.site }}</a></nav>",
            )
            .write(
                "src/templates/pages/index.html",
                "{% extends \"layouts/base.html\" %}{% block title %}Home{% endblock %}{% block body %}{% include \"partials/nav.html\" %}<p>{{ sectionContent.hero.title }}</p>{% endblock %}",
            )
            .write(
                "src/data/content.json",
                r#"{"site": "Kiln", "hero": {"title": "Hello"}}"#,
            );
        p
    }

    #[test]
    fn test_renders_pages_with_layouts_and_data() {
        let p = project();
        let report = run(&p.ctx("[markup]\npretty = false", BuildMode::Production)).unwrap();

        assert_eq!(report.outputs, vec![p.root().join("dist/index.html")]);
        assert_eq!(
            p.read("dist/index.html"),
            "<!DOCTYPE html>\n<html><head><title>Home</title></head><body><nav><a href=\"/\">Kiln</a></nav><p>Hello</p></body></html>"
        );
        assert!(!p.exists("dist/base.html"));
        assert!(!p.exists("dist/nav.html"));
    }

    #[test]
    fn test_pretty_output_is_indented() {
        let p = project();
        run(&p.ctx("", BuildMode::Production)).unwrap();

        let html = p.read("dist/index.html");
        assert!(html.contains("\n  <body>\n"));
        assert!(html.contains("<p>Hello</p>"));
    }

    #[test]
    fn test_data_is_read_on_every_run() {
        let p = project();
        let ctx = p.ctx("[markup]\npretty = false", BuildMode::Production);

        run(&ctx).unwrap();
        assert!(p.read("dist/index.html").contains("<p>Hello</p>"));

        p.write(
            "src/data/content.json",
            r#"{"site": "Kiln", "hero": {"title": "Changed"}}"#,
        );
        run(&ctx).unwrap();
        assert!(p.read("dist/index.html").contains("<p>Changed</p>"));
    }

    #[test]
    fn test_missing_data_file_is_setup_error() {
        let p = project();
        fs::remove_file(p.root().join("src/data/content.json")).unwrap();

        let err = run(&p.ctx("", BuildMode::Production)).unwrap_err();
        assert!(matches!(err, TaskError::Setup { .. }));
    }

    #[test]
    fn test_malformed_data_is_markup_error() {
        let p = project();
        p.write("src/data/content.json", "{\"site\": ");

        match run(&p.ctx("", BuildMode::Production)).unwrap_err() {
            TaskError::Transform(n) => {
                assert_eq!(n.title, "Markup Error");
                assert!(n.message.starts_with("content.json: "));
            }
            other => panic!("expected transform error, got {other:?}"),
        }
    }

    #[test]
    fn test_template_syntax_error_keeps_previous_output() {
        let p = project();
        run(&p.ctx("", BuildMode::Production)).unwrap();
        let before = p.read("dist/index.html");

        p.write("src/templates/pages/index.html", "{% if %}broken");
        match run(&p.ctx("", BuildMode::Production)).unwrap_err() {
            TaskError::Transform(n) => assert_eq!(n.title, "Markup Error"),
            other => panic!("expected transform error, got {other:?}"),
        }
        assert_eq!(p.read("dist/index.html"), before);
    }

    #[test]
    fn test_custom_data_variable() {
        let p = project();
        p.write("src/templates/pages/about.html", "<h1>{{ site.site }}</h1>");
        let ctx = p.ctx(
            "[markup]\npretty = false\n[markup.data]\nvariable = \"site\"",
            BuildMode::Production,
        );
        // index.html still refers to `sectionContent`
        assert!(run(&ctx).is_err());

        fs::remove_file(p.root().join("src/templates/pages/index.html")).unwrap();
        run(&ctx).unwrap();
        assert_eq!(p.read("dist/about.html"), "<h1>Kiln</h1>");
    }

    #[test]
    fn test_template_name_uses_slashes() {
        assert_eq!(
            template_name(Path::new("layouts").join("base.html").as_path()),
            "layouts/base.html"
        );
    }
}
