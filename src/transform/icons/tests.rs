use super::*;
use crate::core::BuildMode;
use crate::transform::fixture::Project;

fn build(files: &[(&str, &str)]) -> Result<String, TaskError> {
    let sources = files
        .iter()
        .map(|(name, svg)| VirtualFile::new(*name, *svg))
        .collect();
    let out = pipeline("sprite.svg").run(sources)?;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].path, Path::new("sprite.svg"));
    Ok(out[0].text()?.to_string())
}

#[test]
fn test_stage_order() {
    assert_eq!(
        pipeline("sprite.svg").stages(),
        vec!["minify", "strip-attributes", "fix-entities", "sprite"]
    );
}

#[test]
fn test_sprite_output() {
    let svg = r#"<?xml version="1.0"?>
<!-- Generator: editor -->
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
  <title>arrow</title>
  <path d="M0 0h24v24H0z" fill="red" style="stroke:blue"/>
</svg>
"#;
    let sprite = build(&[("a.svg", svg)]).unwrap();
    assert_eq!(
        sprite,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><symbol id="a" viewBox="0 0 24 24"><path d="M0 0h24v24H0z"/></symbol></svg>"#
    );
}

#[test]
fn test_editor_metadata_removed() {
    let svg = r#"<svg xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" inkscape:version="1.0" viewBox="0 0 1 1">
  <sodipodi:namedview id="base" pagecolor="white"/>
  <metadata><rdf>x</rdf></metadata>
  <desc>described</desc>
  <rect width="1" height="1" stroke="black"/>
</svg>"#;
    let sprite = build(&[("box.svg", svg)]).unwrap();

    assert!(!sprite.contains("inkscape"));
    assert!(!sprite.contains("sodipodi"));
    assert!(!sprite.contains("metadata"));
    assert!(!sprite.contains("described"));
    assert!(sprite.contains(r#"<rect width="1" height="1"/>"#));
}

#[test]
fn test_internal_ids_are_namespaced() {
    let svg = r##"<svg viewBox="0 0 10 10"><defs><mask id="m"><rect width="10" height="10"/></mask></defs><g mask="url(#m)"><use xlink:href="#m"/><use href="#other"/></g></svg>"##;
    let sprite = build(&[("logo.svg", svg)]).unwrap();

    assert!(sprite.contains(r#"<mask id="logo_m">"#));
    assert!(sprite.contains(r##"<g mask="url(#logo_m)">"##));
    assert!(sprite.contains(r##"<use xlink:href="#logo_m"/>"##));
    assert!(sprite.contains(r##"<use href="#other"/>"##));
}

#[test]
fn test_escaped_gt_is_fixed() {
    let svg = r#"<svg viewBox="0 0 1 1"><text>a &gt; b</text></svg>"#;
    let sprite = build(&[("t.svg", svg)]).unwrap();
    assert!(sprite.contains("<text>a > b</text>"));
}

#[test]
fn test_view_box_from_dimensions() {
    let svg = r#"<svg width="16px" height="16"><circle r="8"/></svg>"#;
    let sprite = build(&[("dot.svg", svg)]).unwrap();
    assert!(sprite.contains(r#"<symbol id="dot" viewBox="0 0 16 16">"#));
}

#[test]
fn test_icon_id_replaces_whitespace() {
    assert_eq!(icon_id(Path::new("src/img/svg/my icon.svg")), "my_icon");
    assert_eq!(icon_id(Path::new("arrow.left.svg")), "arrow.left");
}

#[test]
fn test_run_sorts_symbols() {
    let p = Project::new();
    p.write("src/img/svg/zeta.svg", r#"<svg viewBox="0 0 1 1"/>"#)
        .write("src/img/svg/my icon.svg", r#"<svg viewBox="0 0 2 2"/>"#)
        .write("src/img/svg/alpha.svg", r#"<svg viewBox="0 0 3 3"/>"#);

    let report = run(&p.ctx("", BuildMode::Production)).unwrap();
    assert_eq!(
        report.outputs,
        vec![p.root().join("dist/img/symbol/sprite.svg")]
    );
    assert_eq!(report.reload, crate::transform::Reload::Page);

    let sprite = p.read("dist/img/symbol/sprite.svg");
    let alpha = sprite.find(r#"id="alpha""#).unwrap();
    let mine = sprite.find(r#"id="my_icon""#).unwrap();
    let zeta = sprite.find(r#"id="zeta""#).unwrap();
    assert!(alpha < mine && mine < zeta);
}

#[test]
fn test_malformed_icon_keeps_previous_sprite() {
    let p = Project::new();
    p.write("src/img/svg/ok.svg", r#"<svg viewBox="0 0 1 1"/>"#);
    run(&p.ctx("", BuildMode::Production)).unwrap();
    let before = p.read("dist/img/symbol/sprite.svg");

    p.write("src/img/svg/broken.svg", "<svg><path></svg>");
    let err = run(&p.ctx("", BuildMode::Production)).unwrap_err();

    match err {
        TaskError::Transform(n) => {
            assert_eq!(n.title, "Icons Error");
            assert!(n.message.contains("broken.svg"));
        }
        other => panic!("expected transform error, got {other:?}"),
    }
    assert_eq!(p.read("dist/img/symbol/sprite.svg"), before);
}

#[test]
fn test_unclosed_element_is_error() {
    let err = build(&[("open.svg", r#"<svg viewBox="0 0 1 1"><g>"#)]).unwrap_err();
    assert!(matches!(err, TaskError::Transform(_)));
}

#[test]
fn test_non_svg_root_is_error() {
    let err = build(&[("html.svg", "<html></html>")]).unwrap_err();
    assert!(matches!(err, TaskError::Transform(_)));
}

#[test]
fn test_no_icons_gives_empty_sprite() {
    let p = Project::new();
    run(&p.ctx("", BuildMode::Production)).unwrap();
    assert_eq!(
        p.read("dist/img/symbol/sprite.svg"),
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"></svg>"#
    );
}

#[test]
fn test_bad_attribute_reports_its_line() {
    let svg = "<svg viewBox=\"0 0 1 1\">\n  <g>\n    <path d=\"M0 0\" d=\"M1 1\"/>\n  </g>\n</svg>";
    match build(&[("twice.svg", svg)]).unwrap_err() {
        TaskError::Transform(n) => assert!(n.message.starts_with("twice.svg:3: "), "{}", n.message),
        other => panic!("expected transform error, got {other:?}"),
    }
}

#[test]
fn test_duplicate_symbol_id_is_error() {
    let p = Project::new();
    p.write("src/img/svg/ui/close.svg", r#"<svg viewBox="0 0 1 1"/>"#)
        .write("src/img/svg/social/close.svg", r#"<svg viewBox="0 0 2 2"/>"#);
    let ctx = p.ctx("[icons]\ninput = [\"src/img/svg/**/*.svg\"]", BuildMode::Production);

    match run(&ctx).unwrap_err() {
        TaskError::Transform(n) => {
            assert_eq!(n.title, "Icons Error");
            assert!(n.message.contains("social/close.svg"), "{}", n.message);
            assert!(n.message.contains("ui/close.svg"), "{}", n.message);
            assert!(n.message.ends_with("`close`"), "{}", n.message);
        }
        other => panic!("expected transform error, got {other:?}"),
    }
    assert!(!p.exists("dist/img/symbol/sprite.svg"));
}

#[test]
fn test_whitespace_collision_is_error() {
    let p = Project::new();
    p.write("src/img/svg/my icon.svg", r#"<svg viewBox="0 0 1 1"/>"#)
        .write("src/img/svg/my_icon.svg", r#"<svg viewBox="0 0 2 2"/>"#);

    let err = run(&p.ctx("", BuildMode::Production)).unwrap_err();
    assert!(matches!(err, TaskError::Transform(n) if n.message.contains("`my_icon`")));
}
