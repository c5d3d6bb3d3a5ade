//! Vector icons: individual SVG files into one `<symbol>` sprite.
//!
//! ```text
//! minify → strip-attributes → fix-entities → sprite → emit
//! ```
//!
//! The per-file stages run in parallel; `sprite` is the aggregation point
//! and only starts once every icon has been processed.

use super::{BuildContext, TaskError, TaskReport};
use crate::pipeline::{Pipeline, VirtualFile, emit, stage};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesStart, Event};
use rayon::prelude::*;
use regex::{Captures, Regex};
use rustc_hash::{FxHashMap, FxHashSet};
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

const TITLE: &str = "Icons Error";

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

pub fn run(ctx: &BuildContext) -> Result<TaskReport, TaskError> {
    let icons = &ctx.config.icons;

    let paths = ctx.config.path_set("icons.input", &icons.input)?.files()?;

    let mut claimed: FxHashMap<String, &Path> = FxHashMap::default();
    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        let id = icon_id(path);
        if let Some(first) = claimed.insert(id.clone(), path) {
            return Err(TaskError::transform(
                TITLE,
                format!(
                    "{} and {} both map to symbol id `{id}`",
                    ctx.config.root_relative(first).display(),
                    ctx.config.root_relative(path).display(),
                ),
            ));
        }
        let contents = fs::read(path).map_err(TaskError::io(path))?;
        sources.push(VirtualFile::new(format!("{id}.svg"), contents));
    }

    let files = pipeline(&icons.bundle).run(sources)?;
    let outputs = emit(&files, &icons.output)?;
    Ok(TaskReport::page(outputs))
}

pub fn pipeline(bundle: &str) -> Pipeline<'_> {
    Pipeline::new()
        .pipe(stage("minify", |files| {
            per_file(files, |name, svg| rewrite(name, svg, &MINIFY))
        }))
        .pipe(stage("strip-attributes", |files| {
            per_file(files, |name, svg| rewrite(name, svg, &STRIP))
        }))
        .pipe(stage("fix-entities", |files| {
            per_file(files, |_, svg| Ok(svg.replace("&gt;", ">")))
        }))
        .pipe(stage("sprite", move |files| Ok(vec![sprite(bundle, &files)?])))
}

/// Symbol id for a source file: its stem, whitespace replaced by `_`.
pub fn icon_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn per_file<F>(files: Vec<VirtualFile>, f: F) -> Result<Vec<VirtualFile>, TaskError>
where
    F: Fn(&str, &str) -> Result<String, TaskError> + Sync,
{
    files
        .into_par_iter()
        .map(|mut file| {
            let name = file.path.to_string_lossy().into_owned();
            let out = f(&name, file.text()?)?;
            file.contents = out.into_bytes();
            Ok(file)
        })
        .collect()
}

// ============================================================================
// Rewriting
// ============================================================================

/// What a rewrite pass removes.
struct Rules {
    /// Declarations, doctypes, comments, processing instructions,
    /// editor elements and whitespace-only text
    drop_junk: bool,
    drop_attr: fn(&[u8]) -> bool,
}

const MINIFY: Rules = Rules {
    drop_junk: true,
    drop_attr: is_editor_attr,
};

const STRIP: Rules = Rules {
    drop_junk: false,
    drop_attr: is_presentation_attr,
};

fn is_junk_element(name: &[u8]) -> bool {
    matches!(name, b"metadata" | b"title" | b"desc")
        || name.starts_with(b"sodipodi:")
        || name.starts_with(b"inkscape:")
}

fn is_editor_attr(key: &[u8]) -> bool {
    key.starts_with(b"sodipodi:")
        || key.starts_with(b"inkscape:")
        || matches!(key, b"xmlns:sodipodi" | b"xmlns:inkscape")
}

fn is_presentation_attr(key: &[u8]) -> bool {
    matches!(key, b"fill" | b"stroke" | b"style")
}

fn xml_error(name: &str, src: &str, pos: u64, err: impl std::fmt::Display) -> TaskError {
    let pos = usize::try_from(pos).unwrap_or(usize::MAX).min(src.len());
    let line = src.as_bytes()[..pos].iter().filter(|b| **b == b'\n').count() + 1;
    TaskError::transform(TITLE, format!("{name}:{line}: {err}"))
}

fn write(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    event: Event<'_>,
) -> Result<(), TaskError> {
    writer
        .write_event(event)
        .map_err(|e| TaskError::transform(TITLE, format!("{name}: {e}")))
}

/// Copy `start` keeping only attributes for which `keep` returns a value.
///
/// `pos` is the reader offset just past the tag, used to report the line.
fn map_attrs<F>(
    name: &str,
    src: &str,
    pos: u64,
    start: &BytesStart<'_>,
    mut keep: F,
) -> Result<BytesStart<'static>, TaskError>
where
    F: FnMut(&[u8], &[u8]) -> Option<Vec<u8>>,
{
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut out = BytesStart::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(name, src, pos, e))?;
        if let Some(value) = keep(attr.key.as_ref(), &attr.value) {
            out.push_attribute((attr.key.as_ref(), value.as_slice()));
        }
    }
    Ok(out)
}

/// Re-serialize `src` without what `rules` drops.
fn rewrite(name: &str, src: &str, rules: &Rules) -> Result<String, TaskError> {
    let mut reader = Reader::from_str(src);
    let mut writer = Writer::new(Vec::with_capacity(src.len()));
    let mut depth = 0usize;
    let mut skip = 0usize;

    let keep = |key: &[u8], value: &[u8]| (!(rules.drop_attr)(key)).then(|| value.to_vec());

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_error(name, src, reader.error_position() as u64, e))?;

        match event {
            Event::Eof => break,
            Event::Start(start) => {
                depth += 1;
                if skip > 0 || (rules.drop_junk && is_junk_element(start.name().as_ref())) {
                    skip += 1;
                    continue;
                }
                let pos = reader.buffer_position() as u64;
                let start = map_attrs(name, src, pos, &start, keep)?;
                write(&mut writer, name, Event::Start(start))?;
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                if skip > 0 {
                    skip -= 1;
                    continue;
                }
                write(&mut writer, name, Event::End(end))?;
            }
            Event::Empty(start) => {
                if skip > 0 || (rules.drop_junk && is_junk_element(start.name().as_ref())) {
                    continue;
                }
                let pos = reader.buffer_position() as u64;
                let start = map_attrs(name, src, pos, &start, keep)?;
                write(&mut writer, name, Event::Empty(start))?;
            }
            Event::Text(text) => {
                if skip > 0 || (rules.drop_junk && text.iter().all(u8::is_ascii_whitespace)) {
                    continue;
                }
                write(&mut writer, name, Event::Text(text))?;
            }
            Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_)
                if rules.drop_junk => {}
            other => {
                if skip == 0 {
                    write(&mut writer, name, other)?;
                }
            }
        }
    }

    if depth != 0 {
        return Err(TaskError::transform(
            TITLE,
            format!("{name}: unexpected end of file, {depth} element(s) left open"),
        ));
    }

    String::from_utf8(writer.into_inner())
        .map_err(|_| TaskError::transform(TITLE, format!("{name}: output is not UTF-8")))
}

// ============================================================================
// Sprite
// ============================================================================

static URL_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(\s*['"]?#([^'")\s]+)['"]?\s*\)"#).unwrap());

/// Ids declared anywhere in the icon.
fn collect_ids(name: &str, src: &str) -> Result<FxHashSet<String>, TaskError> {
    let mut reader = Reader::from_str(src);
    let mut ids = FxHashSet::default();
    loop {
        match reader
            .read_event()
            .map_err(|e| xml_error(name, src, reader.error_position() as u64, e))?
        {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"id" {
                        ids.insert(String::from_utf8_lossy(&attr.value).into_owned());
                    }
                }
            }
            _ => {}
        }
    }
    Ok(ids)
}

/// Prefix ids with the icon id and update references to them.
fn namespace_attr(icon: &str, ids: &FxHashSet<String>, key: &[u8], value: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(value);

    let rewritten: Cow<'_, str> = match key {
        b"id" if ids.contains(text.as_ref()) => Cow::Owned(format!("{icon}_{text}")),
        b"href" | b"xlink:href" => match text.strip_prefix('#') {
            Some(target) if ids.contains(target) => Cow::Owned(format!("#{icon}_{target}")),
            _ => text,
        },
        _ if text.contains("url(") => URL_REF.replace_all(&text, |caps: &Captures<'_>| {
            if ids.contains(&caps[1]) {
                format!("url(#{icon}_{})", &caps[1])
            } else {
                caps[0].to_string()
            }
        }),
        _ => text,
    };

    rewritten.into_owned().into_bytes()
}

/// `viewBox` of the root element, or `0 0 width height` when absent.
fn view_box(root: &BytesStart<'_>) -> Option<String> {
    let mut width = None;
    let mut height = None;
    for attr in root.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).trim().to_string();
        match attr.key.as_ref() {
            b"viewBox" => return Some(value),
            b"width" => width = Some(value),
            b"height" => height = Some(value),
            _ => {}
        }
    }
    let number = |v: String| {
        let v = v.trim_end_matches("px").to_string();
        v.parse::<f64>().ok().map(|_| v)
    };
    Some(format!("0 0 {} {}", number(width?)?, number(height?)?))
}

/// Convert one icon into a `<symbol>` element.
fn symbol(id: &str, name: &str, src: &str) -> Result<String, TaskError> {
    let ids = collect_ids(name, src)?;
    let mut reader = Reader::from_str(src);
    let mut writer = Writer::new(Vec::with_capacity(src.len() + 64));
    let mut depth = 0usize;
    let mut seen_root = false;

    let open_symbol = |root: &BytesStart<'_>| {
        let mut symbol = BytesStart::new("symbol");
        symbol.push_attribute(("id", id));
        if let Some(vb) = view_box(root) {
            symbol.push_attribute(("viewBox", vb.as_str()));
        }
        for attr in root.attributes().flatten() {
            if attr.key.as_ref() == b"preserveAspectRatio" {
                symbol.push_attribute((attr.key.as_ref(), attr.value.as_ref()));
            }
        }
        symbol
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_error(name, src, reader.error_position() as u64, e))?;
        match event {
            Event::Eof => break,
            Event::Start(start) if depth == 0 => {
                if seen_root || start.name().as_ref() != b"svg" {
                    return Err(not_an_icon(name));
                }
                seen_root = true;
                depth = 1;
                write(&mut writer, name, Event::Start(open_symbol(&start)))?;
            }
            Event::Empty(start) if depth == 0 => {
                if seen_root || start.name().as_ref() != b"svg" {
                    return Err(not_an_icon(name));
                }
                seen_root = true;
                write(&mut writer, name, Event::Empty(open_symbol(&start)))?;
            }
            Event::End(_) if depth == 1 => {
                depth = 0;
                write(
                    &mut writer,
                    name,
                    Event::End(quick_xml::events::BytesEnd::new("symbol")),
                )?;
            }
            Event::Start(start) => {
                depth += 1;
                let pos = reader.buffer_position() as u64;
                let start = map_attrs(name, src, pos, &start, |k, v| {
                    Some(namespace_attr(id, &ids, k, v))
                })?;
                write(&mut writer, name, Event::Start(start))?;
            }
            Event::Empty(start) => {
                let pos = reader.buffer_position() as u64;
                let start = map_attrs(name, src, pos, &start, |k, v| {
                    Some(namespace_attr(id, &ids, k, v))
                })?;
                write(&mut writer, name, Event::Empty(start))?;
            }
            Event::End(end) => {
                depth -= 1;
                write(&mut writer, name, Event::End(end))?;
            }
            other if depth > 0 => write(&mut writer, name, other)?,
            _ => {}
        }
    }

    if !seen_root {
        return Err(not_an_icon(name));
    }
    String::from_utf8(writer.into_inner())
        .map_err(|_| TaskError::transform(TITLE, format!("{name}: output is not UTF-8")))
}

fn not_an_icon(name: &str) -> TaskError {
    TaskError::transform(TITLE, format!("{name}: expected a single <svg> root element"))
}

/// Combine processed icons into one sprite, symbols sorted by id.
fn sprite(bundle: &str, files: &[VirtualFile]) -> Result<VirtualFile, TaskError> {
    let mut symbols = files
        .par_iter()
        .map(|file| {
            let name = file.path.to_string_lossy();
            let id = icon_id(&file.path);
            Ok((id.clone(), symbol(&id, &name, file.text()?)?))
        })
        .collect::<Result<Vec<_>, TaskError>>()?;
    symbols.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = format!(r#"<svg xmlns="{SVG_NS}" xmlns:xlink="{XLINK_NS}">"#);
    for (_, symbol) in &symbols {
        out.push_str(symbol);
    }
    out.push_str("</svg>");

    Ok(VirtualFile::new(bundle, out))
}

#[cfg(test)]
mod tests;
