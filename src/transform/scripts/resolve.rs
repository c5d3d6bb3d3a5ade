//! Module specifier resolution.
//!
//! Relative specifiers (`./a`, `../b`, `/c`) resolve against the importing
//! module's directory. Bare specifiers are looked up in `node_modules`
//! directories from the importer up to the filesystem root.

use crate::utils::fs::normalize_path;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions tried after the exact path.
const EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "json"];

/// Files tried inside a directory.
const INDEX_FILES: &[&str] = &["index.js", "index.mjs", "index.json"];

/// `package.json` fields consulted for a package entry, in order.
const ENTRY_FIELDS: &[&str] = &["browser", "module", "main"];

pub fn resolve(from_dir: &Path, specifier: &str) -> Result<PathBuf, String> {
    let found = if is_relative(specifier) {
        resolve_path(&normalize_path(&from_dir.join(specifier)))
    } else {
        resolve_package(from_dir, specifier)
    };
    found.ok_or_else(|| format!("cannot resolve `{specifier}`"))
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || specifier.starts_with('/')
}

/// Try `base` as a file, with each extension, then as a directory.
fn resolve_path(base: &Path) -> Option<PathBuf> {
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    let name = base.file_name()?.to_string_lossy().into_owned();
    for ext in EXTENSIONS {
        let candidate = base.with_file_name(format!("{name}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    if base.is_dir() {
        return resolve_dir(base);
    }
    None
}

fn resolve_dir(dir: &Path) -> Option<PathBuf> {
    if let Some(entry) = package_entry(dir) {
        return Some(entry);
    }
    INDEX_FILES
        .iter()
        .map(|index| dir.join(index))
        .find(|candidate| candidate.is_file())
}

/// Entry declared by `dir/package.json`, if any.
fn package_entry(dir: &Path) -> Option<PathBuf> {
    let text = fs::read_to_string(dir.join("package.json")).ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&text).ok()?;

    ENTRY_FIELDS.iter().find_map(|field| {
        // `browser` may also be an object of replacements; only the string
        // form names an entry.
        let value = manifest.get(field)?.as_str()?;
        let target = normalize_path(&dir.join(value));
        if target == dir {
            return None;
        }
        resolve_path(&target)
    })
}

/// Split `@scope/name/sub/path` into (`@scope/name`, `sub/path`).
fn split_package(specifier: &str) -> (&str, Option<&str>) {
    let mut slashes = specifier.match_indices('/').map(|(i, _)| i);
    let split = if specifier.starts_with('@') {
        slashes.nth(1)
    } else {
        slashes.next()
    };
    match split {
        Some(i) => (&specifier[..i], Some(&specifier[i + 1..])),
        None => (specifier, None),
    }
}

fn resolve_package(from_dir: &Path, specifier: &str) -> Option<PathBuf> {
    let (name, subpath) = split_package(specifier);

    from_dir.ancestors().find_map(|dir| {
        let package = dir.join("node_modules").join(name);
        if !package.is_dir() {
            return None;
        }
        match subpath {
            Some(sub) => resolve_path(&package.join(sub)),
            None => resolve_dir(&package),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_relative_extensions_and_index() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "src/js/util.js", "");
        touch(root, "src/js/data.json", "{}");
        touch(root, "src/js/lib/index.js", "");
        touch(root, "src/js/exact.mjs", "");

        let js = root.join("src/js");
        assert_eq!(resolve(&js, "./util").unwrap(), js.join("util.js"));
        assert_eq!(resolve(&js, "./util.js").unwrap(), js.join("util.js"));
        assert_eq!(resolve(&js, "./data").unwrap(), js.join("data.json"));
        assert_eq!(resolve(&js, "./lib").unwrap(), js.join("lib/index.js"));
        assert_eq!(resolve(&js, "./exact").unwrap(), js.join("exact.mjs"));
        assert_eq!(
            resolve(&js.join("lib"), "../util").unwrap(),
            js.join("util.js")
        );
    }

    #[test]
    fn test_package_entry_fields() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let modules = root.join("node_modules");
        touch(root, "node_modules/both/package.json", r#"{"main": "cjs.js", "module": "esm.js"}"#);
        touch(root, "node_modules/both/cjs.js", "");
        touch(root, "node_modules/both/esm.js", "");
        touch(root, "node_modules/web/package.json", r#"{"main": "node.js", "browser": "browser.js"}"#);
        touch(root, "node_modules/web/node.js", "");
        touch(root, "node_modules/web/browser.js", "");
        touch(root, "node_modules/map/package.json", r#"{"main": "main", "browser": {"fs": false}}"#);
        touch(root, "node_modules/map/main.js", "");
        touch(root, "node_modules/plain/index.js", "");
        touch(root, "src/js/index.js", "");

        let from = root.join("src/js");
        assert_eq!(resolve(&from, "both").unwrap(), modules.join("both/esm.js"));
        assert_eq!(resolve(&from, "web").unwrap(), modules.join("web/browser.js"));
        assert_eq!(resolve(&from, "map").unwrap(), modules.join("map/main.js"));
        assert_eq!(resolve(&from, "plain").unwrap(), modules.join("plain/index.js"));
    }

    #[test]
    fn test_scoped_package_subpath() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "node_modules/@oxc-project/runtime/helpers/typeof.js", "");

        let found = resolve(root, "@oxc-project/runtime/helpers/typeof").unwrap();
        assert_eq!(
            found,
            root.join("node_modules/@oxc-project/runtime/helpers/typeof.js")
        );
    }

    #[test]
    fn test_split_package() {
        assert_eq!(split_package("lodash"), ("lodash", None));
        assert_eq!(split_package("lodash/fp/map"), ("lodash", Some("fp/map")));
        assert_eq!(split_package("@scope/pkg"), ("@scope/pkg", None));
        assert_eq!(split_package("@scope/pkg/sub"), ("@scope/pkg", Some("sub")));
    }

    #[test]
    fn test_unresolved() {
        let dir = TempDir::new().unwrap();
        let err = resolve(dir.path(), "./missing").unwrap_err();
        assert_eq!(err, "cannot resolve `./missing`");
        assert!(resolve(dir.path(), "left-pad").is_err());
    }
}
