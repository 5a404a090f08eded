//! Path normalization - import locations to logical filenames
//!
//! A logical filename is the part of an import path below the import base
//! directory, joined with `/`. It is both the uniqueness key of a source
//! and the relative path used when the source is exported again.
//!
//! Everything here is lexical: no filesystem access, no canonicalization.

use std::path::{Component, Path, PathBuf};
use crate::{Error, Result};

/// Separator used inside logical filenames on every platform
pub const SEPARATOR: char = '/';

/// Derive the logical filename for `input_path` imported from `base_dir`.
///
/// - `/data` + `/data/main.tf` gives `main.tf`
/// - `/data` + `/data/modules/net/main.tf` gives `modules/net/main.tf`
/// - `/data` + `modules/net/main.tf` gives `modules/net/main.tf`
///
/// Relative inputs always live under `base_dir`: `infra` + `infra/main.tf`
/// names `infra/infra/main.tf` on disk and gives `infra/main.tf`.
pub fn normalize(base_dir: &Path, input_path: &Path) -> Result<String> {
    let base = clean(base_dir);
    let input = clean(input_path);

    let relative: &[Component<'_>] = if input_path.has_root() {
        if !base_dir.has_root() {
            return Err(Error::InvalidPath(format!(
                "{} is absolute but base directory {} is not",
                input_path.display(),
                base_dir.display()
            )));
        }
        input.strip_prefix(base.as_slice()).ok_or_else(|| {
            Error::InvalidPath(format!(
                "{} is outside of {}",
                input_path.display(),
                base_dir.display()
            ))
        })?
    } else {
        &input
    };

    let filename = join_logical(relative)
        .map_err(|reason| Error::InvalidPath(format!("{}: {}", input_path.display(), reason)))?;

    tracing::debug!(
        base = %base_dir.display(),
        input = %input_path.display(),
        filename = %filename,
        "normalized import path"
    );
    Ok(filename)
}

/// The on-disk location an import of `input_path` reads from
pub fn resolve(base_dir: &Path, input_path: &Path) -> PathBuf {
    if input_path.has_root() {
        input_path.to_path_buf()
    } else {
        base_dir.join(input_path)
    }
}

/// Whether a stored filename can be joined below a directory without escaping it
pub fn is_safe_relative(filename: &str) -> bool {
    if filename.is_empty() || filename.contains('\\') {
        return false;
    }
    let path = Path::new(filename);
    !path.has_root()
        && filename
            .split(SEPARATOR)
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// Lexically clean a path: drop `.` and fold `..` into its parent where possible
fn clean(path: &Path) -> Vec<Component<'_>> {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

fn join_logical(components: &[Component<'_>]) -> std::result::Result<String, &'static str> {
    if components.is_empty() {
        return Err("names the base directory itself");
    }

    let mut segments = Vec::with_capacity(components.len());
    for component in components {
        match component {
            Component::Normal(segment) => {
                let segment = segment.to_str().ok_or("is not valid UTF-8")?;
                segments.push(segment);
            }
            Component::ParentDir => return Err("escapes the base directory"),
            _ => return Err("is not relative to the base directory"),
        }
    }

    Ok(segments.join(&SEPARATOR.to_string()))
}
