//! Relocation of images referenced by a document into the asset store.

use super::{html_escape, html_unescape};
use once_cell::sync::Lazy;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Segment that roots rebased links.
pub const ASSETS_SEGMENT: &str = "assets";

// `src` may be double-quoted, single-quoted or bare
static IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(<img\b[^>]*?\ssrc\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("valid regex")
});

static URL_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid regex"));

const FILENAME_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Image '{src}' not found at {path:?}")]
    MissingImage { src: String, path: PathBuf },

    #[error("Asset directory {0:?} has no 'assets' segment")]
    NoAssetsSegment(PathBuf),

    #[error("Failed to copy {from:?} to {to:?}: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Link prefix for files stored in `asset_dir`: `~/` followed by the path
/// from the last `assets` segment onward.
///
/// ```
/// use plog_core::markdown::images::asset_link_prefix;
/// use std::path::Path;
///
/// let prefix = asset_link_prefix(Path::new("/site/assets/images/docs")).unwrap();
/// assert_eq!(prefix, "~/assets/images/docs");
/// ```
pub fn asset_link_prefix(asset_dir: &Path) -> Result<String, AssetError> {
    let segments: Vec<String> = asset_dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let start = segments
        .iter()
        .rposition(|s| s == ASSETS_SEGMENT)
        .ok_or_else(|| AssetError::NoAssetsSegment(asset_dir.to_path_buf()))?;
    Ok(format!("~/{}", segments[start..].join("/")))
}

/// Output of [`rebase_image_links`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebasedHtml {
    pub html: String,
    /// Number of image files copied into the asset directory.
    pub copied: usize,
}

/// Copy every locally referenced `<img>` into `asset_dir` under a randomized
/// name and point its `src` at the copy.
///
/// References are resolved relative to the directory of `source_file`.
/// Absolute URLs, root-relative paths and already rebased `~/` links are
/// left alone. Rewritten attributes are always double-quoted.
pub fn rebase_image_links(
    html: &str,
    source_file: &Path,
    asset_dir: &Path,
) -> Result<RebasedHtml, AssetError> {
    let prefix = asset_link_prefix(asset_dir)?;
    let base_dir = source_file.parent().unwrap_or_else(|| Path::new(""));

    let mut output = String::with_capacity(html.len());
    let mut copied = 0;
    let mut last = 0;
    for caps in IMG_SRC.captures_iter(html) {
        let (Some(whole), Some(value)) = (
            caps.get(0),
            caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)),
        ) else {
            continue;
        };
        let src = html_unescape(value.as_str());
        if !is_local_reference(&src) {
            tracing::debug!("Leaving image reference '{}' untouched", src);
            continue;
        }

        let relocated = relocate(&src, base_dir, asset_dir, &prefix)?;
        output.push_str(&html[last..whole.start()]);
        output.push_str(&caps[1]);
        output.push('"');
        output.push_str(&html_escape(&relocated));
        output.push('"');
        last = whole.end();
        copied += 1;
    }
    output.push_str(&html[last..]);
    Ok(RebasedHtml {
        html: output,
        copied,
    })
}

fn is_local_reference(src: &str) -> bool {
    !(src.is_empty()
        || src.starts_with('/')
        || src.starts_with("~/")
        || src.starts_with('#')
        || URL_SCHEME.is_match(src))
}

fn relocate(
    src: &str,
    base_dir: &Path,
    asset_dir: &Path,
    prefix: &str,
) -> Result<String, AssetError> {
    let without_suffix = src.split(['?', '#']).next().unwrap_or(src);
    let decoded = percent_decode_str(without_suffix).decode_utf8_lossy();
    let from = base_dir.join(decoded.as_ref());

    let file_name = match from.file_name() {
        Some(name) if from.is_file() => name.to_string_lossy().into_owned(),
        _ => {
            return Err(AssetError::MissingImage {
                src: src.to_string(),
                path: from,
            })
        }
    };

    let id = Uuid::new_v4().simple().to_string();
    let stored = format!("{}{}", &id[..8], file_name);
    let to = asset_dir.join(&stored);

    fs::create_dir_all(asset_dir)
        .and_then(|_| fs::copy(&from, &to))
        .map_err(|source| AssetError::Io {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
    tracing::debug!("Copied image {:?} -> {:?}", from, to);

    Ok(format!(
        "{}/{}",
        prefix,
        utf8_percent_encode(&stored, FILENAME_ENCODE)
    ))
}
