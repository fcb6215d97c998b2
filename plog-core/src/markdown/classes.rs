//! CSS class injection into rendered HTML.

use super::html_escape;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use thiserror::Error;

/// Lower-case tag name to CSS class, e.g. `h1 -> head1`.
pub type Mappings = BTreeMap<String, String>;

static CLASS_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\s)class="([^"]*)""#).expect("valid regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Class for <{tag}> must not contain '\"': {value}")]
    ForbiddenQuote { tag: String, value: String },

    #[error("Invalid tag name in mappings: {0:?}")]
    InvalidTag(String),
}

/// Check every mapping before any HTML is touched.
pub fn validate_mappings(mappings: &Mappings) -> Result<(), MappingError> {
    for (tag, value) in mappings {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(MappingError::InvalidTag(tag.clone()));
        }
        if value.contains('"') {
            return Err(MappingError::ForbiddenQuote {
                tag: tag.clone(),
                value: value.clone(),
            });
        }
    }
    Ok(())
}

/// Add the mapped class to every opening tag named in `mappings`.
///
/// Tags that already carry a `class` attribute get the mapped class
/// prepended to their class list.
///
/// ```
/// use plog_core::markdown::{add_classes, Mappings};
///
/// let mut mappings = Mappings::new();
/// mappings.insert("h1".into(), "head1".into());
/// let html = add_classes(r#"<h1 class="title">T</h1>"#, &mappings).unwrap();
/// assert_eq!(html, r#"<h1 class="head1 title">T</h1>"#);
/// ```
pub fn add_classes(html: &str, mappings: &Mappings) -> Result<String, MappingError> {
    validate_mappings(mappings)?;

    let mut html = html.to_string();
    for (tag, class) in mappings {
        let class = html_escape(class);
        let opening = Regex::new(&format!(r"<{}(\s[^>]*?)?(\s*/)?>", regex::escape(tag)))
            .map_err(|_| MappingError::InvalidTag(tag.clone()))?;

        html = opening
            .replace_all(&html, |caps: &Captures| {
                let attrs = caps.get(1).map_or("", |m| m.as_str());
                let closing = caps.get(2).map_or("", |m| m.as_str());
                format!("<{}{}{}>", tag, with_class(attrs, &class), closing)
            })
            .into_owned();
    }
    Ok(html)
}

fn with_class(attrs: &str, class: &str) -> String {
    if CLASS_ATTR.is_match(attrs) {
        CLASS_ATTR
            .replacen(attrs, 1, |caps: &Captures| {
                let existing = &caps[2];
                if existing.is_empty() {
                    format!(r#"{}class="{}""#, &caps[1], class)
                } else {
                    format!(r#"{}class="{} {}""#, &caps[1], class, existing)
                }
            })
            .into_owned()
    } else {
        format!(r#"{} class="{}""#, attrs, class)
    }
}
