//! Slug generation for heading anchors and display names.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid regex"));

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Lowercase
/// - Replace whitespace and underscores with hyphens
/// - Remove punctuation (unicode letters survive)
/// - Collapse multiple hyphens
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use plog_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// ```
pub fn slugify(input: &str) -> String {
    let lowercased = input.to_lowercase();

    let cleaned = lowercased
        .graphemes(true)
        .filter_map(|g| {
            let c = g.chars().next()?;
            if c.is_whitespace() || c == '_' {
                Some("-")
            } else if c.is_ascii_alphanumeric() || c == '-' || c.is_alphabetic() {
                Some(g)
            } else {
                None
            }
        })
        .collect::<String>();

    let collapsed = HYPHEN_RUNS.replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}

/// Human readable label for a file or directory name: hyphens become spaces.
///
/// ```
/// use plog_core::slug::display_name;
///
/// assert_eq!(display_name("file1-intro"), "file1 intro");
/// ```
pub fn display_name(stem: &str) -> String {
    stem.replace('-', " ")
}

/// Hands out document-unique slugs, suffixing `-1`, `-2`, ... on collisions.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    seen: HashMap<String, usize>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `base` and return the slug to use for it.
    pub fn claim(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        if let Some(mut count) = self.seen.get(base).copied() {
            loop {
                count += 1;
                candidate = format!("{}-{}", base, count);
                if !self.seen.contains_key(&candidate) {
                    break;
                }
            }
            self.seen.insert(base.to_string(), count);
        }
        self.seen.insert(candidate.clone(), 0);
        candidate
    }
}
