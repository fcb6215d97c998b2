//! Rendering of a single markdown document into a component document.

use crate::templates::DocumentTemplate;
use askama::Template;
use plog_core::markdown::{add_classes, rebase_image_links, AssetError, MappingError};
use plog_core::slug::display_name;
use plog_core::{Mappings, MarkdownProcessor, NavEntry};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("Failed to serialize document data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to render document template: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered component document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub text: String,
    /// Images copied into the asset directory while rendering.
    pub assets: usize,
}

/// Renders markdown documents with a fixed class mapping and asset store.
pub struct DocumentRenderer {
    processor: MarkdownProcessor,
    mappings: Mappings,
    asset_dir: PathBuf,
}

impl DocumentRenderer {
    pub fn new(mappings: Mappings, asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            processor: MarkdownProcessor::new(),
            mappings,
            asset_dir: asset_dir.into(),
        }
    }

    /// Read `source_path` from disk and render it.
    pub fn render_file(
        &self,
        source_path: &Path,
        navigation: Option<&NavEntry>,
    ) -> Result<RenderedDocument, RenderError> {
        let markdown = fs::read_to_string(source_path).map_err(|source| RenderError::Read {
            path: source_path.to_path_buf(),
            source,
        })?;
        self.render(&markdown, source_path, navigation)
    }

    /// Render `markdown`, which was read from `source_path`.
    ///
    /// The source path determines the title and the base for relative
    /// image references. A bad mapping or a missing image aborts the render.
    pub fn render(
        &self,
        markdown: &str,
        source_path: &Path,
        navigation: Option<&NavEntry>,
    ) -> Result<RenderedDocument, RenderError> {
        let rendered = self.processor.convert(markdown);
        let html = add_classes(&rendered.html, &self.mappings)?;
        let rebased = rebase_image_links(&html, source_path, &self.asset_dir)?;

        let title = document_title(source_path);
        let template =
            DocumentTemplate::new(&title, rebased.html, &rendered.headings, navigation)?;
        Ok(RenderedDocument {
            text: template.render()?,
            assets: rebased.copied,
        })
    }
}

/// Title shown above a document: its file name without extension, hyphens
/// replaced by spaces.
pub fn document_title(source_path: &Path) -> String {
    let stem = source_path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    display_name(&stem)
}
