//! Mirrors a markdown tree into a tree of component documents.
//!
//! Every run is a full rebuild: the asset directory and every output
//! directory are deleted and recreated before documents are written.

use crate::document::{DocumentRenderer, RenderError};
use plog_core::markdown::images::asset_link_prefix;
use plog_core::markdown::AssetError;
use plog_core::navigation::resolve_for_document;
use plog_core::{Config, FileTree, Mappings, NavigationCache, NodeKind, ScanOrder, TreeError};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("Asset directory {assets:?} overlaps the output root {output:?}")]
    AssetsInsideOutput { assets: PathBuf, output: PathBuf },

    #[error("Markdown root {source_root:?} overlaps the output root {output:?}")]
    SourceInsideOutput { source_root: PathBuf, output: PathBuf },

    #[error("Asset directory {assets:?} overlaps the markdown root {source_root:?}")]
    AssetsInsideSource { assets: PathBuf, source_root: PathBuf },

    #[error("Filesystem error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render {path:?}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
}

/// Counts reported after a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub documents: usize,
    pub directories: usize,
    /// Images copied into the asset directory
    pub assets: usize,
}

#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// Extension of generated files, without the dot
    pub component_extension: String,
    pub scan_order: ScanOrder,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            component_extension: String::from("vue"),
            scan_order: ScanOrder::default(),
        }
    }
}

/// Render `markdown_root` into `output_root` with default options.
pub fn render(
    markdown_root: &Path,
    output_root: &Path,
    asset_dir: &Path,
    mappings: &Mappings,
) -> Result<RenderSummary, MirrorError> {
    SiteRenderer::new(markdown_root, output_root, asset_dir, mappings.clone()).render()
}

/// One configured markdown-to-component mirror.
pub struct SiteRenderer {
    markdown_root: PathBuf,
    output_root: PathBuf,
    asset_dir: PathBuf,
    mappings: Mappings,
    options: MirrorOptions,
}

impl SiteRenderer {
    pub fn new(
        markdown_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        asset_dir: impl Into<PathBuf>,
        mappings: Mappings,
    ) -> Self {
        Self {
            markdown_root: markdown_root.into(),
            output_root: output_root.into(),
            asset_dir: asset_dir.into(),
            mappings,
            options: MirrorOptions::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.docs_dir(),
            config.output_dir(),
            config.assets_dir(),
            config.mappings.clone(),
        )
        .with_options(MirrorOptions {
            component_extension: config.component_extension.clone(),
            scan_order: config.scan_order,
        })
    }

    pub fn with_options(mut self, options: MirrorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Run the full rebuild. The first error stops the run; documents
    /// written before it stay on disk.
    pub fn render(&self) -> Result<RenderSummary, MirrorError> {
        let tree = FileTree::scan(&self.markdown_root, self.options.scan_order)?;

        asset_link_prefix(&self.asset_dir)?;
        self.check_disjoint()?;
        reset_dir(&self.asset_dir)?;

        let renderer = DocumentRenderer::new(self.mappings.clone(), &self.asset_dir);
        let mut cache = NavigationCache::new();
        let mut summary = RenderSummary::default();

        for id in tree.traverse() {
            let node = tree.node(id);
            let relative = tree.relative_path(id);
            match node.kind() {
                NodeKind::Directory { .. } => {
                    reset_dir(&self.output_root.join(&relative))?;
                    summary.directories += 1;
                }
                NodeKind::File if node.is_markdown() => {
                    let source = if id == tree.root() {
                        self.markdown_root.clone()
                    } else {
                        self.markdown_root.join(&relative)
                    };
                    let target_dir = match relative.parent() {
                        Some(parent) => self.output_root.join(parent),
                        None => self.output_root.clone(),
                    };
                    if id == tree.root() {
                        create_dir(&target_dir)?;
                    }
                    let target = target_dir.join(format!(
                        "{}.{}",
                        node.stem(),
                        self.options.component_extension
                    ));

                    let navigation = resolve_for_document(&tree, id, &mut cache)?;
                    let document = renderer.render_file(&source, navigation).map_err(|err| {
                        MirrorError::Document {
                            path: source.clone(),
                            source: err,
                        }
                    })?;
                    fs::write(&target, &document.text).map_err(|source| MirrorError::Io {
                        path: target.clone(),
                        source,
                    })?;
                    tracing::debug!("Rendered {:?} -> {:?}", source, target);
                    summary.documents += 1;
                    summary.assets += document.assets;
                }
                NodeKind::File => {
                    tracing::trace!("Skipping non-markdown file {:?}", relative);
                }
            }
        }

        tracing::info!(
            "Rendered {} documents in {} directories into {:?} ({} images copied)",
            summary.documents,
            summary.directories,
            self.output_root,
            summary.assets
        );
        Ok(summary)
    }

    /// The markdown root, output root and asset directory are all reset or
    /// read during a run, so none may contain another.
    fn check_disjoint(&self) -> Result<(), MirrorError> {
        let source = resolve(&self.markdown_root);
        let output = resolve(&self.output_root);
        let assets = resolve(&self.asset_dir);

        if overlaps(&source, &output) {
            return Err(MirrorError::SourceInsideOutput {
                source_root: self.markdown_root.clone(),
                output: self.output_root.clone(),
            });
        }
        if overlaps(&assets, &output) {
            return Err(MirrorError::AssetsInsideOutput {
                assets: self.asset_dir.clone(),
                output: self.output_root.clone(),
            });
        }
        if overlaps(&assets, &source) {
            return Err(MirrorError::AssetsInsideSource {
                assets: self.asset_dir.clone(),
                source_root: self.markdown_root.clone(),
            });
        }
        Ok(())
    }
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Absolute form of `path`: the deepest existing ancestor is canonicalized
/// and the missing tail appended, with `.` and `..` folded lexically.
fn resolve(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut tail = Vec::new();
    loop {
        let probe = if existing.as_os_str().is_empty() {
            Path::new(".")
        } else {
            existing
        };
        if let Ok(canonical) = fs::canonicalize(probe) {
            return fold(canonical.components().chain(tail.into_iter().rev()));
        }
        match existing.parent() {
            Some(parent) => {
                tail.extend(existing.components().next_back());
                existing = parent;
            }
            None => return fold(path.components()),
        }
    }
}

fn fold<'a>(components: impl Iterator<Item = Component<'a>>) -> PathBuf {
    let mut out = PathBuf::new();
    for component in components {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Remove `path` if present and recreate it empty.
fn reset_dir(path: &Path) -> Result<(), MirrorError> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|source| MirrorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    create_dir(path)
}

fn create_dir(path: &Path) -> Result<(), MirrorError> {
    fs::create_dir_all(path).map_err(|source| MirrorError::Io {
        path: path.to_path_buf(),
        source,
    })
}
