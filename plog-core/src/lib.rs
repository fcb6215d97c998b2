//! # plog-core
//!
//! Core library for the plog documentation pipeline.
//!
//! This crate provides the building blocks for turning a tree of markdown
//! files into component documents: the in-memory file tree, sidebar
//! navigation derived from it, markdown conversion and the HTML passes
//! (class injection, image rebasing) applied to each document.

pub mod config;
pub mod markdown;
pub mod navigation;
pub mod slug;
pub mod tree;

pub use config::{Config, ConfigError};
pub use markdown::{Heading, MarkdownProcessor, Mappings, RenderedMarkdown};
pub use navigation::{NavEntry, NavigationCache};
pub use slug::slugify;
pub use tree::{FileTree, Node, NodeId, NodeKind, ScanOrder, TreeError};
