//! # plog-render
//!
//! Component document rendering for plog.
//!
//! This crate turns markdown files into component documents using Askama
//! and mirrors whole markdown trees into an output tree.

pub mod document;
pub mod mirror;
pub mod templates;

pub use document::{document_title, DocumentRenderer, RenderError, RenderedDocument};
pub use mirror::{render, MirrorError, MirrorOptions, RenderSummary, SiteRenderer};
pub use templates::DocumentTemplate;
