//! CLI command implementations.

mod build;
mod watch;

pub use build::build_site;
pub use watch::watch_site;
