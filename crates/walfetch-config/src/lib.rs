#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Typed configuration for WAL segment retrieval.
//!
//! Layout: `model.rs` (the immutable `RetrieveConfig` snapshot and its knobs),
//! `loader.rs` (YAML/JSON documents plus environment overrides), `validate.rs`
//! (bounds checks applied before a snapshot is handed to the service).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_ARCHIVE_DIR, ENV_LOG_DIR, ENV_RETRIEVE_COMMAND};
pub use model::{EscapeMode, RetrieveConfig, TruncationPolicy};
pub use validate::validate;
