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
#![allow(clippy::module_name_repetitions)]

//! Retrieval of missing WAL segments through an operator-supplied command.
//!
//! Layout:
//! - `path.rs`: canonical segment paths inside the local log directory
//! - `expand.rs`: bounded `%p`/`%f`/`%a`/`%%` template expansion
//! - `exec.rs`: the `CommandExecutor` seam and the host-shell implementation
//! - `service.rs`: `RetrievalService` orchestrating path, expansion and execution
//! - `cleanup.rs`: disposal of previously staged segment copies

pub mod cleanup;
pub mod error;
pub mod exec;
pub mod expand;
pub mod path;
pub mod service;

pub use cleanup::{Cleanup, CleanupReport, Removal};
pub use error::{CleanupError, ExecError, PathError, RetrieveError, RetrieveResult};
pub use exec::{CommandExecutor, CommandStatus, ShellExecutor, StdoutTarget};
pub use expand::{ExpandedCommand, Expander, Placeholders, expand, unknown_placeholders};
pub use path::{CanonicalPath, PathBuilder, native_separators};
pub use service::{Prepared, RetrievalService, RetrievalStage, Retrieved};
