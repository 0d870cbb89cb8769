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

//! Run parameters for the ingest job.
//!
//! Layout: `keys.rs` (parameter names and defaults), `error.rs`
//! (`ConfigError`), `loader.rs` (parameter documents and layered lookup),
//! `model.rs` (`IngestConfig` and its validation).

pub mod error;
pub mod keys;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ParameterSource, Parameters, parse_params, read_params_file};
pub use model::{IngestConfig, RuntimeSettings};
