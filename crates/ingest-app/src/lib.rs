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

//! Ingest job wiring.
//!
//! Layout: `cli.rs` (arguments), `bootstrap.rs` (client, adapters, and the
//! run itself), `error.rs` (`AppError` and exit codes).

pub mod bootstrap;
pub mod cli;
pub mod error;

pub use bootstrap::{execute, outcome_document, run};
pub use cli::Cli;
pub use error::{AppError, AppResult, EXIT_CONFIGURATION, EXIT_FAILURE};
