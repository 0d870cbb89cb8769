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

//! Binary entrypoint for one ingest run.

use std::process::ExitCode;

use clap::Parser;
use ingest_app::{Cli, run};

/// Parses arguments, performs one run, and reports its outcome on stdout.
#[tokio::main]
async fn main() -> ExitCode {
    run(Cli::parse()).await
}
