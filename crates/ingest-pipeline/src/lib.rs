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

//! One ingest run: authenticate, list the incoming container, invoke the save
//! action once per file, and fold the outcomes into a single result.

pub mod error;
pub mod pipeline;
pub mod stage;

pub use error::PipelineError;
pub use pipeline::{DispatchPipeline, DispatchRequest, PipelineReport};
pub use stage::Stage;
