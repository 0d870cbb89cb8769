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
#![allow(clippy::redundant_pub_crate)]

//! Action invoker backed by the OpenWhisk REST API.
//!
//! Layout:
//! - `action.rs`: fully qualified action name parsing
//! - `openwhisk.rs`: non-blocking invocation client and API key handling
//! - `error.rs`: construction and per-invocation error types

pub mod action;
pub mod error;
pub mod openwhisk;

pub use action::ActionName;
pub use error::{InvokerError, InvokerResult};
pub use openwhisk::{ApiKey, DEFAULT_NAMESPACE, OpenWhiskInvoker};
