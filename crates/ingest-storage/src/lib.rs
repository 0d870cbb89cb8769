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

//! Object storage adapter for OpenStack Swift containers.
//!
//! Layout:
//! - `swift.rs`: Keystone v3 token exchange and container listing

mod swift;

pub use swift::{DEFAULT_IDENTITY_URL, HEADER_AUTH_TOKEN, HEADER_SUBJECT_TOKEN, SwiftObjectStore};
