//! Sample credentials, descriptors, and Swift listing bodies.

use ingest_core::{Credentials, FileDescriptor};
use serde_json::{Value, json};

/// Action identifier used by the production job.
pub const SAVE_ACTION: &str = "/_/openchecks/save-check-images";

/// Container the job lists by default in tests.
pub const INCOMING_CONTAINER: &str = "incoming";

/// Credentials for project `p1` in the Dallas region.
#[must_use]
pub fn sample_credentials() -> Credentials {
    Credentials::new("dallas", "p1", "user-1", "secret")
}

/// `count` check images named `chk1.png`, `chk2.png`, ... with distinct timestamps.
#[must_use]
pub fn sample_files(count: usize) -> Vec<FileDescriptor> {
    (1..=count)
        .map(|index| {
            FileDescriptor::new(
                format!("chk{index}.png"),
                "image/png",
                format!("2017-03-{:02}T{:02}:00:00.000000", index % 28 + 1, index / 28),
            )
        })
        .collect()
}

/// Swift JSON listing body for `files`, including the size and hash keys the
/// service always sends.
#[must_use]
pub fn swift_listing(files: &[FileDescriptor]) -> Value {
    Value::Array(
        files
            .iter()
            .map(|file| {
                json!({
                    "name": file.name,
                    "content_type": file.content_type,
                    "last_modified": file.last_modified,
                    "bytes": 1_024,
                    "hash": format!("hash-{}", file.name)
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn sample_files_have_unique_names() {
        let files = sample_files(3);
        let names: Vec<_> = files.iter().map(|file| file.name.as_str()).collect();
        assert_eq!(names, vec!["chk1.png", "chk2.png", "chk3.png"]);
    }

    #[test]
    fn sample_files_keep_distinct_timestamps_past_nine() {
        let files = sample_files(40);
        let mut stamps: Vec<_> = files.iter().map(|file| file.last_modified.as_str()).collect();
        stamps.sort_unstable();
        stamps.dedup();
        assert_eq!(stamps.len(), 40);
        assert_eq!(files[9].last_modified, "2017-03-11T00:00:00.000000");
    }

    #[test]
    fn swift_listing_decodes_back_into_descriptors() -> Result<()> {
        let files = sample_files(2);
        let decoded: Vec<FileDescriptor> = serde_json::from_value(swift_listing(&files))?;
        assert_eq!(decoded, files);
        Ok(())
    }
}
