//! The retention recorder: writes a manifest for every successful
//! blue/green migration.

use searchctl_core::{AliasState, CtlResult};
use std::path::{Path, PathBuf};

/// Writes `reports/reindex/{utc_timestamp}_{targetIndex}/manifest.md`.
pub struct RetentionRecorder {
    reports_dir: PathBuf,
}

impl RetentionRecorder {
    #[must_use]
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    /// Record a completed migration, returning the manifest path.
    ///
    /// # Errors
    /// Propagates filesystem write failures.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        timestamp: chrono::DateTime<chrono::Utc>,
        source_index: &str,
        target_index: &str,
        alias_before: &AliasState,
        source_count: u64,
        target_count: u64,
    ) -> CtlResult<PathBuf> {
        let stamp = timestamp.format("%Y%m%dT%H%M%SZ");
        let dir = self
            .reports_dir
            .join("reindex")
            .join(format!("{stamp}_{target_index}"));
        std::fs::create_dir_all(&dir)?;

        let manifest_path = dir.join("manifest.md");
        let body = format!(
            "# Reindex manifest\n\n\
            - timestamp: {timestamp}\n\
            - source index: {source_index}\n\
            - target index: {target_index}\n\
            - previous read targets: {read:?}\n\
            - previous write targets: {write:?}\n\
            - source count: {source_count}\n\
            - target count: {target_count}\n\n\
            The previous index ({source_index}) is retained; it is not deleted by this migration and remains available for rollback.\n",
            timestamp = timestamp.to_rfc3339(),
            read = alias_before.read_targets,
            write = alias_before.write_targets,
        );
        std::fs::write(&manifest_path, body)?;
        Ok(manifest_path)
    }

    #[must_use]
    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn manifest_contains_expected_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = RetentionRecorder::new(tmp.path().join("reports"));
        let alias_before = AliasState::new(vec!["docs_v1".into()], vec!["docs_v1".into()]);
        let timestamp = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        let path = recorder
            .record(timestamp, "docs_v1", "docs_v2", &alias_before, 10, 10)
            .unwrap();

        assert!(path.exists());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("docs_v1"));
        assert!(contents.contains("docs_v2"));
        assert!(contents.contains("retained"));
        assert!(path.to_string_lossy().contains("20260102T030405Z_docs_v2"));
    }
}
