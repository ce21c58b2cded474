//! The blue/green orchestrator: drives a single migration through
//! `CREATE_TARGET -> REINDEX -> VALIDATE -> SWITCH -> RECORD`.

use crate::alias_manager::AliasManager;
use crate::retention::RetentionRecorder;
use crate::validator::{ReindexValidator, ValidationReport};
use searchctl_core::{AliasState, CtlError, CtlResult, Generation, ValidationDefaults};
use searchctl_engine::EngineClient;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A blue/green migration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueGreenRequest {
    pub source_version: u32,
    pub target_version: u32,
    #[serde(default)]
    pub validation: Option<ValidationDefaults>,
    #[serde(default)]
    pub wait_for_completion: bool,
    #[serde(default)]
    pub refresh_after: bool,
}

/// Result of a successful migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueGreenResult {
    pub source_index: String,
    pub target_index: String,
    pub source_count: u64,
    pub target_count: u64,
    pub reindex_took_ms: u64,
    pub failures: Vec<String>,
    pub alias_before: AliasState,
    pub alias_after: AliasState,
    pub validation: ValidationReport,
    pub retention_manifest_path: PathBuf,
}

/// Drives the blue/green state machine for one migration. Owns nothing
/// persistent between calls; each `reindex` call is independent.
pub struct BlueGreenOrchestrator<'a> {
    engine: &'a dyn EngineClient,
    index_template: serde_json::Value,
    default_validation: ValidationDefaults,
    retention: RetentionRecorder,
}

impl<'a> BlueGreenOrchestrator<'a> {
    #[must_use]
    pub fn new(
        engine: &'a dyn EngineClient,
        index_template: serde_json::Value,
        default_validation: ValidationDefaults,
        reports_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            index_template,
            default_validation,
            retention: RetentionRecorder::new(reports_dir),
        }
    }

    /// Run one migration end to end. On validation failure, the alias pair
    /// is left untouched and a `ValidationFailed` error is returned.
    ///
    /// # Errors
    /// Returns `BadRequest` for invalid version pairs, `Conflict` if the
    /// target index already exists, `ValidationFailed` if the validator
    /// rejects the migration, or an engine-sourced error on any step.
    pub async fn reindex(&self, request: BlueGreenRequest) -> CtlResult<BlueGreenResult> {
        if request.source_version == request.target_version {
            return Err(CtlError::BadRequest(
                "sourceVersion must differ from targetVersion".into(),
            ));
        }
        let source = Generation::new(request.source_version)?;
        let target = Generation::new(request.target_version)?;
        let source_index = source.index_name();
        let target_index = target.index_name();

        let alias_manager = AliasManager::new(self.engine);
        let alias_before = alias_manager.current_alias_state().await?;

        if self.engine.index_exists(&target_index).await? {
            return Err(CtlError::Conflict(format!(
                "target index already exists: {target_index}"
            )));
        }
        self.engine
            .create_index(&target_index, &self.index_template)
            .await?;

        let reindex_outcome = self
            .engine
            .reindex(
                &source_index,
                &target_index,
                request.wait_for_completion,
                request.refresh_after,
            )
            .await?;
        if !reindex_outcome.failures.is_empty() {
            return Err(CtlError::engine(
                format!("{source_index}->{target_index}"),
                reindex_outcome.failures.join("; "),
            ));
        }

        let options = request.validation.unwrap_or_else(|| self.default_validation.clone());
        let validator = ReindexValidator::new(self.engine);
        let validation = validator.validate(&source_index, &target_index, &options).await?;
        if !validation.passed {
            return Err(CtlError::ValidationFailed(validation.reasons()));
        }

        alias_manager.switch_to_index(&target_index).await?;
        let alias_after = alias_manager.current_alias_state().await?;

        let source_count = self.engine.count(&source_index).await?;
        let target_count = self.engine.count(&target_index).await?;
        let retention_manifest_path = self.retention.record(
            now(),
            &source_index,
            &target_index,
            &alias_before,
            source_count,
            target_count,
        )?;

        Ok(BlueGreenResult {
            source_index,
            target_index,
            source_count,
            target_count,
            reindex_took_ms: reindex_outcome.took_ms,
            failures: reindex_outcome.failures,
            alias_before,
            alias_after,
            validation,
            retention_manifest_path,
        })
    }
}

fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}
