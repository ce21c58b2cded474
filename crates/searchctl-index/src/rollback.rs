//! The rollback service: a guarded inverse alias switch.

use crate::alias_manager::AliasManager;
use searchctl_core::{AliasState, CtlError, CtlResult};
use searchctl_engine::EngineClient;
use serde::{Deserialize, Serialize};

/// Before/after alias state of a rollback call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackResult {
    pub alias_before: AliasState,
    pub alias_after: AliasState,
}

/// Rolls an alias pair back to a prior index, refusing unless the operator's
/// expectation of "current" matches reality exactly.
pub struct RollbackService<'a> {
    engine: &'a dyn EngineClient,
}

impl<'a> RollbackService<'a> {
    #[must_use]
    pub fn new(engine: &'a dyn EngineClient) -> Self {
        Self { engine }
    }

    /// # Errors
    /// Returns [`CtlError::Conflict`] if the current alias state doesn't
    /// match `current_index` exactly on both read and write targets.
    pub async fn rollback(
        &self,
        current_index: &str,
        rollback_to_index: &str,
    ) -> CtlResult<RollbackResult> {
        let manager = AliasManager::new(self.engine);
        let alias_before = manager.current_alias_state().await?;

        if !alias_before.points_only_to(current_index) {
            return Err(CtlError::Conflict(format!(
                "current alias state does not match expected current index {current_index}: read={:?}, write={:?}",
                alias_before.read_targets, alias_before.write_targets
            )));
        }

        manager.switch_to_index(rollback_to_index).await?;
        let alias_after = manager.current_alias_state().await?;

        Ok(RollbackResult {
            alias_before,
            alias_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchctl_engine::InMemoryEngine;

    #[tokio::test]
    async fn refuses_when_current_index_mismatched() {
        let engine = InMemoryEngine::new();
        engine.create_index("docs_v1", &serde_json::Value::Null).await.unwrap();
        engine.create_index("docs_v2", &serde_json::Value::Null).await.unwrap();
        let manager = AliasManager::new(&engine);
        manager.switch_to_index("docs_v2").await.unwrap();

        let service = RollbackService::new(&engine);
        let result = service.rollback("docs_v1", "docs_v2").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn succeeds_and_switches_back() {
        let engine = InMemoryEngine::new();
        engine.create_index("docs_v1", &serde_json::Value::Null).await.unwrap();
        engine.create_index("docs_v2", &serde_json::Value::Null).await.unwrap();
        let manager = AliasManager::new(&engine);
        manager.switch_to_index("docs_v2").await.unwrap();

        let service = RollbackService::new(&engine);
        let result = service.rollback("docs_v2", "docs_v1").await.unwrap();

        assert!(result.alias_before.points_only_to("docs_v2"));
        assert!(result.alias_after.points_only_to("docs_v1"));
    }
}
