//! The alias manager: atomic switching of the `docs_read`/
//! `docs_write` alias pair.

use searchctl_core::{AliasState, CtlError, CtlResult};
use searchctl_engine::{AliasAction, EngineClient, READ_ALIAS, WRITE_ALIAS};

/// Owns the `docs_read`/`docs_write` alias pair against a single engine.
pub struct AliasManager<'a> {
    engine: &'a dyn EngineClient,
}

impl<'a> AliasManager<'a> {
    #[must_use]
    pub fn new(engine: &'a dyn EngineClient) -> Self {
        Self { engine }
    }

    /// Point both aliases at `target` in one atomic transaction.
    /// Used both for first-time bootstrap and for blue/green switches.
    ///
    /// # Errors
    /// Returns [`CtlError::NotFound`] if `target` does not exist, or
    /// propagates the engine's transaction failure.
    pub async fn switch_to_index(&self, target: &str) -> CtlResult<()> {
        if !self.engine.index_exists(target).await? {
            return Err(CtlError::NotFound(format!(
                "cannot switch aliases to missing index: {target}"
            )));
        }

        self.engine
            .update_aliases(&[
                AliasAction::RemoveFromAny {
                    alias: READ_ALIAS.to_string(),
                },
                AliasAction::RemoveFromAny {
                    alias: WRITE_ALIAS.to_string(),
                },
                AliasAction::Add {
                    alias: READ_ALIAS.to_string(),
                    index: target.to_string(),
                    is_write_index: false,
                },
                AliasAction::Add {
                    alias: WRITE_ALIAS.to_string(),
                    index: target.to_string(),
                    is_write_index: true,
                },
            ])
            .await
    }

    /// Alias of [`Self::switch_to_index`] for first-time bootstrap, kept as
    /// a distinct name since the caller's intent differs.
    ///
    /// # Errors
    /// See [`Self::switch_to_index`].
    pub async fn bootstrap(&self, target: &str) -> CtlResult<()> {
        self.switch_to_index(target).await
    }

    /// The indices currently bound to each alias.
    ///
    /// # Errors
    /// Propagates engine lookup failures.
    pub async fn current_alias_state(&self) -> CtlResult<AliasState> {
        let read_targets = self.engine.alias_targets(READ_ALIAS).await?;
        let write_targets = self.engine.alias_targets(WRITE_ALIAS).await?;
        Ok(AliasState::new(read_targets, write_targets))
    }
}
