use std::collections::HashSet;

use crate::db::Repository;
use crate::error::Result;

/// Owner of the persisted navigation back stack.
///
/// The housekeeper consults it read-only: any article key preserved here is
/// protected from deletion. A `High` cleanup clears the stack before
/// sweeping.
pub struct NavigationStateController;

impl NavigationStateController {
    pub fn new() -> Self {
        Self
    }

    /// Replaces the persisted back stack, ordered bottom to top.
    pub async fn save_back_stack(&self, repository: &Repository, keys: Vec<String>) -> Result<()> {
        repository.replace_navigation_state(keys).await
    }

    /// Keys for every article preserved in the back stack, or `None` when no
    /// navigation state has been persisted.
    pub async fn all_preserved_article_keys(
        &self,
        repository: &Repository,
    ) -> Result<Option<HashSet<String>>> {
        repository.navigation_state_keys().await
    }

    pub async fn clear(&self, repository: &Repository) -> Result<()> {
        tracing::debug!("clearing persisted navigation state");
        repository.clear_navigation_state().await
    }
}

impl Default for NavigationStateController {
    fn default() -> Self {
        Self::new()
    }
}
