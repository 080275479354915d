// src/fetch/mod.rs
pub mod reddit;

use crate::error::HarvestError;
use crate::time_policy::SortMethod;
use crate::types::Item;

/// External network client that retrieves raw items from a source. A failed
/// fetch is logged by the orchestrator and the run continues with the next
/// sort method/source.
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(
        &self,
        source: &str,
        sort: SortMethod,
        limit: u32,
    ) -> Result<Vec<Item>, HarvestError>;

    fn name(&self) -> &'static str;
}
