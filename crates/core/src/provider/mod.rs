pub mod perplexity;
mod perplexity_types;
pub mod scripted;

use std::sync::Arc;

use tracing::instrument;

use crate::config::ResolvedConfig;
use crate::search::SearchProvider;

/// Builds the search provider for a resolved configuration.
#[instrument(skip(config))]
pub fn get_search_provider(config: &ResolvedConfig) -> Arc<dyn SearchProvider> {
    Arc::new(perplexity::PerplexityProvider::new(
        &config.base_url,
        &config.api_key,
    ))
}
