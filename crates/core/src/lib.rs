mod paths;
mod provider;

pub mod config;
pub mod conversation;
pub mod error;
pub mod search;
pub mod transcript;

pub use crate::paths::get_data_dir;
pub use crate::provider::get_search_provider;
pub use crate::provider::perplexity::{DEFAULT_BASE_URL, PerplexityProvider};
pub use crate::provider::scripted::ScriptedProvider;
