//! Services layer for the app. Uses plexsearch_core to run search turns for
//! the cli.
pub mod session;
