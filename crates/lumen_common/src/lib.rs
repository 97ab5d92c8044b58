//! Lumen Common - tool orchestration for a local assistant.
//!
//! Decides when a question needs live data, asks before fetching, strips
//! personal data from anything sent out, and formats what comes back for
//! prompt injection.

pub mod agenda;
pub mod cache;
pub mod config;
pub mod error;
pub mod formatter;
pub mod intent;
pub mod llm;
pub mod orchestrator;
pub mod provider;
pub mod rate_limit;
pub mod sanitizer;
pub mod search;
pub mod settings;
pub mod sports;
pub mod types;
pub mod weather;

pub use config::LumenConfig;
pub use error::{AugmentError, Result};
pub use formatter::{ContextPayload, Formatter};
pub use orchestrator::{Collaborators, SearchOrchestrator};
pub use provider::{FallbackCoordinator, Fetched, Provider};
pub use settings::SettingsStore;
pub use types::*;
