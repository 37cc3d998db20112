pub mod assistant;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod ingestion;
pub mod intent;
pub mod query;
pub mod scoring;
pub mod sensitive;

pub use assistant::{AiProvider, AiResponse, AssistantReply, DataAssistant, GeminiProvider, LocalProvider};
pub use catalog::{Application, Catalog, Column, DataSource, Table};
pub use config::AssistantConfig;
pub use discovery::{discover, search, DiscoveryResponse, SearchHit};
pub use error::{DiscoveryError, ProviderError, Result};
pub use intent::{QueryIntent, SearchType};
pub use scoring::{EntityKind, MatchType, ScoredResult};
pub use sensitive::SensitiveDataType;
