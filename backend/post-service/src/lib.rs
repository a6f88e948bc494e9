/// Post Service Library
///
/// Posts, comments, reactions and the feed visibility engine for the social
/// platform. Accounts and relations are mirrored in from the identity and graph
/// services so visibility can be decided locally.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `services`: Feed assembly, visibility policy, targeting and write paths
/// - `repository`: Store traits and their PostgreSQL implementations
/// - `clients`: Moderation notifier, promotion scheduler, image store
/// - `domain`: Entities and wire types
/// - `middleware`: Bearer-token extractors
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use handlers::{configure, AppState};
