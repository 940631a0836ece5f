//! Shared service plumbing: error type, configuration, module trait and
//! small helpers used by every crate in the workspace.

pub mod config;
pub mod error;
pub mod module;
pub mod types;

pub use config::{
    CodegenConfig, ConfigError, FixtureConfig, RetentionConfig, ServiceConfig, TimeoutConfig,
};
pub use error::ServiceError;
pub use module::Module;
pub use types::{new_id, now_rfc3339, short_id, ListResult};
