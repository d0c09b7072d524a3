//! Configuration types.
//!
//! - `EngineOptions`: pool and batching options for connection engines
//! - `StageConfig`: job configuration files with named connections
//!
//! # Security
//! Configuration files may reference secrets through environment variables
//! instead of embedding them.

mod engine;
mod stage;

pub use engine::EngineOptions;
pub use stage::{
    AuthSetting, ConnectionRequest, ConnectionSpec, DriverNames, FieldSource, StageConfig,
};
