//! Host-facing API: configuration, lifecycle and the engine facade.

mod config;
mod engine;
mod engine_accessors;
mod engine_init;
mod invalidation;
mod lifecycle;

pub use config::{CONFIG_JSON_SCHEMA_V1, ScatterGridConfig, ScatterGridConfigJsonContractV1};
pub use engine::{FrameStats, ScatterGridEngine};
pub use invalidation::{InvalidationMask, InvalidationTopic};
pub use lifecycle::LifecycleState;
