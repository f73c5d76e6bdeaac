//! Core data model, config registry, resource registry, and ambient logging
//! for the Moose runtime. Shared by `moose-gateway`, `moose-streaming`,
//! `moose-workflow`, and `moose-lineage`.

pub mod config;
pub mod error;
pub mod logging;
pub mod management;
pub mod model;
pub mod olap;
pub mod registry;

pub use config::ConfigRegistry;
pub use error::{CoreError, CoreResult};
pub use olap::OlapClient;
pub use registry::ResourceRegistry;
