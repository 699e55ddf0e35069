//! Conf module — engine configuration model and loading.

pub mod model;
pub mod load;

pub use model::{EngineConfig, HistogramConfig};
