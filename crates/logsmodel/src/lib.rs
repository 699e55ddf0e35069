// Domain-driven module structure for the logs model engine.

// Core infrastructure
pub mod error;
pub mod frame;
pub mod text;

// Domain modules
pub mod logs;
pub mod conf;
pub mod runtime;

pub use error::{EngineError, EngineResult};
pub use frame::{DataFrame, Field, FieldType, Labels};
pub use logs::{build_logs_model, build_logs_model_with, LogRowModel, LogsModel};
pub use text::{LogLevel, TimeZoneSpec};
