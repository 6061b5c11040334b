// Library interface for CalTrak modules
// The CLI and the integration tests both go through this crate root

pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod metabolic;
pub mod milestones;
pub mod models;
pub mod session;
pub mod units;
pub mod validation;

// Re-export commonly used types for convenience
pub use models::*;
pub use metabolic::{compute, MetabolicCalculator};
pub use session::{InMemorySessionStore, JsonSessionFile, Session, SessionId, SessionStore};
pub use validation::{InputValidator, ValidationError, ValidationIssue};
pub use error::{CaltrakError, Result};
pub use logging::{DiagnosticReport, LogConfig, LogFormat, LogLevel};
