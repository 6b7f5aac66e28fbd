pub mod config;
pub mod constants;
pub mod context;
pub mod digest;
pub mod engine;
pub mod errors;
pub mod identity;
pub mod logging;
pub mod process;
pub mod selectors;

pub use config::{AttestationConfig, ConfigLoader, ConfigStore};
pub use context::AttestContext;
pub use engine::{AttestationEngine, AttestationStage};
pub use errors::{AttestError, Result};
pub use selectors::{SelectorKind, SelectorValue};
