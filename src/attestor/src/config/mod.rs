mod config_loader;
mod store;

pub use config_loader::{AttestationConfig, ConfigLoader};
pub use store::ConfigStore;
