pub mod config;
pub mod logger;
pub mod settings;

pub use config::*;
pub use logger::{Colors, setup_logging};
pub use settings::{Settings, resolve_settings};
