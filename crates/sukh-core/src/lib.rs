pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::SukhConfig;
pub use error::{Result, SukhError};
pub use events::SessionEvent;
pub use types::*;
