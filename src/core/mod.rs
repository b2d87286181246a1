pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, RemoteServiceConfig, Settings};
pub use error::{FaultKind, ForgeError, Result};
pub use types::{Age, CharacterRecord, Gender, Generated, Mode};
