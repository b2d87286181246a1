//! Character Forge - fictional character generation
//!
//! Characters come either from local data tables or from a remote
//! text-generation service whose loosely structured replies are normalized
//! into fixed records.

pub mod core;
pub mod data;
pub mod generator;
pub mod history;
pub mod llm;
pub mod session;

pub use crate::core::{CharacterRecord, ForgeError, Gender, Generated, Mode};
pub use crate::session::Session;
