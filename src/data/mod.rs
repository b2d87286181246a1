pub mod store;

pub use store::{CategoryTable, DataStore};
