// Core module holding the in-memory configuration session
pub mod store;

pub use store::{ConfigStore, StoreError, StoreResult};
