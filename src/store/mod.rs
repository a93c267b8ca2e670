//! Profile and secret persistence.

pub mod profile;
pub mod secret;

pub use profile::{JsonFileProfileStore, ProfileMap, ProfileStore};
pub use secret::{KeyringSecretStore, MemorySecretStore, SecretKey, SecretStore};
