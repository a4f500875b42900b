//! Configuration module for the inventory sync.
//! Reads settings from the environment and wires the application dependencies.
mod dependencies;
mod settings;

pub use dependencies::{Dependencies, StoreSource};
pub use settings::Settings;
