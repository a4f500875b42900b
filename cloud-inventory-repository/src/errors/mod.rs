//! Error types for the inventory repository.
mod repository;

pub use repository::RepositoryError;
