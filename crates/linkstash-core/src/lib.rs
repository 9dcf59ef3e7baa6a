//! Core types and traits for the linkstash URL shortener.
//!
//! This crate provides the link entity, the storage error taxonomy and the
//! [`Repository`] contract shared by every storage engine and by the
//! shortener service.

pub mod deadline;
pub mod entity;
pub mod error;
pub mod repository;

pub use entity::LinkEntity;
pub use error::{Result, StorageError};
pub use repository::Repository;
