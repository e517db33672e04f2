//! Core traits for the petsensor system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`Transport`]: Perform the upstream HTTP call
//! - [`DocumentStore`]: Persist small JSON documents by key
//! - [`Sensor`]: The public record-producer contract

pub mod transport;
pub mod document_store;
pub mod sensor;

pub use transport::{Transport, TransportResponse};
pub use document_store::DocumentStore;
pub use sensor::Sensor;
