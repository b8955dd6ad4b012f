//! Core types and trait definitions for the Enrol registration ledger.
//!
//! Participants, field validation, the admission gate, and the storage
//! traits ([`store::RegistryStore`], [`objects::ObjectStore`]) that backends
//! implement. No HTTP or database code lives here.

pub mod error;
pub mod gate;
pub mod objects;
pub mod participant;
pub mod store;
pub mod validation;

pub use error::{Error, Result};
