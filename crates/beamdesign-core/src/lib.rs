//! Beamdesign Core - Domain models, configuration, and port definitions
//!
//! This crate contains the beam design data model, the conversation phase
//! table, the layered configuration, and the ports that engines, stores and
//! external collaborators (field extraction, intent classification, model
//! loading) implement.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{BeamdesignError, Result};
