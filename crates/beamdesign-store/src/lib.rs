//! Beamdesign Store - Historical design corpus and steel profile table
//!
//! This crate defines the corpus port and provides the `;`-delimited file
//! adapter used in production and an in-memory adapter for tests.

pub mod codec;
pub mod file;
pub mod memory;
pub mod ports;
pub mod profiles;

pub use file::FileDesignCorpus;
pub use memory::MemoryDesignCorpus;
pub use ports::DesignCorpus;
pub use profiles::ProfileCatalog;
