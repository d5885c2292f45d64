//! In-memory corpus for development and testing.

use async_trait::async_trait;
use beamdesign_core::error::{BeamdesignError, Result};
use beamdesign_core::models::HistoricalDesign;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::DesignCorpus;

/// In-memory implementation of DesignCorpus
#[derive(Debug, Clone, Default)]
pub struct MemoryDesignCorpus {
    rows: Arc<RwLock<Vec<HistoricalDesign>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryDesignCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<HistoricalDesign>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
            unavailable: Arc::default(),
        }
    }

    /// Make every operation fail with a resource error, as an unreadable file would
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BeamdesignError::resource(self.describe(), "corpus marked unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl DesignCorpus for MemoryDesignCorpus {
    async fn load(&self) -> Result<Vec<HistoricalDesign>> {
        self.check_available()?;
        Ok(self.rows.read().await.clone())
    }

    async fn append(&self, row: &HistoricalDesign) -> Result<()> {
        self.check_available()?;
        row.validate()?;
        self.rows.write().await.push(row.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
