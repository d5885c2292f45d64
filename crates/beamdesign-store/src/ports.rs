use async_trait::async_trait;
use beamdesign_core::error::Result;
use beamdesign_core::models::{HistoricalDesign, Material};

/// Port for the append-only historical design corpus
#[async_trait]
pub trait DesignCorpus: Send + Sync {
    /// Load every readable row, in storage order
    async fn load(&self) -> Result<Vec<HistoricalDesign>>;

    /// Append a single row; rows are never edited or removed
    async fn append(&self, row: &HistoricalDesign) -> Result<()>;

    /// Rows of one material whose length is within `tolerance_pct` percent
    async fn query(
        &self,
        material: Material,
        length_mm: f64,
        tolerance_pct: f64,
    ) -> Result<Vec<HistoricalDesign>> {
        let rows = self.load().await?;
        Ok(rows
            .into_iter()
            .filter(|row| row.material == material && row.matches_length(length_mm, tolerance_pct))
            .collect())
    }

    /// Human-readable location, for logs and CLI output
    fn describe(&self) -> String;
}
