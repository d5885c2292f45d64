//! Concurrent appends and reads against the file corpus

use beamdesign_core::models::{DesignStatus, HistoricalDesign, Material, Provenance};
use beamdesign_store::{DesignCorpus, FileDesignCorpus};
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

fn optimized_row(i: usize) -> HistoricalDesign {
    let width_mm = 40.0 + i as f64;
    HistoricalDesign {
        material: Material::Wood,
        length_mm: 4000.0,
        load_n: 8000.0,
        width_mm,
        height_mm: 250.0,
        volume_mm3: 4000.0 * width_mm * 250.0,
        deflection_mm: Some(12.5),
        status: DesignStatus::Pass,
        provenance: Provenance::Optimized,
        recorded_at: Some(Utc::now()),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_keep_every_row_intact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.csv");
    let corpus = FileDesignCorpus::new(&path);

    let tasks = (0..32).map(|i| {
        let corpus = corpus.clone();
        tokio::spawn(async move { corpus.append(&optimized_row(i)).await })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 33, "header plus one line per append");

    let rows = corpus.load().await.unwrap();
    assert_eq!(rows.len(), 32);
    let widths: HashSet<u64> = rows.iter().map(|r| r.width_mm as u64).collect();
    assert_eq!(widths.len(), 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_during_appends_only_see_whole_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.csv");
    let corpus = FileDesignCorpus::new(&path);
    corpus.append(&optimized_row(0)).await.unwrap();

    let writers = (1..16).map(|i| {
        let corpus = corpus.clone();
        tokio::spawn(async move { corpus.append(&optimized_row(i)).await })
    });
    let readers = (0..16).map(|_| {
        let corpus = corpus.clone();
        tokio::spawn(async move { corpus.load().await })
    });

    let (written, read) = futures::join!(join_all(writers), join_all(readers));
    for result in written {
        result.unwrap().unwrap();
    }
    for result in read {
        let rows = result.unwrap().unwrap();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.material == Material::Wood && r.status.is_pass()));
    }

    assert_eq!(corpus.load().await.unwrap().len(), 16);
}
