//! One-shot asynchronous load of the symbol dataset.

use crate::dataset::Dataset;
use geojson::GeoJson;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::info;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse GeoJSON in {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },
    #[error("{} holds a bare geometry, not features", path.display())]
    NotACollection { path: PathBuf },
}

pub type LoadResult = Result<Dataset, LoadError>;

/// Read and parse a GeoJSON feature collection
pub async fn load(source: &Path) -> LoadResult {
    let content = tokio::fs::read_to_string(source)
        .await
        .map_err(|e| LoadError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
    let dataset = parse(source, &content)?;
    info!(path = %source.display(), features = dataset.len(), "loaded dataset");
    Ok(dataset)
}

/// Parse GeoJSON text; `source` only labels errors
pub fn parse(source: &Path, content: &str) -> LoadResult {
    let geojson: GeoJson = content.parse().map_err(|e| LoadError::Parse {
        path: source.to_path_buf(),
        source: e,
    })?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(Dataset::from_features(fc.features)),
        GeoJson::Feature(feature) => Ok(Dataset::from_features(vec![feature])),
        GeoJson::Geometry(_) => Err(LoadError::NotACollection {
            path: source.to_path_buf(),
        }),
    }
}

/// Start [`load`] on the runtime; the receiver yields its result once
pub fn spawn_load(runtime: &Handle, source: PathBuf) -> oneshot::Receiver<LoadResult> {
    let (tx, rx) = oneshot::channel();
    runtime.spawn(async move {
        let result = load(&source).await;
        // Receiver gone means the app already quit
        let _ = tx.send(result);
    });
    rx
}
