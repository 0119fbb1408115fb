//! Bulk loading of processed datasets into the store.

use std::path::Path;

use conflict_map_conflict_models::DatasetKind;
use conflict_map_store::documents::build_document;
use conflict_map_store::mapping::mapping;
use conflict_map_store::{BulkReport, ConflictStore, IndexDocument};
use geojson::GeoJson;

use crate::EtlError;

/// Converts a processed `GeoJSON` dataset into index documents.
///
/// # Errors
///
/// Returns [`EtlError`] if the text is not a `GeoJSON` feature collection
/// or a geometry cannot be encoded.
pub fn documents_from_geojson(
    kind: DatasetKind,
    source: &str,
    label: &str,
) -> Result<Vec<IndexDocument>, EtlError> {
    let GeoJson::FeatureCollection(collection) = source.parse::<GeoJson>()? else {
        return Err(EtlError::NotFeatureCollection(label.to_string()));
    };

    collection
        .features
        .into_iter()
        .map(|feature| -> Result<IndexDocument, EtlError> {
            let geometry = feature.geometry.map(serde_json::to_value).transpose()?;
            Ok(build_document(
                kind,
                feature.properties.unwrap_or_default(),
                geometry,
            ))
        })
        .collect()
}

/// Loads one processed dataset file into `index`, creating the index from
/// its embedded mapping when needed.
///
/// # Errors
///
/// Returns [`EtlError`] if the file cannot be read or parsed, or if the
/// index cannot be created. Per-document failures are only counted.
pub async fn load_dataset(
    store: &dyn ConflictStore,
    kind: DatasetKind,
    index: &str,
    path: &Path,
) -> Result<BulkReport, EtlError> {
    let source = std::fs::read_to_string(path)?;
    let documents = documents_from_geojson(kind, &source, &path.display().to_string())?;

    if store.ensure_index(index, &mapping(kind)).await? {
        log::info!("Created index {index} for {kind}");
    }

    log::info!(
        "Indexing {} {kind} documents from {} into {index}",
        documents.len(),
        path.display()
    );
    let report = store.bulk_index(index, &documents).await?;

    if report.failed > 0 {
        log::warn!(
            "Bulk load into {index} finished: {} succeeded, {} failed",
            report.succeeded,
            report.failed
        );
    } else {
        log::info!(
            "Bulk load into {index} finished: {} documents",
            report.succeeded
        );
    }
    Ok(report)
}
