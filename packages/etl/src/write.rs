//! Atomic dataset writing.
//!
//! Output is written to `<target>.tmp.geojson` next to the target and
//! renamed over it only after the write succeeds, so readers never see a
//! partial file and a failed run leaves the previous output in place.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::EtlError;

/// Returns the temporary path used while writing `target`.
#[must_use]
pub fn temp_path(target: &Path) -> PathBuf {
    let mut tmp = OsString::from(target.as_os_str());
    tmp.push(".tmp.geojson");
    PathBuf::from(tmp)
}

/// Writes `target` atomically using `write` to produce the content.
///
/// Parent directories are created when missing. On failure the temporary
/// file is removed and `target` is untouched.
///
/// # Errors
///
/// Returns [`EtlError`] if the directory, temporary file, writer, or
/// rename fails.
pub fn write_atomic<F>(target: &Path, write: F) -> Result<(), EtlError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), EtlError>,
{
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(target);
    let result = File::create(&tmp)
        .map_err(EtlError::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            Ok(())
        })
        .and_then(|()| std::fs::rename(&tmp, target).map_err(EtlError::from));

    if result.is_err()
        && tmp.exists()
        && let Err(e) = std::fs::remove_file(&tmp)
    {
        log::warn!("Failed to remove temporary file {}: {e}", tmp.display());
    }
    result
}

/// Writes a `GeoJSON` feature collection atomically.
///
/// # Errors
///
/// Returns [`EtlError`] if serialization or any file operation fails.
pub fn write_feature_collection(
    target: &Path,
    collection: &geojson::FeatureCollection,
) -> Result<(), EtlError> {
    write_atomic(target, |w| {
        serde_json::to_writer(&mut *w, collection)?;
        Ok(())
    })
}
