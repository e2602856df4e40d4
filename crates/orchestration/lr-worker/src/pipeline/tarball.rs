//! Gzip-compressed tarball writer.

use flate2::Compression;
use flate2::write::GzEncoder;
use lr_error::ArchiveError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::Builder as TarBuilder;

/// Write `files` into a `.tgz` at `dest` and return its size.
///
/// Members are named after the file name alone and appear in the order given.
pub fn build_tarball(files: &[PathBuf], dest: &Path) -> Result<u64, ArchiveError> {
    let build_err = |e: std::io::Error| ArchiveError::Build(format!("{}: {e}", dest.display()));

    let file = File::create(dest).map_err(build_err)?;
    let enc = GzEncoder::new(file, Compression::default());
    let mut tar = TarBuilder::new(enc);

    for path in files {
        let name = path.file_name().ok_or_else(|| {
            ArchiveError::Build(format!("{} has no file name", path.display()))
        })?;
        tar.append_path_with_name(path, name).map_err(build_err)?;
    }

    let enc = tar.into_inner().map_err(build_err)?;
    enc.finish().map_err(build_err)?;

    let size = std::fs::metadata(dest).map_err(build_err)?.len();
    Ok(size)
}

/// [`build_tarball`] on the blocking thread pool.
pub async fn build_tarball_blocking(
    files: Vec<PathBuf>,
    dest: PathBuf,
) -> Result<u64, ArchiveError> {
    tokio::task::spawn_blocking(move || build_tarball(&files, &dest))
        .await
        .map_err(|e| ArchiveError::Join(e.to_string()))?
}
