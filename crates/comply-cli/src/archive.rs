//! Remote fixture archives.
//!
//! A ZIP of the fixture tree is downloaded into the output directory and
//! unpacked next to it; the fixtures then live under `<out_dir>/tests`.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use url::Url;

/// Directory inside an unpacked archive that holds the fixture tree.
pub const TESTS_DIR: &str = "tests";

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("invalid archive URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive entry '{0}' escapes the output directory")]
    UnsafeEntry(String),

    #[error("unpack task failed: {0}")]
    Task(String),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// File name the archive at `url` is saved under.
pub fn archive_file_name(url: &str) -> Result<String, ArchiveError> {
    let invalid = |reason: &str| ArchiveError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };
    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| invalid("URL has no file name"))
}

/// Downloads the archive at `url` into `out_dir`.
pub async fn fetch_archive(url: &str, out_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let path = out_dir.join(archive_file_name(url)?);
    info!(%url, path = %path.display(), "Downloading fixture archive");

    let download = |source| ArchiveError::Download {
        url: url.to_string(),
        source,
    };
    let response = reqwest::get(url).await.map_err(download)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ArchiveError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let bytes = response.bytes().await.map_err(download)?;

    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(io_error(out_dir))?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(io_error(&path))?;
    debug!(bytes = bytes.len(), "Archive saved");
    Ok(path)
}

/// Unpacks `archive` into `out_dir` and returns the fixture root.
pub async fn unpack_archive(archive: PathBuf, out_dir: PathBuf) -> Result<PathBuf, ArchiveError> {
    tokio::task::spawn_blocking(move || unpack_blocking(&archive, &out_dir))
        .await
        .map_err(|e| ArchiveError::Task(e.to_string()))?
}

fn unpack_blocking(archive: &Path, out_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let file = File::open(archive).map_err(io_error(archive))?;
    let mut zip = zip::ZipArchive::new(file)?;
    fs::create_dir_all(out_dir).map_err(io_error(out_dir))?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| ArchiveError::UnsafeEntry(entry.name().to_string()))?;
        let target = out_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(io_error(&target))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let mut out = File::create(&target).map_err(io_error(&target))?;
        io::copy(&mut entry, &mut out).map_err(io_error(&target))?;
    }

    info!(entries = zip.len(), dir = %out_dir.display(), "Unpacked fixture archive");
    Ok(out_dir.join(TESTS_DIR))
}

/// Downloads and unpacks a remote fixture tree.
pub async fn load_remote(url: &str, out_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let archive = fetch_archive(url, out_dir).await?;
    unpack_archive(archive, out_dir.to_path_buf()).await
}
