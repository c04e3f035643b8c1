//! File-backed storage adapters
//!
//! - [`LocalImageAssetStore`]: panel images under `<data_dir>/images`
//! - [`FileComicStore`]: comic records under `<data_dir>/comics/<id>.json`
//!   plus a metadata index at `<data_dir>/index.json`

mod comics;
mod export;
mod images;

pub use comics::FileComicStore;
pub use images::LocalImageAssetStore;

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `bytes` to a sibling temp file, then rename over `path`
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp = path.with_file_name(format!(
        ".{}.{}-{}.tmp",
        file_name.to_string_lossy(),
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}
