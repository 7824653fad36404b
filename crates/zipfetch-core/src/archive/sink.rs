//! Archive sinks: memory buffer for one-shot responses, files for named archives.

use super::{ArchiveBuilder, ArchiveError, BuildReport};
use crate::downloader::DownloadResult;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use zip::ZipWriter;

/// Build a whole archive in memory and return its bytes with the report.
pub fn build_in_memory(results: &[DownloadResult]) -> Result<(Vec<u8>, BuildReport), ArchiveError> {
    let mut builder = ArchiveBuilder::new(Cursor::new(Vec::new()));
    builder.add_results(results);
    let (cursor, report) = builder.finish()?;
    Ok((cursor.into_inner(), report))
}

/// Open an existing archive file for appending entries.
///
/// The file must exist. An empty file (fresh from create) gets a new
/// container; otherwise the existing central directory is loaded so earlier
/// entries survive the rewrite.
pub fn open_for_append(path: &Path) -> Result<ArchiveBuilder<File>, ArchiveError> {
    let file = File::options().read(true).write(true).open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(ArchiveBuilder::new(file));
    }
    let zip = ZipWriter::new_append(file).map_err(ArchiveError::Unreadable)?;
    Ok(ArchiveBuilder::from_writer(zip))
}
