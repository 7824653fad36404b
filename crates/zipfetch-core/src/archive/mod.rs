//! Zip assembly from a fetched batch.
//!
//! One entry per successful result, named by its sanitized filename. Failed
//! results become `{url, error}` records instead. The sink is either a memory
//! buffer (returned once as a response body) or an open archive file.

mod policy;
mod sink;

pub use policy::Disposition;
pub use sink::{build_in_memory, open_for_append};

use crate::downloader::DownloadResult;
use serde::{Deserialize, Serialize};
use std::io::{Seek, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One failed URL as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub url: String,
    pub error: String,
}

/// What happened while staging a batch into an archive.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Entries written by this batch.
    pub added: usize,
    /// Failed items, in batch order.
    pub errors: Vec<ErrorEntry>,
}

impl BuildReport {
    pub fn has_success(&self) -> bool {
        self.added > 0
    }

    pub fn disposition(&self) -> Disposition {
        Disposition::from_report(self)
    }
}

/// Container-level failures. Entry-level problems go into `BuildReport`.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("failed to finalize zip: {0}")]
    Finalize(#[source] ZipError),
    #[error("existing archive is not a readable zip: {0}")]
    Unreadable(#[source] ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Appends batch results to a zip container over `W`.
pub struct ArchiveBuilder<W: Write + Seek> {
    zip: ZipWriter<W>,
    report: BuildReport,
}

impl<W: Write + Seek> ArchiveBuilder<W> {
    /// Start a fresh container over `sink`.
    pub fn new(sink: W) -> Self {
        Self::from_writer(ZipWriter::new(sink))
    }

    pub(crate) fn from_writer(zip: ZipWriter<W>) -> Self {
        Self {
            zip,
            report: BuildReport::default(),
        }
    }

    /// Stage every result: successes as entries, failures as error records.
    pub fn add_results(&mut self, results: &[DownloadResult]) {
        for result in results {
            let outcome = match &result.outcome {
                Ok(content) => self.add_entry(&result.filename, content),
                Err(e) => Err(e.to_string()),
            };
            match outcome {
                Ok(()) => self.report.added += 1,
                Err(error) => self.report.errors.push(ErrorEntry {
                    url: result.url.clone(),
                    error,
                }),
            }
        }
    }

    fn add_entry(&mut self, name: &str, content: &[u8]) -> Result<(), String> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip
            .start_file(name, options)
            .map_err(|e| format!("failed to add to zip: {}", e))?;
        self.zip
            .write_all(content)
            .map_err(|e| format!("failed to write to zip: {}", e))?;
        Ok(())
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Write the central directory and hand back the sink. A failure here is
    /// fatal for the whole archive, however many entries were staged.
    pub fn finish(mut self) -> Result<(W, BuildReport), ArchiveError> {
        let sink = self.zip.finish().map_err(ArchiveError::Finalize)?;
        Ok((sink, self.report))
    }
}
