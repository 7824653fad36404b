//! What the janitor sweeps, and what time it thinks it is.

use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

/// Time source for staleness decisions.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Metadata the janitor needs about one directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub is_dir: bool,
    pub modified: SystemTime,
}

/// One listed entry. A stat failure is reported per entry so one bad entry
/// does not hide the rest.
#[derive(Debug)]
pub struct Listing {
    pub name: String,
    pub meta: io::Result<EntryMeta>,
}

/// A flat collection of named files that can be listed and removed.
pub trait SweepTarget: Send + Sync + 'static {
    fn list(&self) -> io::Result<Vec<Listing>>;
    /// Fresh metadata for one entry.
    fn stat(&self, name: &str) -> io::Result<EntryMeta>;
    fn remove(&self, name: &str) -> io::Result<()>;
}

/// The storage directory, non-recursive.
#[derive(Debug, Clone)]
pub struct DirTarget {
    dir: PathBuf,
}

impl DirTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SweepTarget for DirTarget {
    fn list(&self) -> io::Result<Vec<Listing>> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(dir = %self.dir.display(), "failed to read directory entry: {}", e);
                    continue;
                }
            };
            let name = match entry.file_name().into_string() {
                Ok(n) => n,
                // Not valid UTF-8, so never one of ours.
                Err(_) => continue,
            };
            let meta = entry.metadata().and_then(|m| entry_meta(&m));
            out.push(Listing { name, meta });
        }
        Ok(out)
    }

    fn stat(&self, name: &str) -> io::Result<EntryMeta> {
        entry_meta(&std::fs::symlink_metadata(self.dir.join(name))?)
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        std::fs::remove_file(self.dir.join(name))
    }
}

fn entry_meta(m: &std::fs::Metadata) -> io::Result<EntryMeta> {
    Ok(EntryMeta {
        is_dir: m.is_dir(),
        modified: m.modified()?,
    })
}
