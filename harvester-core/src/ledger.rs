// Append-only record of listing ids that earlier runs already processed

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct Ledger {
    path: PathBuf,
    ids: HashSet<String>,
}

impl Ledger {
    /// Read every id in `path`. A missing file is an empty ledger.
    pub fn load(path: &Path) -> io::Result<Self> {
        let ids = match fs::read_to_string(path) {
            Ok(content) => parse_ids(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No ledger at {}, starting fresh", path.display());
                HashSet::new()
            }
            Err(e) => return Err(e),
        };

        info!("Loaded {} processed ids from {}", ids.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            ids,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &HashSet<String> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `id` on disk. The file is opened and closed per call so each
    /// id survives a crash that happens after it. Known ids are not written twice.
    pub fn append(&mut self, id: &str) -> io::Result<()> {
        if self.ids.contains(id) {
            debug!("{} already in ledger", id);
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format!("{}\n", id).as_bytes())?;

        self.ids.insert(id.to_string());
        Ok(())
    }
}

fn parse_ids(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}
