use std::path::{Path, PathBuf};

use super::{Tape, TapeDetail, UnusedTapes};
use crate::error::{MockError, Result};

const TAPE_EXTENSION: &str = "json";

/// Directory-backed tape storage.
#[derive(Debug, Clone)]
pub struct TapeStore {
    dir: PathBuf,
}

impl TapeStore {
    /// Create a store rooted at `dir`. The directory need not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every tape in the directory, sorted by name.
    ///
    /// Files that do not parse are skipped with a warning. A missing
    /// directory holds no tapes.
    pub fn load_all(&self) -> Result<Vec<Tape>> {
        if !self.dir.exists() {
            tracing::debug!("Tape directory {} does not exist", self.dir.display());
            return Ok(Vec::new());
        }

        let mut tapes = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TAPE_EXTENSION) {
                continue;
            }
            match read_tape(&path) {
                Ok(tape) => tapes.push(tape),
                Err(e) => tracing::warn!("Skipping tape {}: {}", path.display(), e),
            }
        }

        tapes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tapes)
    }

    /// Details of every tape in the directory.
    pub fn details(&self) -> Result<Vec<TapeDetail>> {
        Ok(self.load_all()?.iter().map(Tape::detail).collect())
    }

    /// Names of every tape in the directory.
    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.load_all()?.into_iter().map(|t| t.name).collect())
    }

    /// Find a tape by name.
    pub fn find(&self, name: &str) -> Result<Option<Tape>> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(None);
        }
        read_tape(&path).map(Some)
    }

    /// Write a tape, replacing any tape with the same name.
    pub fn save(&self, tape: &Tape) -> Result<PathBuf> {
        let path = self.path_for(&tape.name)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, serde_json::to_string_pretty(tape)?)?;
        tracing::info!("Recorded tape {}", tape.name);
        Ok(path)
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(MockError::Tape(format!("Invalid tape name: {:?}", name)));
        }
        Ok(self.dir.join(format!("{}.{}", name, TAPE_EXTENSION)))
    }
}

/// Details of the tapes in `dir` that are still unused, sorted by name.
pub fn get_tape_details(dir: &Path, unused: &UnusedTapes) -> Result<Vec<TapeDetail>> {
    Ok(TapeStore::new(dir)
        .details()?
        .into_iter()
        .filter(|detail| unused.contains(&detail.tape))
        .collect())
}

fn read_tape(path: &Path) -> Result<Tape> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MockError::Tape(format!("Invalid tape file name: {}", path.display())))?
        .to_string();

    let content = std::fs::read_to_string(path)?;
    let mut tape: Tape = serde_json::from_str(&content)
        .map_err(|e| MockError::Tape(format!("Failed to parse {}: {}", path.display(), e)))?;
    tape.name = name;
    Ok(tape)
}
