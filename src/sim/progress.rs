/// Persistent campaign progress: the highest unlocked level.
///
/// ## File format
///   `<save_dir>/progress.dat`, exactly one native-endian `i32`.
///
/// A missing, short or non-positive record reads as level 1 and the file is
/// rewritten so the next start finds a valid one. Records above the
/// campaign length are clamped down.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const PROGRESS_FILE: &str = "progress.dat";

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("could not write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug)]
pub struct Progress {
    path: PathBuf,
    unlocked: u32,
    max_level: u32,
}

impl Progress {
    /// Read the record under `save_dir`, recreating it when unusable.
    /// Write failures during recreation are logged, not returned.
    pub fn load(save_dir: &Path, max_level: u32) -> Progress {
        let max_level = max_level.max(1);
        let path = save_dir.join(PROGRESS_FILE);
        let stored = read_record(&path);

        let progress = Progress {
            path,
            unlocked: stored.map_or(1, |v| (v as u32).min(max_level)),
            max_level,
        };

        if stored.is_none() {
            log::info!("no usable progress at {}, starting at level 1", progress.path.display());
            if let Err(e) = progress.save() {
                log::warn!("{e}");
            }
        } else {
            log::info!("progress loaded: level {} unlocked", progress.unlocked);
        }
        progress
    }

    pub fn unlocked(&self) -> u32 {
        self.unlocked
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raise the unlocked level to `level` and persist. Lower values are
    /// ignored. Returns whether the record changed.
    pub fn unlock(&mut self, level: u32) -> Result<bool, ProgressError> {
        let level = level.min(self.max_level);
        if level <= self.unlocked {
            return Ok(false);
        }
        self.unlocked = level;
        self.save()?;
        log::info!("level {level} unlocked");
        Ok(true)
    }

    /// Write the record, creating the save directory if needed.
    pub fn save(&self) -> Result<(), ProgressError> {
        let io_err = |source: std::io::Error| ProgressError::Io { path: self.path.clone(), source };
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let value = self.unlocked as i32;
        std::fs::write(&self.path, value.to_ne_bytes()).map_err(io_err)
    }
}

/// `Some(level)` for a readable record holding a positive value.
fn read_record(path: &Path) -> Option<i32> {
    let bytes = std::fs::read(path).ok()?;
    let raw: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    let value = i32::from_ne_bytes(raw);
    (value >= 1).then_some(value)
}
