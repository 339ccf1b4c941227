//! Fleet state persistence with file locking.
//!
//! Both record stores live in one JSON document. Writers serialize on an
//! exclusive lock over a sidecar `.lock` file and replace the document
//! atomically; every save is checked against the revision the state was
//! loaded at, so a save based on stale data is refused instead of silently
//! overwriting someone else's edit.

use crate::store::RecordStore;
use crate::{Error, OilKind, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the state document inside the data directory
pub const STATE_FILE_NAME: &str = "fleet.json";

/// All tracked records plus bookkeeping for ids and revisions
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FleetState {
    /// Incremented on every successful save
    #[serde(default)]
    pub revision: u64,

    /// Next persisted id to hand out
    #[serde(default = "default_next_id")]
    pub next_id: u64,

    #[serde(default)]
    pub black_oil: RecordStore,

    #[serde(default)]
    pub gear_oil: RecordStore,
}

#[derive(Deserialize)]
struct RevisionProbe {
    #[serde(default)]
    revision: u64,
}

fn default_next_id() -> u64 {
    1
}

impl Default for FleetState {
    fn default() -> Self {
        Self {
            revision: 0,
            next_id: default_next_id(),
            black_oil: RecordStore::new(),
            gear_oil: RecordStore::new(),
        }
    }
}

impl FleetState {
    /// Standard state file location inside a data directory
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(STATE_FILE_NAME)
    }

    pub fn store(&self, kind: OilKind) -> &RecordStore {
        match kind {
            OilKind::Black => &self.black_oil,
            OilKind::Gear => &self.gear_oil,
        }
    }

    pub fn store_mut(&mut self, kind: OilKind) -> &mut RecordStore {
        match kind {
            OilKind::Black => &mut self.black_oil,
            OilKind::Gear => &mut self.gear_oil,
        }
    }

    /// Load fleet state with shared locking
    ///
    /// Returns an empty fleet if the file doesn't exist. A corrupted file is
    /// an error: falling back to an empty fleet would wipe it on next save.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file at {:?}, starting with an empty fleet", path);
            return Ok(Self::default());
        }

        let lock = open_lock(path)?;
        lock.lock_shared()?;

        let mut contents = String::new();
        let read = File::open(path).and_then(|file| {
            std::io::BufReader::new(file).read_to_string(&mut contents)
        });
        lock.unlock()?;
        read?;

        let mut state: FleetState = serde_json::from_str(&contents).map_err(|e| {
            Error::State(format!("Failed to parse state file {:?}: {}", path, e))
        })?;

        // Files written elsewhere may carry a stale remaining distance
        for kind in [OilKind::Black, OilKind::Gear] {
            let fixed = state.store_mut(kind).recompute_all();
            if fixed > 0 {
                tracing::warn!(
                    "Recomputed remaining mileage of {} {} records in {:?}",
                    fixed,
                    kind.label(),
                    path
                );
            }
        }

        // Files edited by hand may carry ids beyond next_id
        let max_id = [OilKind::Black, OilKind::Gear]
            .into_iter()
            .filter_map(|kind| state.store(kind).max_persisted_id())
            .max();
        if let Some(max_id) = max_id {
            if state.next_id <= max_id {
                tracing::warn!(
                    "next_id {} in {:?} is behind id {}, advancing",
                    state.next_id,
                    path,
                    max_id
                );
                state.next_id = max_id + 1;
            }
        }

        tracing::debug!(
            "Loaded fleet state revision {} from {:?}",
            state.revision,
            path
        );
        Ok(state)
    }

    /// Save fleet state with exclusive locking
    ///
    /// 1. Lock `<path>.lock` exclusively
    /// 2. Refuse with `Error::Conflict` if the on-disk revision moved on
    /// 3. Promote temporary ids to persisted ids
    /// 4. Write a temp file, sync, and rename over the original
    ///
    /// `self` is only updated (new ids, bumped revision) once the write has
    /// succeeded.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let dir = parent_dir(path);
        std::fs::create_dir_all(&dir)?;

        let lock = open_lock(path)?;
        lock.lock_exclusive()?;
        let result = self.save_locked(path, &dir);
        lock.unlock()?;
        result
    }

    fn save_locked(&mut self, path: &Path, dir: &Path) -> Result<()> {
        let on_disk = read_revision(path)?;
        if on_disk != self.revision {
            tracing::warn!(
                "Refusing to save {:?}: loaded revision {}, found {}",
                path,
                self.revision,
                on_disk
            );
            return Err(Error::Conflict {
                expected: self.revision,
                found: on_disk,
            });
        }

        let mut next = self.clone();
        let mut next_id = next.next_id;
        let mut promoted = next.black_oil.assign_persisted_ids(&mut next_id);
        promoted.extend(next.gear_oil.assign_persisted_ids(&mut next_id));
        next.next_id = next_id;
        next.revision += 1;

        let temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(&next)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        for (temp_id, id) in &promoted {
            tracing::info!("Record tmp-{} saved as {}", temp_id, id);
        }
        tracing::debug!("Saved fleet state revision {} to {:?}", next.revision, path);

        *self = next;
        Ok(())
    }

    /// Load state, modify it, and save it back
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut FleetState) -> Result<()>,
    {
        let mut state = Self::load(path)?;
        f(&mut state)?;
        state.save(path)?;
        Ok(state)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn open_lock(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))?;
    Ok(file)
}

fn read_revision(path: &Path) -> Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    let contents = std::fs::read_to_string(path)?;
    let probe: RevisionProbe = serde_json::from_str(&contents)
        .map_err(|e| Error::State(format!("Failed to parse state file {:?}: {}", path, e)))?;
    Ok(probe.revision)
}
