//! Local persistence of the remembered team selection.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Holds a single remembered team id across organization switches and restarts.
pub trait SelectionStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, ClientError>;
    fn save(&self, team_id: &str) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

impl<T: SelectionStore + ?Sized> SelectionStore for Arc<T> {
    fn load(&self) -> Result<Option<String>, ClientError> {
        (**self).load()
    }

    fn save(&self, team_id: &str) -> Result<(), ClientError> {
        (**self).save(team_id)
    }

    fn clear(&self) -> Result<(), ClientError> {
        (**self).clear()
    }
}

/// Process-local store. Forgets everything on drop.
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    team_id: Mutex<Option<String>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(team_id: impl Into<String>) -> Self {
        Self {
            team_id: Mutex::new(Some(team_id.into())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, ClientError> {
        self.team_id
            .lock()
            .map_err(|_| ClientError::Storage("selection store lock poisoned".into()))
    }
}

impl SelectionStore for MemorySelectionStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, team_id: &str) -> Result<(), ClientError> {
        *self.lock()? = Some(team_id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.lock()? = None;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSelection {
    active_team_id: Option<String>,
}

/// JSON file store: `{"activeTeamId": "..."}`.
///
/// A missing file reads as no selection.
#[derive(Debug, Clone)]
pub struct FileSelectionStore {
    path: PathBuf,
}

impl FileSelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, selection: &StoredSelection) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(selection)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SelectionStore for FileSelectionStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let stored: StoredSelection = serde_json::from_slice(&bytes)?;
        Ok(stored.active_team_id)
    }

    fn save(&self, team_id: &str) -> Result<(), ClientError> {
        self.write(&StoredSelection {
            active_team_id: Some(team_id.to_string()),
        })
    }

    fn clear(&self) -> Result<(), ClientError> {
        self.write(&StoredSelection {
            active_team_id: None,
        })
    }
}
