use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use tokio::sync::Mutex;
use walk_tracker_lib::walk_session::{WalkSession, WalkState};

use crate::{gpx_util, DataManagerError, WalkId};

#[derive(Default)]
struct WalkTable {
    next_id: WalkId,
    current: Option<WalkId>,
    walks: BTreeMap<WalkId, WalkSession>,
}

#[derive(Clone)]
pub struct DataManager {
    walks: Arc<Mutex<WalkTable>>,
    export_dir: Option<PathBuf>,
}

/// The public interface for all walk data management.
///
/// Walks live in memory. When an export directory is given, every closed walk that is
/// saved is also written there as `<walk_id>.gpx`.
impl DataManager {
    pub async fn start(export_dir: Option<PathBuf>) -> Result<Self, DataManagerError> {
        // Create export dir if it doesn't exist
        if let Some(dir) = &export_dir {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await
                    .map_err(|_| DataManagerError::Io(format!("Failed to create export directory: {:?}", dir)))?;
            }
        }

        Ok(DataManager {
            walks: Arc::new(Mutex::new(WalkTable { next_id: 1, ..Default::default() })),
            export_dir,
        })
    }

    /// Registers a new walk and makes it the current one.
    pub async fn create_walk(&self) -> Result<WalkId, DataManagerError> {
        let mut table = self.walks.lock().await;
        let walk_id = table.next_id;
        table.next_id += 1;
        table.walks.insert(walk_id, WalkSession::new());
        table.current = Some(walk_id);

        tracing::info!("Created walk {}", walk_id);
        Ok(walk_id)
    }

    pub async fn current_walk(&self) -> Option<WalkId> {
        self.walks.lock().await.current
    }

    pub async fn save_walk(&self, walk_id: WalkId, session: &WalkSession) -> Result<(), DataManagerError> {
        {
            let mut table = self.walks.lock().await;
            let entry = table.walks.get_mut(&walk_id).ok_or(DataManagerError::UnknownWalk(walk_id))?;
            *entry = session.clone();
        }

        if let (Some(path), WalkState::Closed) = (self.export_path(walk_id), session.state()) {
            let name = match session.started_at() {
                Some(start) => format!("Walk {}", start.format("%d/%m/%Y %H:%M")),
                None => format!("Walk {}", walk_id),
            };
            let session = session.clone();
            let export_to = path.clone();
            tokio::task::spawn_blocking(move || gpx_util::write_gpx(&export_to, &name, &session))
                .await
                .map_err(|err| DataManagerError::Io(format!("Export of walk {} did not finish: {}", walk_id, err)))??;
            tracing::info!("Exported walk {} to {:?}", walk_id, path);
        }

        Ok(())
    }

    pub async fn get_walk(&self, walk_id: WalkId) -> Result<WalkSession, DataManagerError> {
        self.walks.lock().await.walks.get(&walk_id)
            .cloned()
            .ok_or(DataManagerError::UnknownWalk(walk_id))
    }

    pub async fn list_walks(&self) -> Vec<(WalkId, WalkSession)> {
        self.walks.lock().await.walks.iter()
            .map(|(id, walk)| (*id, walk.clone()))
            .collect()
    }

    pub async fn delete_walk(&self, walk_id: WalkId) -> Result<(), DataManagerError> {
        {
            let mut table = self.walks.lock().await;
            table.walks.remove(&walk_id).ok_or(DataManagerError::UnknownWalk(walk_id))?;
            if table.current == Some(walk_id) {
                table.current = None;
            }
        }

        if let Some(path) = self.export_path(walk_id) {
            if path.exists() {
                tokio::fs::remove_file(&path).await
                    .map_err(|_| DataManagerError::Io(format!("Failed to remove {:?}", path)))?;
            }
        }

        tracing::info!("Deleted walk {}", walk_id);
        Ok(())
    }

    fn export_path(&self, walk_id: WalkId) -> Option<PathBuf> {
        self.export_dir.as_ref().map(|dir| dir.join(format!("{}.gpx", walk_id)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use walk_tracker_lib::location_fix::LocationFix;

    use super::*;

    fn closed_walk() -> WalkSession {
        let mut session = WalkSession::new();
        session.start().unwrap();
        session.ingest(LocationFix::new(37.0, -122.0, 5., Utc::now()));
        session.ingest(LocationFix::new(37.001, -122.0, 5., Utc::now()));
        session.stop(false).unwrap();
        session
    }

    #[tokio::test]
    async fn create_save_delete() {
        let data_manager = DataManager::start(None).await.unwrap();
        assert_eq!(data_manager.current_walk().await, None);

        let walk_id = data_manager.create_walk().await.unwrap();
        assert_eq!(data_manager.current_walk().await, Some(walk_id));

        let session = closed_walk();
        data_manager.save_walk(walk_id, &session).await.unwrap();
        assert_eq!(data_manager.get_walk(walk_id).await.unwrap(), session);
        assert_eq!(data_manager.list_walks().await.len(), 1);

        data_manager.delete_walk(walk_id).await.unwrap();
        assert_eq!(data_manager.current_walk().await, None);
        assert!(matches!(data_manager.get_walk(walk_id).await, Err(DataManagerError::UnknownWalk(_))));
        assert!(matches!(data_manager.delete_walk(walk_id).await, Err(DataManagerError::UnknownWalk(_))));
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let data_manager = DataManager::start(None).await.unwrap();
        let first = data_manager.create_walk().await.unwrap();
        data_manager.delete_walk(first).await.unwrap();
        let second = data_manager.create_walk().await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn saving_unknown_walk_fails() {
        let data_manager = DataManager::start(None).await.unwrap();
        assert!(matches!(
            data_manager.save_walk(42, &closed_walk()).await,
            Err(DataManagerError::UnknownWalk(42))
        ));
    }

    #[tokio::test]
    async fn closed_walks_are_exported_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let export_dir = dir.path().join("gpx");
        let data_manager = DataManager::start(Some(export_dir.clone())).await.unwrap();
        assert!(export_dir.exists());

        let walk_id = data_manager.create_walk().await.unwrap();

        let mut active = WalkSession::new();
        active.start().unwrap();
        data_manager.save_walk(walk_id, &active).await.unwrap();
        let file = export_dir.join(format!("{}.gpx", walk_id));
        assert!(!file.exists());

        data_manager.save_walk(walk_id, &closed_walk()).await.unwrap();
        assert!(file.exists());
        assert_eq!(gpx_util::read_gpx(&file, 5.).unwrap().len(), 2);

        data_manager.delete_walk(walk_id).await.unwrap();
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn failed_export_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let export_dir = dir.path().join("gpx");
        let data_manager = DataManager::start(Some(export_dir.clone())).await.unwrap();
        let walk_id = data_manager.create_walk().await.unwrap();

        std::fs::remove_dir_all(&export_dir).unwrap();
        assert!(matches!(
            data_manager.save_walk(walk_id, &closed_walk()).await,
            Err(DataManagerError::Io(_))
        ));

        // The walk itself is still stored
        assert_eq!(data_manager.get_walk(walk_id).await.unwrap().samples().len(), 2);
    }
}
