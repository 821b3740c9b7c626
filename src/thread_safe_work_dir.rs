use crate::workdir::{feedback_modified_secs, WorkDir};
use std::sync::Arc;
use std::sync::RwLock;

#[derive(Clone)]
pub struct ThreadSafeWorkDir {
    pub work_dir: Arc<RwLock<WorkDir>>,
}

impl ThreadSafeWorkDir {
    pub fn new(work_dir: WorkDir) -> Self {
        Self {
            work_dir: Arc::new(RwLock::new(work_dir)),
        }
    }

    /// Reload when feedback.json changed since the last load. A broken
    /// export keeps the previous data in place.
    pub fn check_for_updates(&self) {
        // Read-only snapshot (drops before we take the write lock)
        let (prev_ts, workdir_path) = match self.work_dir.read() {
            Ok(workdir) => (workdir.last_seen_modified, workdir.path.clone()),
            Err(_) => {
                log::error!("work dir lock poisoned, skipping update check");
                return;
            }
        };

        let latest_ts = feedback_modified_secs(&workdir_path);
        if latest_ts <= prev_ts {
            return;
        }

        log::info!("Noticed update for {}", workdir_path.to_string_lossy());
        let replacement = match WorkDir::new(workdir_path.to_path_buf()) {
            Ok(replacement) => replacement,
            Err(e) => {
                log::warn!(
                    "Reload of {} failed, keeping previous data: {}",
                    workdir_path.to_string_lossy(),
                    e
                );
                return;
            }
        };

        match self.work_dir.write() {
            Ok(mut workdir) => *workdir = replacement,
            Err(_) => log::error!("work dir lock poisoned, dropping reload"),
        }
    }
}
