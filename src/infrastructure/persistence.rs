//! 快照持久化 - 基础设施层
//!
//! 只负责"保存 / 读取快照"能力，保存失败由调用方决定如何处理

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::error::{AppError, AppResult, PersistenceError};
use crate::models::loaders::snapshot_loader::{parse_snapshot, SnapshotFormat};
use crate::models::StoreSnapshot;

/// 快照持久化能力
pub trait SnapshotStore: Send {
    fn save(&mut self, snapshot: &StoreSnapshot) -> AppResult<()>;
    fn load(&self) -> AppResult<Option<StoreSnapshot>>;
}

/// JSON 文件快照
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&mut self, snapshot: &StoreSnapshot) -> AppResult<()> {
        let json = serde_json::to_string_pretty(snapshot).map_err(PersistenceError::Json)?;

        // 先写临时文件再重命名，避免写到一半留下损坏的快照
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| AppError::persistence_io(tmp_path.display().to_string(), e))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| AppError::persistence_io(self.path.display().to_string(), e))?;

        debug!(
            "快照已保存: {} ({} 个题组, {} 个题目)",
            self.path.display(),
            snapshot.sets.len(),
            snapshot.questions.len()
        );
        Ok(())
    }

    fn load(&self) -> AppResult<Option<StoreSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| AppError::persistence_io(self.path.display().to_string(), e))?;
        let snapshot = parse_snapshot(&content, SnapshotFormat::Json)?;
        Ok(Some(snapshot.with_file_path(self.path.display().to_string())))
    }
}

/// 内存快照，可克隆后共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Option<StoreSnapshot>,
    saves: usize,
    fail_saves: bool,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟存储空间不足：之后的保存全部失败
    pub fn fail_saves(&self, fail: bool) {
        self.state().fail_saves = fail;
    }

    /// 成功保存的次数
    pub fn save_count(&self) -> usize {
        self.state().saves
    }

    /// 最近一次保存的快照
    pub fn latest(&self) -> Option<StoreSnapshot> {
        self.state().snapshot.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&mut self, snapshot: &StoreSnapshot) -> AppResult<()> {
        let mut state = self.state();
        if state.fail_saves {
            return Err(AppError::persistence_io(
                "memory",
                std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded"),
            ));
        }
        state.snapshot = Some(snapshot.clone());
        state.saves += 1;
        Ok(())
    }

    fn load(&self) -> AppResult<Option<StoreSnapshot>> {
        Ok(self.state().snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Exam;

    fn sample_snapshot() -> StoreSnapshot {
        StoreSnapshot {
            exam: Exam::new("Physics", "M22"),
            ..Default::default()
        }
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("state.json"));
        assert!(store.load().unwrap().is_none());

        store.save(&sample_snapshot()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.exam.exam_code, "M22");
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn test_memory_store_failure_mode() {
        let mut store = MemorySnapshotStore::new();
        let observer = store.clone();

        store.save(&sample_snapshot()).unwrap();
        assert_eq!(observer.save_count(), 1);

        observer.fail_saves(true);
        assert!(store.save(&sample_snapshot()).is_err());
        assert_eq!(observer.save_count(), 1);
        assert!(observer.latest().is_some());
    }
}
