use crate::error::{AppError, AppResult, PersistenceError};
use crate::models::snapshot::StoreSnapshot;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 快照文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Toml,
}

impl SnapshotFormat {
    /// 根据扩展名判断格式
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(SnapshotFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Some(SnapshotFormat::Toml),
            _ => None,
        }
    }
}

/// 解析快照文本
pub fn parse_snapshot(content: &str, format: SnapshotFormat) -> AppResult<StoreSnapshot> {
    let snapshot = match format {
        SnapshotFormat::Json => {
            serde_json::from_str(content).map_err(PersistenceError::Json)?
        }
        SnapshotFormat::Toml => toml::from_str(content).map_err(PersistenceError::Toml)?,
    };
    Ok(snapshot)
}

/// 从 JSON / TOML 文件加载快照
pub async fn load_snapshot(path: &Path) -> AppResult<StoreSnapshot> {
    let format = SnapshotFormat::from_path(path).ok_or_else(|| {
        AppError::Persistence(PersistenceError::UnsupportedFormat {
            path: path.display().to_string(),
        })
    })?;

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::persistence_io(path.display().to_string(), e))?;

    let snapshot = parse_snapshot(&content, format)?;
    Ok(snapshot.with_file_path(path.to_string_lossy().to_string()))
}

/// 从文件夹中加载所有快照文件
///
/// 单个文件解析失败时记录警告并跳过
pub async fn load_all_snapshots(folder_path: &Path) -> AppResult<Vec<StoreSnapshot>> {
    let folder = PathBuf::from(folder_path);
    let folder_display = folder.display().to_string();

    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::persistence_io(folder_display.clone(), e))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::persistence_io(folder_display.clone(), e))?
    {
        let path = entry.path();
        if SnapshotFormat::from_path(&path).is_some() {
            paths.push(path);
        }
    }
    // read_dir 顺序不固定
    paths.sort();

    let mut snapshots = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_snapshot(&path).await {
            Ok(snapshot) => {
                tracing::info!("成功加载 {} 个题目", snapshot.questions.len());
                snapshots.push(snapshot);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_SNAPSHOT: &str = r#"
current_set_id = "s1"

[exam]
subject = "Computer Science"
exam_code = "M22"

[[sets]]
id = "s1"
label = "Q1"
section = "A"

[[questions]]
id = "q1"
set_id = "s1"
path = "1a"
answer_type = 1
text_body = "<p>What is X?</p>"
mark_scheme = "<p>Award 1 mark</p>"
marks = 1
order = 1
"#;

    #[test]
    fn test_parse_toml_snapshot() {
        let snapshot = parse_snapshot(TOML_SNAPSHOT, SnapshotFormat::Toml).unwrap();
        assert_eq!(snapshot.exam.exam_code, "M22");
        assert_eq!(snapshot.sets.len(), 1);
        assert_eq!(snapshot.questions[0].marks, 1);
        assert!(!snapshot.questions[0].needs_context);
        assert_eq!(snapshot.current_set_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SnapshotFormat::from_path(Path::new("a/b.JSON")),
            Some(SnapshotFormat::Json)
        );
        assert_eq!(SnapshotFormat::from_path(Path::new("b.txt")), None);
    }

    #[tokio::test]
    async fn test_load_all_snapshots_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), TOML_SNAPSHOT).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let snapshots = load_all_snapshots(dir.path()).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0]
            .file_path
            .as_deref()
            .unwrap()
            .ends_with("good.toml"));
    }

    #[test]
    fn test_load_snapshot_rejects_unknown_extension() {
        let err = tokio_test::block_on(load_snapshot(Path::new("snapshot.yaml"))).unwrap_err();
        assert!(matches!(
            err,
            AppError::Persistence(PersistenceError::UnsupportedFormat { .. })
        ));
    }
}
