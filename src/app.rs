//! 编排层
//!
//! 读取配置、加载快照、逐个导出并写盘

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{load_all_snapshots, load_snapshot, StoreSnapshot};
use crate::services::ExportLogWriter;
use crate::store::QuestionStore;
use crate::utils::logging::{
    init_log_file, log_export_complete, log_snapshots_loaded, log_startup, print_final_stats,
};
use crate::workflow::{ExportBundle, ExportFlow};

/// 应用主结构
pub struct App {
    config: Config,
    flow: ExportFlow,
    export_log: ExportLogWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)
            .with_context(|| format!("无法创建日志文件 {}", config.output_log_file))?;

        log_startup(&config);

        let flow = ExportFlow::from_config(&config).context("导出配置无效")?;
        let export_log = ExportLogWriter::with_path(config.output_log_file.clone());

        Ok(Self {
            config,
            flow,
            export_log,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let snapshots = load_snapshots(&self.config).await?;

        if snapshots.is_empty() {
            warn!("⚠️ 没有找到可导出的快照，程序结束");
            return Ok(());
        }

        let total = snapshots.len();
        let question_total = snapshots.iter().map(|s| s.questions.len()).sum();
        log_snapshots_loaded(total, question_total);

        let mut success = 0;
        let mut failed = 0;
        for snapshot in snapshots {
            let source = snapshot.file_path.clone().unwrap_or_default();
            match self.export_snapshot(snapshot).await {
                Ok(bundle) => {
                    log_export_complete(&bundle);
                    success += 1;
                }
                Err(e) => {
                    error!("❌ 导出失败 {}: {:#}", source, e);
                    failed += 1;
                }
            }
        }

        print_final_stats(success, failed, total, &self.config.output_log_file);
        Ok(())
    }

    /// 导出一个快照
    pub async fn export_snapshot(&self, snapshot: StoreSnapshot) -> Result<ExportBundle> {
        let rule = self.config.exam_code_rule()?;
        // 经过存储恢复，修正悬空题目与 order
        let store = QuestionStore::from_snapshot(snapshot).with_exam_code_rule(rule);

        let bundle = self.flow.run(store.snapshot()).await?;
        let written = bundle
            .write_to(&self.config.output_dir, self.config.write_csv_alongside)
            .await
            .with_context(|| format!("无法写入导出目录 {}", self.config.output_dir))?;

        for path in &written {
            info!("💾 已写入 {}", path.display());
        }

        let exam_code = bundle.exam.exam_code.as_str();
        self.export_log.write_all(exam_code, &bundle.warnings)?;
        self.export_log.write(
            exam_code,
            &format!(
                "导出 {} 道题目，{} 张图片，跳过 {} 张",
                bundle.question_count(),
                bundle.image_count,
                bundle.skipped_images
            ),
        )?;

        Ok(bundle)
    }
}

/// 快照路径可以是单个文件，也可以是目录
async fn load_snapshots(config: &Config) -> Result<Vec<StoreSnapshot>> {
    let path = Path::new(&config.snapshot_path);
    let is_dir = tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    if is_dir {
        Ok(load_all_snapshots(path).await?)
    } else {
        let snapshot = load_snapshot(path)
            .await
            .with_context(|| format!("无法加载快照 {}", config.snapshot_path))?;
        Ok(vec![snapshot])
    }
}
