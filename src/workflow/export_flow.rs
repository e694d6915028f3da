//! 导出流程 - 流程层
//!
//! 核心职责：定义"一次导出"的完整流程
//!
//! 流程顺序：
//! 1. 快照按题组名称、组内 order 排序
//! 2. 逐题规范化题干与评分标准
//! 3. 在规范化后的内容树上提取内嵌图片，换成占位符
//! 4. 生成 CSV
//! 5. 后台线程组装压缩包（CSV + images/）
//!
//! 导出只读快照，不接触正在编辑的存储

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppResult, PackagingError, ValidationError};
use crate::infrastructure::{ArchiveBuilder, IdGenerator, UuidGenerator, ZipArchiveBuilder};
use crate::models::{Exam, ExamCodeRule, Question, StoreSnapshot};
use crate::services::csv_serializer::{serialize_questions, ExportPayload};
use crate::services::image_extractor::{AssetPackage, ImageExtractor};
use crate::services::normalizer::Normalizer;

/// 导出结果
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub exam: Exam,
    /// `<考试代码>_questions.csv`
    pub csv_name: String,
    /// `<考试代码>_questions.zip`
    pub archive_name: String,
    pub csv: String,
    pub archive: Vec<u8>,
    /// 规范化、替换图片后的题目（导出顺序）
    pub questions: Vec<Question>,
    pub image_count: usize,
    pub skipped_images: usize,
    /// 需要写入导出日志的警告
    pub warnings: Vec<String>,
}

impl ExportBundle {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// 后端导出 Excel 的请求体
    pub fn payload(&self) -> ExportPayload {
        ExportPayload::from_questions(&self.exam, &self.questions)
    }

    /// 写入目录，返回写出的文件
    pub async fn write_to(
        &self,
        dir: impl AsRef<Path>,
        write_csv_alongside: bool,
    ) -> Result<Vec<PathBuf>, PackagingError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let mut written = Vec::new();
        let archive_path = dir.join(&self.archive_name);
        tokio::fs::write(&archive_path, &self.archive).await?;
        written.push(archive_path);

        if write_csv_alongside {
            let csv_path = dir.join(&self.csv_name);
            tokio::fs::write(&csv_path, &self.csv).await?;
            written.push(csv_path);
        }
        Ok(written)
    }
}

/// 导出流程
///
/// - 编排规范化 → 图片提取 → CSV → 压缩包
/// - 不持有存储，只消费快照
pub struct ExportFlow {
    normalizer: Normalizer,
    exam_code_rule: ExamCodeRule,
}

impl ExportFlow {
    pub fn new(normalizer: Normalizer, exam_code_rule: ExamCodeRule) -> Self {
        Self {
            normalizer,
            exam_code_rule,
        }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let normalizer = Normalizer::new(config.normalize_options())?;
        Ok(Self::new(normalizer, config.exam_code_rule()?))
    }

    pub async fn run(&self, snapshot: StoreSnapshot) -> AppResult<ExportBundle> {
        self.run_with_ids(snapshot, UuidGenerator).await
    }

    /// 指定图片 ID 生成器运行
    pub async fn run_with_ids(
        &self,
        snapshot: StoreSnapshot,
        ids: impl IdGenerator + 'static,
    ) -> AppResult<ExportBundle> {
        let ordered = snapshot.questions_in_export_order();
        if ordered.is_empty() {
            return Err(ValidationError::NothingToExport.into());
        }

        let exam = snapshot.exam.clone();
        if exam.exam_code.trim().is_empty() {
            return Err(ValidationError::MissingExamCode.into());
        }
        // 格式不符只提醒，不阻止导出
        if let Err(e) = self.exam_code_rule.check(&exam.exam_code) {
            warn!("⚠️ {}，请确认后再使用导出文件", e);
        }

        info!("📦 开始导出 {}: {} 道题目", exam.exam_code, ordered.len());

        let mut extractor = ImageExtractor::with_id_generator(ids);
        let mut package = AssetPackage::new();
        let mut warnings = Vec::new();
        let mut questions = Vec::with_capacity(ordered.len());

        for question in ordered {
            let before = extractor.skipped();
            // 图片在规范化后的内容树上提取，题干压平前完成
            let normalized = self
                .normalizer
                .normalize_question_with(question, |nodes| {
                    extractor.extract_nodes(nodes, &mut package)
                });

            let skipped = extractor.skipped() - before;
            if skipped > 0 {
                warnings.push(format!(
                    "题目 {} ({}) 有 {} 张图片无法解码，已跳过",
                    question.path, question.id, skipped
                ));
            }
            debug!("题目 {} 处理完成", question.path);
            questions.push(normalized);
        }

        let csv = serialize_questions(&questions, &exam)?;

        let sanitized = exam.sanitized_code();
        let csv_name = format!("{}_questions.csv", sanitized);
        let archive_name = format!("{}_questions.zip", sanitized);
        let image_count = package.len();

        let archive = {
            let csv = csv.clone();
            let csv_name = csv_name.clone();
            tokio::task::spawn_blocking(move || build_archive(&csv_name, &csv, &package))
                .await
                .map_err(PackagingError::from)??
        };

        info!(
            "✓ 导出完成: {} ({} 道题目, {} 张图片, {} 字节)",
            archive_name,
            questions.len(),
            image_count,
            archive.len()
        );

        Ok(ExportBundle {
            exam,
            csv_name,
            archive_name,
            csv,
            archive,
            questions,
            image_count,
            skipped_images: extractor.skipped(),
            warnings,
        })
    }
}

impl Default for ExportFlow {
    fn default() -> Self {
        Self::new(Normalizer::default(), ExamCodeRule::default())
    }
}

/// 组装压缩包：根目录放 CSV，图片放在 `images/`
fn build_archive(
    csv_name: &str,
    csv: &str,
    package: &AssetPackage,
) -> Result<Vec<u8>, PackagingError> {
    let mut builder = ZipArchiveBuilder::new();
    builder.add_file(csv_name, csv.as_bytes())?;
    for image in package.iter() {
        builder.add_file(&image.archive_path(), &image.bytes)?;
    }
    builder.build()
}
