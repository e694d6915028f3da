//! 导出日志写入服务 - 业务能力层
//!
//! 只负责"把导出过程中的警告追加到日志文件"能力，不关心流程

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

/// 导出日志写入服务
///
/// 职责：
/// - 记录无法解码而被跳过的图片
/// - 记录每次导出的结果摘要
pub struct ExportLogWriter {
    log_file_path: String,
}

impl ExportLogWriter {
    /// 使用默认文件 `export_log.txt`
    pub fn new() -> Self {
        Self {
            log_file_path: "export_log.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.log_file_path
    }

    /// 追加一行警告
    ///
    /// # 参数
    /// - `exam_code`: 考试代码
    /// - `message`: 警告内容
    pub fn write(&self, exam_code: &str, message: &str) -> Result<()> {
        debug!("写入导出日志: {} | {}", exam_code, message);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)?;

        let line = format!(
            "[{}] {} | {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            exam_code,
            message
        );
        file.write_all(line.as_bytes())?;

        Ok(())
    }

    /// 追加多行警告
    pub fn write_all<'a>(
        &self,
        exam_code: &str,
        messages: impl IntoIterator<Item = &'a String>,
    ) -> Result<usize> {
        let mut written = 0;
        for message in messages {
            self.write(exam_code, message)?;
            written += 1;
        }
        Ok(written)
    }
}

impl Default for ExportLogWriter {
    fn default() -> Self {
        Self::new()
    }
}
