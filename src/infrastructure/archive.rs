//! 导出包组装 - 基础设施层
//!
//! 只负责"往压缩包里加文件 / 生成压缩包"能力

use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::error::PackagingError;

/// 压缩包组装能力
pub trait ArchiveBuilder {
    /// 添加一个文件
    ///
    /// # 参数
    /// - `path`: 包内路径（如 `images/xxx.png`）
    /// - `content`: 文件内容
    fn add_file(&mut self, path: &str, content: &[u8]) -> Result<(), PackagingError>;

    /// 生成最终的压缩包字节
    fn build(self) -> Result<Vec<u8>, PackagingError>;
}

/// 基于 zip 的内存压缩包
pub struct ZipArchiveBuilder {
    zip_writer: ZipWriter<Cursor<Vec<u8>>>,
    entries: Vec<String>,
}

impl ZipArchiveBuilder {
    pub fn new() -> Self {
        Self {
            zip_writer: ZipWriter::new(Cursor::new(Vec::new())),
            entries: Vec::new(),
        }
    }

    /// 已添加的文件路径
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    // 图片本身已压缩，直接存储
    fn options_for(path: &str) -> SimpleFileOptions {
        let lower = path.to_ascii_lowercase();
        let already_compressed = [".png", ".jpg", ".gif", ".webp"]
            .iter()
            .any(|ext| lower.ends_with(ext));

        if already_compressed {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
        }
    }
}

impl Default for ZipArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder for ZipArchiveBuilder {
    fn add_file(&mut self, path: &str, content: &[u8]) -> Result<(), PackagingError> {
        self.zip_writer.start_file(path, Self::options_for(path))?;
        self.zip_writer.write_all(content)?;
        self.entries.push(path.to_string());
        Ok(())
    }

    fn build(self) -> Result<Vec<u8>, PackagingError> {
        let cursor = self.zip_writer.finish()?;
        Ok(cursor.into_inner())
    }
}
