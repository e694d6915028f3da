//! # Exam Question Entry
//!
//! 试题录入与导出：按题组维护题目、调整顺序，导出时规范化富文本、
//! 提取内嵌图片，生成 CSV 并打包为压缩包
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露能力，不含业务规则
//! - `IdGenerator` - 唯一 ID 生成
//! - `SnapshotStore` - 快照持久化（JSON 文件 / 内存）
//! - `ArchiveBuilder` - 压缩包组装
//!
//! ### ② 模型层（Models）
//! - `models/` - 考试、题组、题目、快照以及快照加载
//!
//! ### ③ 存储层（Store）
//! - `QuestionStore` - 所有录入操作的唯一入口，校验在任何修改之前完成
//! - `reorder` - 组内 order 连续化、上下移动、跨组移动
//!
//! ### ④ 业务能力层（Services）
//! - `Normalizer` - 富文本规范化，每条规则可单独关闭
//! - `ImageExtractor` - 内嵌图片换成占位符
//! - `csv_serializer` - 全字段加引号的 CSV 与后端请求体
//! - `preview` - 纯文本预览、大纲与状态栏
//!
//! ### ⑤ 流程层（Workflow）
//! - `ExportFlow` - 快照 → 规范化 → 图片提取 → CSV → 压缩包
//!
//! ### ⑥ 编排层（App）
//! - `App` - 读取配置、加载快照、写出导出文件
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AnswerType, Exam, Question, QuestionInput, QuestionSet, StoreSnapshot};
pub use services::{AssetPackage, ImageExtractor, NormalizeOptions, Normalizer};
pub use store::{QuestionStore, StoreEvent};
pub use workflow::{ExportBundle, ExportFlow};
