//! 富文本规范化
//!
//! 导出前对题干和评分标准做的一串修复。内容只解析一次，
//! 每个阶段都在同一棵内容树上修改，都可以通过 [`NormalizeOptions`] 单独关闭：
//!
//! 1. 空白折叠（实体已由解析器解码）
//! 2. 题干路径：去掉只包住虚词的强调、修复标点、处理换行、压平为纯文本（到此返回）
//! 3. 乱码修复
//! 4. 双引号折叠
//! 5. 句间空格与句末补句号
//! 6. 评分标准按分号拆分（仅评分标准）
//! 7. 条件表达式修复
//! 8. 小标题去句号

pub mod entities;
pub mod headers;
pub mod logic_lines;
pub mod mark_scheme;
pub mod mojibake;
pub mod prompt;
pub mod quotes;
pub mod spacing;

use once_cell::sync::Lazy;
use std::fmt;
use tracing::warn;

use crate::error::ConfigError;
use crate::models::{AnswerType, Question};
use crate::services::rich_content::{self, Node};

/// 可单独关闭的修复规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heuristic {
    Entities,
    StopwordEmphasis,
    Mojibake,
    DoubledQuotes,
    SentenceSpacing,
    SentenceCompletion,
    MarkSchemeSegments,
    LogicLines,
    HeaderPeriods,
}

impl Heuristic {
    pub const ALL: [Heuristic; 9] = [
        Heuristic::Entities,
        Heuristic::StopwordEmphasis,
        Heuristic::Mojibake,
        Heuristic::DoubledQuotes,
        Heuristic::SentenceSpacing,
        Heuristic::SentenceCompletion,
        Heuristic::MarkSchemeSegments,
        Heuristic::LogicLines,
        Heuristic::HeaderPeriods,
    ];

    /// 配置中使用的名称
    pub fn name(self) -> &'static str {
        match self {
            Heuristic::Entities => "entities",
            Heuristic::StopwordEmphasis => "stopword_emphasis",
            Heuristic::Mojibake => "mojibake",
            Heuristic::DoubledQuotes => "doubled_quotes",
            Heuristic::SentenceSpacing => "sentence_spacing",
            Heuristic::SentenceCompletion => "sentence_completion",
            Heuristic::MarkSchemeSegments => "mark_scheme_segments",
            Heuristic::LogicLines => "logic_lines",
            Heuristic::HeaderPeriods => "header_periods",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");
        Heuristic::ALL.into_iter().find(|h| h.name() == name)
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 规范化选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    disabled: Vec<Heuristic>,
    /// 需要去掉句号的小标题
    pub headers: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            headers: headers::DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

impl NormalizeOptions {
    /// 按名称关闭规则；未知名称记录警告后忽略
    pub fn with_disabled<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut options = Self::default();
        for name in names {
            if name.trim().is_empty() {
                continue;
            }
            match Heuristic::from_name(name) {
                Some(heuristic) => options.disable(heuristic),
                None => warn!("⚠️ 未知的修复规则 '{}'，已忽略", name.trim()),
            }
        }
        options
    }

    pub fn disable(&mut self, heuristic: Heuristic) {
        if !self.disabled.contains(&heuristic) {
            self.disabled.push(heuristic);
        }
    }

    pub fn is_enabled(&self, heuristic: Heuristic) -> bool {
        !self.disabled.contains(&heuristic)
    }

    pub fn disabled(&self) -> &[Heuristic] {
        &self.disabled
    }
}

/// 规范化器
#[derive(Debug, Clone)]
pub struct Normalizer {
    options: NormalizeOptions,
    headers: headers::HeaderRule,
}

static DEFAULT_NORMALIZER: Lazy<Normalizer> = Lazy::new(|| Normalizer {
    options: NormalizeOptions::default(),
    headers: headers::HeaderRule::default(),
});

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Result<Self, ConfigError> {
        let headers = headers::HeaderRule::new(options.headers.as_slice())?;
        Ok(Self { options, headers })
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// 规范化单个字段
    pub fn normalize(&self, content: &str, is_mark_scheme: bool, is_prompt: bool) -> String {
        self.normalize_with(content, is_mark_scheme, is_prompt, |nodes| nodes)
    }

    /// 规范化单个字段，`finish` 在全部规则之后、输出之前处理内容树
    ///
    /// 导出时用它在同一棵树上提取图片，题干压平成纯文本后不再重新解析
    pub fn normalize_with(
        &self,
        content: &str,
        is_mark_scheme: bool,
        is_prompt: bool,
        finish: impl FnOnce(Vec<Node>) -> Vec<Node>,
    ) -> String {
        let on = |h| self.options.is_enabled(h);
        let mut nodes = rich_content::parse(content);

        if on(Heuristic::Entities) {
            entities::collapse_whitespace(&mut nodes);
        }

        if is_prompt {
            prompt::prepare(&mut nodes, on(Heuristic::StopwordEmphasis));
            return prompt::flatten(&finish(nodes));
        }

        if on(Heuristic::Mojibake) {
            rich_content::map_text(&mut nodes, &mojibake::repair_mojibake);
        }
        if on(Heuristic::DoubledQuotes) {
            quotes::collapse_doubled_quotes(&mut nodes);
        }
        if on(Heuristic::SentenceSpacing) {
            spacing::insert_sentence_spaces(&mut nodes);
        }
        if on(Heuristic::SentenceCompletion) {
            spacing::complete_sentences(&mut nodes);
        }
        if is_mark_scheme && on(Heuristic::MarkSchemeSegments) {
            mark_scheme::split_criteria(&mut nodes);
        }
        if on(Heuristic::LogicLines) {
            logic_lines::repair_logic_lines(&mut nodes);
        }
        if on(Heuristic::HeaderPeriods) {
            self.headers.strip_periods(&mut nodes);
        }
        rich_content::render(&finish(nodes))
    }

    /// 规范化一道题的题干与评分标准
    ///
    /// 需要作答的题目题干走题干路径；纯上下文题的题干是材料，走完整流程
    pub fn normalize_question(&self, question: &Question) -> Question {
        self.normalize_question_with(question, |nodes| nodes)
    }

    /// 同 [`Normalizer::normalize_question`]，两个字段都经过 `finish`
    pub fn normalize_question_with(
        &self,
        question: &Question,
        mut finish: impl FnMut(Vec<Node>) -> Vec<Node>,
    ) -> Question {
        let is_prompt = question.answer_type != AnswerType::ContextOnly;
        let mut normalized = question.clone();
        normalized.text_body =
            self.normalize_with(&question.text_body, false, is_prompt, &mut finish);
        if !question.mark_scheme.is_empty() {
            normalized.mark_scheme =
                self.normalize_with(&question.mark_scheme, true, false, &mut finish);
        }
        normalized
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        DEFAULT_NORMALIZER.clone()
    }
}

/// 使用默认选项规范化
pub fn normalize(content: &str, is_mark_scheme: bool, is_prompt: bool) -> String {
    DEFAULT_NORMALIZER.normalize(content, is_mark_scheme, is_prompt)
}
