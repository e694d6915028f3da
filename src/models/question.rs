use serde::{Deserialize, Serialize};
use std::fmt;

/// 题组 ID
pub type SetId = String;
/// 题目 ID
pub type QuestionId = String;

/// 答案类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AnswerType {
    /// 仅作为上下文，不需要作答
    #[default]
    ContextOnly = 0,
    /// 开放式作答
    OpenText = 1,
    /// 选择题
    MultipleChoice = 2,
}

impl AnswerType {
    pub const ALL: [AnswerType; 3] = [
        AnswerType::ContextOnly,
        AnswerType::OpenText,
        AnswerType::MultipleChoice,
    ];

    /// 导出时使用的数字代码
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 从数字代码解析
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AnswerType::ContextOnly),
            1 => Some(AnswerType::OpenText),
            2 => Some(AnswerType::MultipleChoice),
            _ => None,
        }
    }

    /// 表单中展示的名称
    pub fn label(self) -> &'static str {
        match self {
            AnswerType::ContextOnly => "0 - No answer expected (context only)",
            AnswerType::OpenText => "1 - Open text answer",
            AnswerType::MultipleChoice => "2 - Multiple choice",
        }
    }

    /// 是否需要作答（需要评分标准和分值）
    pub fn expects_answer(self) -> bool {
        matches!(self, AnswerType::OpenText | AnswerType::MultipleChoice)
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl TryFrom<u8> for AnswerType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        AnswerType::from_code(code).ok_or_else(|| format!("未知的答案类型: {}", code))
    }
}

impl From<AnswerType> for u8 {
    fn from(answer_type: AnswerType) -> Self {
        answer_type.code()
    }
}

/// 表单字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Path,
    AnswerType,
    TextBody,
    MarkScheme,
    Marks,
    NeedsContext,
}

/// 根据答案类型推导表单中应显示的字段
pub fn visible_fields(answer_type: AnswerType) -> &'static [FormField] {
    match answer_type {
        AnswerType::ContextOnly => &[FormField::Path, FormField::AnswerType, FormField::TextBody],
        AnswerType::OpenText => &[
            FormField::Path,
            FormField::AnswerType,
            FormField::NeedsContext,
            FormField::TextBody,
            FormField::Marks,
            FormField::MarkScheme,
        ],
        AnswerType::MultipleChoice => &[
            FormField::Path,
            FormField::AnswerType,
            FormField::TextBody,
            FormField::Marks,
            FormField::MarkScheme,
        ],
    }
}

/// 已提交到存储中的题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub set_id: SetId,
    pub path: String,
    pub answer_type: AnswerType,
    pub text_body: String,
    #[serde(default)]
    pub mark_scheme: String,
    #[serde(default)]
    pub needs_context: bool,
    #[serde(default)]
    pub marks: i64,
    /// 题组内从 1 开始的位置
    pub order: usize,
    /// 以下为冗余字段，随题组信息刷新
    #[serde(default)]
    pub exam: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub topic: String,
}

/// 新增 / 编辑题目时表单提交的内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionInput {
    pub path: String,
    pub answer_type: AnswerType,
    pub text_body: String,
    #[serde(default)]
    pub mark_scheme: String,
    #[serde(default)]
    pub needs_context: bool,
    #[serde(default)]
    pub marks: i64,
    /// 目标题组；为空时使用当前选中的题组（新增）或保持原题组（编辑）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<SetId>,
}

impl QuestionInput {
    pub fn new(path: impl Into<String>, answer_type: AnswerType, text_body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            answer_type,
            text_body: text_body.into(),
            ..Default::default()
        }
    }

    pub fn with_mark_scheme(mut self, mark_scheme: impl Into<String>) -> Self {
        self.mark_scheme = mark_scheme.into();
        self
    }

    pub fn with_marks(mut self, marks: i64) -> Self {
        self.marks = marks;
        self
    }

    pub fn with_needs_context(mut self, needs_context: bool) -> Self {
        self.needs_context = needs_context;
        self
    }

    pub fn in_set(mut self, set_id: impl Into<SetId>) -> Self {
        self.set_id = Some(set_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_type_codes() {
        for answer_type in AnswerType::ALL {
            assert_eq!(AnswerType::from_code(answer_type.code()), Some(answer_type));
        }
        assert_eq!(AnswerType::from_code(3), None);
        assert!(!AnswerType::ContextOnly.expects_answer());
        assert!(AnswerType::MultipleChoice.expects_answer());
    }

    #[test]
    fn test_answer_type_serializes_as_number() {
        let json = serde_json::to_string(&AnswerType::OpenText).unwrap();
        assert_eq!(json, "1");
        let parsed: AnswerType = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, AnswerType::MultipleChoice);
        assert!(serde_json::from_str::<AnswerType>("7").is_err());
    }

    #[test]
    fn test_visible_fields() {
        // 只有开放式作答显示"需要上下文"
        assert!(visible_fields(AnswerType::OpenText).contains(&FormField::NeedsContext));
        assert!(!visible_fields(AnswerType::MultipleChoice).contains(&FormField::NeedsContext));

        let context_only = visible_fields(AnswerType::ContextOnly);
        assert!(!context_only.contains(&FormField::MarkScheme));
        assert!(!context_only.contains(&FormField::Marks));
    }
}
