use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ValidationError};
use crate::models::subject::Subject;

/// 考试基本信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub subject: String,
    pub exam_code: String,
}

impl Exam {
    pub fn new(subject: impl Into<String>, exam_code: impl Into<String>) -> Self {
        Self {
            subject: subject.into().trim().to_string(),
            exam_code: exam_code.into().trim().to_string(),
        }
    }

    /// 校验科目与考试代码
    ///
    /// 科目不在已知列表中时只记录警告，不阻止录入
    pub fn validate(&self, rule: &ExamCodeRule) -> Result<(), ValidationError> {
        if self.subject.trim().is_empty() {
            return Err(ValidationError::MissingSubject);
        }
        if self.exam_code.trim().is_empty() {
            return Err(ValidationError::MissingExamCode);
        }
        rule.check(self.exam_code.trim())?;

        if Subject::find(&self.subject).is_none() {
            warn!("⚠️ 科目 '{}' 不在已知科目列表中", self.subject);
        }
        Ok(())
    }

    /// 用于文件名的考试代码：空白、路径分隔符等字符替换为下划线
    pub fn sanitized_code(&self) -> String {
        let code: String = self
            .exam_code
            .trim()
            .chars()
            .map(|c| {
                if c.is_whitespace() || UNSAFE_FILE_CHARS.contains(&c) {
                    '_'
                } else {
                    c
                }
            })
            .collect();
        // 只剩点号时会变成 `.` 或 `..` 目录
        if code.chars().all(|c| c == '.') {
            code.replace('.', "_")
        } else {
            code
        }
    }
}

/// 不能出现在文件名里的字符
const UNSAFE_FILE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

static PREFIX_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[MN]").unwrap());
static PREFIX_WITH_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[MN]\d{2}").unwrap());

/// 考试代码格式规则
#[derive(Debug, Clone)]
pub struct ExamCodeRule {
    pattern: Regex,
}

impl ExamCodeRule {
    /// 仅要求以 M / N 开头
    pub fn prefix_only() -> Self {
        Self {
            pattern: PREFIX_ONLY.clone(),
        }
    }

    /// 要求 M / N 后跟两位年份，如 M22、N23
    pub fn prefix_with_year() -> Self {
        Self {
            pattern: PREFIX_WITH_YEAR.clone(),
        }
    }

    /// 自定义正则
    pub fn custom(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// 按名称解析：`prefix` / `prefix_year`，其余按正则处理
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim() {
            "prefix" => Ok(Self::prefix_only()),
            "prefix_year" | "" => Ok(Self::prefix_with_year()),
            other => Self::custom(other),
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn check(&self, code: &str) -> Result<(), ValidationError> {
        if self.pattern.is_match(code) {
            Ok(())
        } else {
            Err(ValidationError::MalformedExamCode {
                code: code.to_string(),
                pattern: self.pattern.as_str().to_string(),
            })
        }
    }
}

impl Default for ExamCodeRule {
    fn default() -> Self {
        Self::prefix_with_year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_code_rules() {
        let strict = ExamCodeRule::prefix_with_year();
        assert!(strict.check("M22").is_ok());
        assert!(strict.check("N23 Paper 1").is_ok());
        assert!(strict.check("M2").is_err());
        assert!(strict.check("X22").is_err());

        let loose = ExamCodeRule::prefix_only();
        assert!(loose.check("M").is_ok());
        assert!(loose.check("Nov").is_ok());
        assert!(loose.check("May").is_ok());
        assert!(loose.check("x").is_err());
    }

    #[test]
    fn test_rule_parse() {
        assert_eq!(ExamCodeRule::parse("prefix").unwrap().pattern(), r"^[MN]");
        assert_eq!(ExamCodeRule::parse("").unwrap().pattern(), r"^[MN]\d{2}");
        assert!(ExamCodeRule::parse("^(").is_err());
    }

    #[test]
    fn test_validate_exam() {
        let rule = ExamCodeRule::default();
        assert_eq!(
            Exam::new("", "M22").validate(&rule),
            Err(ValidationError::MissingSubject)
        );
        assert_eq!(
            Exam::new("Physics", "  ").validate(&rule),
            Err(ValidationError::MissingExamCode)
        );
        assert!(matches!(
            Exam::new("Physics", "Q22").validate(&rule),
            Err(ValidationError::MalformedExamCode { .. })
        ));
        assert!(Exam::new("Physics", "M22").validate(&rule).is_ok());
    }

    #[test]
    fn test_sanitized_code() {
        assert_eq!(Exam::new("ESS", "M22 Paper 2").sanitized_code(), "M22_Paper_2");
        assert_eq!(Exam::new("ESS", "N23").sanitized_code(), "N23");
    }

    #[test]
    fn test_sanitized_code_strips_path_separators() {
        assert_eq!(Exam::new("ESS", "M22/TZ1").sanitized_code(), "M22_TZ1");
        assert_eq!(Exam::new("ESS", r"..\M22").sanitized_code(), ".._M22");
        assert_eq!(Exam::new("ESS", "M22: P1?").sanitized_code(), "M22__P1_");
        assert_eq!(Exam::new("ESS", "..").sanitized_code(), "__");
    }
}
