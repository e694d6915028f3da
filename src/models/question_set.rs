use serde::{Deserialize, Serialize};

use crate::models::question::SetId;

/// 题组：题目的分组与排序范围（如 "Question 10"、"Section B"）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub id: SetId,
    pub label: String,
    #[serde(default)]
    pub section: String,
}

impl QuestionSet {
    /// 列表中显示的名称，如 "Question 10 (Section B)"
    pub fn display_name(&self) -> String {
        if self.section.is_empty() {
            self.label.clone()
        } else {
            format!("{} (Section {})", self.label, self.section)
        }
    }
}
