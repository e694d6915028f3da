use serde::{Deserialize, Serialize};

use crate::models::exam::Exam;
use crate::models::question::{Question, SetId};
use crate::models::question_set::QuestionSet;

/// 存储快照：持久化与导出时使用的完整状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub exam: Exam,
    #[serde(default)]
    pub sets: Vec<QuestionSet>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_set_id: Option<SetId>,
    /// 快照来源文件（仅用于日志）
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

impl StoreSnapshot {
    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }

    /// 按题组名称排序后，每组内按 order 排序的题目
    ///
    /// 名称相同的题组保持创建顺序；不属于任何题组的题目不会出现
    pub fn questions_in_export_order(&self) -> Vec<&Question> {
        let mut sets: Vec<&QuestionSet> = self.sets.iter().collect();
        sets.sort_by(|a, b| a.label.cmp(&b.label));

        let mut ordered = Vec::with_capacity(self.questions.len());
        for set in sets {
            let mut members: Vec<&Question> = self
                .questions
                .iter()
                .filter(|q| q.set_id == set.id)
                .collect();
            members.sort_by_key(|q| q.order);
            ordered.extend(members);
        }
        ordered
    }
}
