//! 题目存储
//!
//! 持有考试信息、题组和题目，是唯一可以修改它们的地方。
//! 每个公开的修改操作要么在校验失败时完全不改动状态，
//! 要么在返回前完成重新编号，保证每个题组的 order 都是 1..=N。

use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, NotFoundError, ValidationError};
use crate::infrastructure::{IdGenerator, SnapshotStore, UuidGenerator};
use crate::models::{
    AnswerType, Exam, ExamCodeRule, Question, QuestionId, QuestionInput, QuestionSet, SetId,
    StoreSnapshot,
};
use crate::services::preview::{self, OutlineGroup};
use crate::services::rich_content::has_visible_content;
use crate::store::events::{EventBus, StoreEvent};
use crate::store::reorder::{self, MoveOutcome};

/// 题目存储
pub struct QuestionStore {
    exam: Exam,
    sets: Vec<QuestionSet>,
    questions: Vec<Question>,
    current_set: Option<SetId>,
    editing: Option<QuestionId>,
    exam_code_rule: ExamCodeRule,
    ids: Box<dyn IdGenerator>,
    events: EventBus,
    persistence: Option<Box<dyn SnapshotStore>>,
}

impl QuestionStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self {
            exam: Exam::default(),
            sets: Vec::new(),
            questions: Vec::new(),
            current_set: None,
            editing: None,
            exam_code_rule: ExamCodeRule::default(),
            ids: Box::new(UuidGenerator),
            events: EventBus::new(),
            persistence: None,
        }
    }

    pub fn with_exam_code_rule(mut self, rule: ExamCodeRule) -> Self {
        self.exam_code_rule = rule;
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// 每次修改成功后自动保存快照
    pub fn with_persistence(mut self, persistence: impl SnapshotStore + 'static) -> Self {
        self.persistence = Some(Box::new(persistence));
        self
    }

    /// 订阅变更事件
    pub fn subscribe(&mut self, listener: impl Fn(&StoreEvent) + Send + 'static) -> usize {
        self.events.subscribe(listener)
    }

    // ========== 读取 ==========

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn exam_code_rule(&self) -> &ExamCodeRule {
        &self.exam_code_rule
    }

    pub fn sets(&self) -> &[QuestionSet] {
        &self.sets
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn set(&self, id: &str) -> Option<&QuestionSet> {
        self.sets.iter().find(|s| s.id == id)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn current_set(&self) -> Option<&QuestionSet> {
        self.current_set.as_deref().and_then(|id| self.set(id))
    }

    /// 正在编辑的题目
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// 题组内的题目，按 order 排序
    pub fn questions_in_set(&self, set_id: &str) -> Vec<&Question> {
        reorder::sorted_indices(&self.questions, set_id)
            .into_iter()
            .map(|i| &self.questions[i])
            .collect()
    }

    /// 按题组分组的大纲
    pub fn outline(&self) -> Vec<OutlineGroup> {
        preview::outline(&self.sets, &self.questions)
    }

    /// 状态栏文字
    pub fn status_line(&self) -> String {
        preview::status_line(self.sets.len(), self.questions.len())
    }

    /// 当前状态的快照
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            exam: self.exam.clone(),
            sets: self.sets.clone(),
            questions: self.questions.clone(),
            current_set_id: self.current_set.clone(),
            file_path: None,
        }
    }

    // ========== 考试信息 ==========

    /// 保存考试信息表单，并刷新每道题的冗余字段
    pub fn set_exam(&mut self, subject: &str, exam_code: &str) {
        self.exam = Exam::new(subject, exam_code);
        for question in &mut self.questions {
            question.exam = self.exam.exam_code.clone();
        }
        debug!("考试信息已更新: {} / {}", self.exam.subject, self.exam.exam_code);
        self.commit(StoreEvent::ExamUpdated);
    }

    // ========== 题组 ==========

    /// 创建题组并设为当前题组
    pub fn create_set(&mut self, label: &str, section: &str) -> AppResult<QuestionSet> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ValidationError::EmptySetLabel.into());
        }

        let set = QuestionSet {
            id: self.ids.next_id(),
            label: label.to_string(),
            section: section.trim().to_string(),
        };
        self.sets.push(set.clone());
        self.current_set = Some(set.id.clone());

        info!("✓ 创建题组: {}", set.display_name());
        self.commit(StoreEvent::SetCreated {
            set_id: set.id.clone(),
        });
        self.events.emit(&StoreEvent::CurrentSetChanged {
            set_id: Some(set.id.clone()),
        });
        Ok(set)
    }

    /// 修改题组名称 / 分区，并同步到组内所有题目
    pub fn edit_set(&mut self, id: &str, label: &str, section: &str) -> AppResult<()> {
        let index = self
            .sets
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::set_not_found(id))?;

        let label = label.trim();
        if label.is_empty() {
            return Err(ValidationError::EmptySetLabel.into());
        }

        self.sets[index].label = label.to_string();
        self.sets[index].section = section.trim().to_string();

        let set = self.sets[index].clone();
        for question in self.questions.iter_mut().filter(|q| q.set_id == id) {
            apply_set_metadata(question, &set);
        }

        debug!("题组已更新: {}", set.display_name());
        self.commit(StoreEvent::SetUpdated {
            set_id: id.to_string(),
        });
        Ok(())
    }

    /// 删除题组及组内所有题目，返回删除的题目数
    pub fn delete_set(&mut self, id: &str) -> AppResult<usize> {
        let index = self
            .sets
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::set_not_found(id))?;

        let removed_set = self.sets.remove(index);
        let before = self.questions.len();
        self.questions.retain(|q| q.set_id != id);
        let removed = before - self.questions.len();

        if let Some(editing) = self.editing.as_deref() {
            if self.question(editing).is_none() {
                self.editing = None;
            }
        }

        if self.current_set.as_deref() == Some(id) {
            self.current_set = self.sets.first().map(|s| s.id.clone());
            self.events.emit(&StoreEvent::CurrentSetChanged {
                set_id: self.current_set.clone(),
            });
        }

        info!(
            "🗑️ 删除题组: {}（连同 {} 道题目）",
            removed_set.display_name(),
            removed
        );
        self.commit(StoreEvent::SetDeleted {
            set_id: id.to_string(),
            removed_questions: removed,
        });
        Ok(removed)
    }

    /// 选中题组
    pub fn select_set(&mut self, id: &str) -> AppResult<()> {
        if self.set(id).is_none() {
            return Err(AppError::set_not_found(id));
        }
        self.current_set = Some(id.to_string());
        self.commit(StoreEvent::CurrentSetChanged {
            set_id: self.current_set.clone(),
        });
        Ok(())
    }

    // ========== 题目 ==========

    /// 新增题目，追加到目标题组末尾
    pub fn add_question(&mut self, input: QuestionInput) -> AppResult<Question> {
        self.exam.validate(&self.exam_code_rule)?;
        let set_id = self.resolve_target_set(&input)?;
        self.validate_input(&input)?;

        let question = self.insert_question(input, &set_id);
        self.commit(StoreEvent::QuestionAdded {
            question_id: question.id.clone(),
            set_id,
        });
        Ok(question)
    }

    /// 批量新增（"添加并继续"），任意一条不合法则一条都不添加
    pub fn add_questions(&mut self, inputs: Vec<QuestionInput>) -> AppResult<Vec<Question>> {
        self.exam.validate(&self.exam_code_rule)?;
        let mut targets = Vec::with_capacity(inputs.len());
        for input in &inputs {
            targets.push(self.resolve_target_set(input)?);
            self.validate_input(input)?;
        }

        let mut added = Vec::with_capacity(inputs.len());
        for (input, set_id) in inputs.into_iter().zip(targets) {
            let question = self.insert_question(input, &set_id);
            self.events.emit(&StoreEvent::QuestionAdded {
                question_id: question.id.clone(),
                set_id,
            });
            added.push(question);
        }

        info!("✓ 成功添加 {} 道题目", added.len());
        self.persist();
        Ok(added)
    }

    /// 修改题目；ID 不变，换题组时追加到新题组末尾
    pub fn update_question(&mut self, id: &str, input: QuestionInput) -> AppResult<Question> {
        let index = self
            .questions
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| AppError::question_not_found(id))?;
        self.exam.validate(&self.exam_code_rule)?;

        let old_set = self.questions[index].set_id.clone();
        let new_set = match input.set_id.as_deref() {
            Some(set_id) => {
                if self.set(set_id).is_none() {
                    return Err(AppError::set_not_found(set_id));
                }
                set_id.to_string()
            }
            None => old_set.clone(),
        };
        self.validate_input(&input)?;

        let moved = new_set != old_set;
        let next_order = self.questions.iter().filter(|q| q.set_id == new_set).count() + 1;
        let exam_code = self.exam.exam_code.clone();
        let set = self.set(&new_set).cloned();

        let question = &mut self.questions[index];
        apply_input(question, input);
        question.exam = exam_code;
        if moved {
            question.set_id = new_set.clone();
            question.order = next_order;
        }
        if let Some(set) = &set {
            apply_set_metadata(question, set);
        }

        if moved {
            reorder::renormalize(&mut self.questions, &old_set);
            reorder::renormalize(&mut self.questions, &new_set);
            self.events.emit(&StoreEvent::QuestionsReordered {
                set_ids: vec![old_set, new_set],
            });
        }

        let updated = self.questions[index].clone();
        debug!("题目已更新: {} ({})", updated.path, updated.id);
        self.commit(StoreEvent::QuestionUpdated {
            question_id: updated.id.clone(),
        });
        Ok(updated)
    }

    /// 删除题目
    pub fn delete_question(&mut self, id: &str) -> AppResult<Question> {
        let index = self
            .questions
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| AppError::question_not_found(id))?;

        let removed = self.questions.remove(index);
        reorder::renormalize(&mut self.questions, &removed.set_id);

        if self.editing.as_deref() == Some(id) {
            self.editing = None;
            self.events.emit(&StoreEvent::EditEnded {
                question_id: id.to_string(),
            });
        }

        debug!("题目已删除: {} ({})", removed.path, removed.id);
        self.commit(StoreEvent::QuestionDeleted {
            question_id: removed.id.clone(),
            set_id: removed.set_id.clone(),
        });
        Ok(removed)
    }

    /// 题组内移动；越界时返回 `false`，不是错误
    pub fn move_question(&mut self, id: &str, delta: isize) -> AppResult<bool> {
        let outcome = reorder::move_within_set(&mut self.questions, id, delta)?;
        if outcome == MoveOutcome::AtBoundary {
            debug!("题目 {} 已在边界，忽略移动 {}", id, delta);
            return Ok(false);
        }

        let set_id = self
            .question(id)
            .map(|q| q.set_id.clone())
            .unwrap_or_default();
        self.commit(StoreEvent::QuestionsReordered {
            set_ids: vec![set_id],
        });
        Ok(true)
    }

    /// 移到另一个题组（或本组）中，插在 `before` 之前；`before` 为空时追加到末尾
    pub fn move_question_to_set(
        &mut self,
        id: &str,
        target_set_id: &str,
        before: Option<&str>,
    ) -> AppResult<()> {
        let target = self
            .set(target_set_id)
            .cloned()
            .ok_or_else(|| AppError::set_not_found(target_set_id))?;

        let source_set = reorder::relocate(&mut self.questions, id, target_set_id, before)?;

        if let Some(question) = self.questions.iter_mut().find(|q| q.id == id) {
            apply_set_metadata(question, &target);
        }

        debug!("题目 {} 从题组 {} 移到 {}", id, source_set, target.display_name());
        let mut set_ids = vec![source_set];
        if set_ids[0] != target_set_id {
            set_ids.push(target_set_id.to_string());
        }
        self.commit(StoreEvent::QuestionsReordered { set_ids });
        Ok(())
    }

    /// 拖拽结束后按展示层的完整布局重排
    pub fn apply_layout(&mut self, layout: &[(SetId, Vec<QuestionId>)]) -> AppResult<()> {
        for (set_id, ids) in layout {
            if self.set(set_id).is_none() {
                return Err(AppError::set_not_found(set_id.as_str()));
            }
            if let Some(missing) = ids.iter().find(|id| self.question(id).is_none()) {
                return Err(AppError::question_not_found(missing.as_str()));
            }
        }

        let affected = reorder::apply_layout(&mut self.questions, layout);

        let sets = self.sets.clone();
        for question in &mut self.questions {
            if let Some(set) = sets.iter().find(|s| s.id == question.set_id) {
                apply_set_metadata(question, set);
            }
        }

        self.commit(StoreEvent::QuestionsReordered { set_ids: affected });
        Ok(())
    }

    // ========== 编辑会话 ==========

    /// 进入编辑；同一时间只允许编辑一道题
    pub fn begin_edit(&mut self, id: &str) -> AppResult<&Question> {
        if self.question(id).is_none() {
            return Err(AppError::question_not_found(id));
        }
        match self.editing.as_deref() {
            Some(editing) if editing != id => {
                return Err(ValidationError::EditInProgress {
                    editing: editing.to_string(),
                }
                .into());
            }
            _ => {}
        }

        self.editing = Some(id.to_string());
        self.events.emit(&StoreEvent::EditStarted {
            question_id: id.to_string(),
        });
        self.question(id)
            .ok_or_else(|| AppError::question_not_found(id))
    }

    /// 提交编辑；校验失败时保持编辑状态
    pub fn commit_edit(&mut self, input: QuestionInput) -> AppResult<Question> {
        let Some(id) = self.editing.clone() else {
            return Err(AppError::NotFound(NotFoundError::Question {
                id: String::new(),
            }));
        };
        let updated = self.update_question(&id, input)?;
        self.editing = None;
        self.events.emit(&StoreEvent::EditEnded { question_id: id });
        Ok(updated)
    }

    /// 放弃编辑
    pub fn cancel_edit(&mut self) {
        if let Some(id) = self.editing.take() {
            self.events.emit(&StoreEvent::EditEnded { question_id: id });
        }
    }

    // ========== 快照 ==========

    /// 用快照替换当前状态
    ///
    /// 丢弃题组已不存在的题目，并重新编号所有题组
    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        let StoreSnapshot {
            exam,
            sets,
            mut questions,
            current_set_id,
            ..
        } = snapshot;

        let before = questions.len();
        questions.retain(|q| sets.iter().any(|s| s.id == q.set_id));
        if questions.len() != before {
            warn!(
                "⚠️ 快照中有 {} 道题目的题组不存在，已丢弃",
                before - questions.len()
            );
        }
        reorder::renormalize_all(&mut questions);

        self.current_set = current_set_id.filter(|id| sets.iter().any(|s| &s.id == id));
        self.exam = exam;
        self.sets = sets;
        self.questions = questions;
        self.editing = None;

        info!(
            "✓ 已恢复 {} 个题组, {} 道题目",
            self.sets.len(),
            self.questions.len()
        );
        self.events.emit(&StoreEvent::Restored);
    }

    /// 从快照创建存储
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut store = Self::new();
        store.restore(snapshot);
        store
    }

    // ========== 内部 ==========

    fn resolve_target_set(&self, input: &QuestionInput) -> AppResult<SetId> {
        let set_id = input
            .set_id
            .clone()
            .or_else(|| self.current_set.clone())
            .ok_or(ValidationError::NoSetSelected)?;
        if self.set(&set_id).is_none() {
            return Err(AppError::set_not_found(set_id));
        }
        Ok(set_id)
    }

    /// 新增 / 修改共用的表单校验，不修改任何状态
    fn validate_input(&self, input: &QuestionInput) -> AppResult<()> {
        if input.path.trim().is_empty() {
            return Err(ValidationError::MissingPath.into());
        }
        if !has_visible_content(&input.text_body) {
            return Err(ValidationError::MissingText.into());
        }

        let answer_type = input.answer_type;
        if answer_type.expects_answer() {
            if !has_visible_content(&input.mark_scheme) {
                return Err(ValidationError::MissingMarkScheme { answer_type }.into());
            }
            if input.marks <= 0 {
                return Err(ValidationError::MarksOutOfRange {
                    answer_type,
                    marks: input.marks,
                }
                .into());
            }
        } else if input.marks != 0 {
            return Err(ValidationError::MarksOutOfRange {
                answer_type,
                marks: input.marks,
            }
            .into());
        }
        Ok(())
    }

    fn insert_question(&mut self, input: QuestionInput, set_id: &str) -> Question {
        let order = self.questions.iter().filter(|q| q.set_id == set_id).count() + 1;
        let mut question = Question {
            id: self.ids.next_id(),
            set_id: set_id.to_string(),
            path: String::new(),
            answer_type: AnswerType::ContextOnly,
            text_body: String::new(),
            mark_scheme: String::new(),
            needs_context: false,
            marks: 0,
            order,
            exam: self.exam.exam_code.clone(),
            section: String::new(),
            topic: String::new(),
        };
        apply_input(&mut question, input);
        if let Some(set) = self.set(set_id) {
            apply_set_metadata(&mut question, set);
        }

        self.questions.push(question.clone());
        reorder::renormalize(&mut self.questions, set_id);

        debug!("题目已添加: {} -> 题组 {} 第 {} 位", question.path, set_id, order);
        self.question(&question.id).cloned().unwrap_or(question)
    }

    fn commit(&mut self, event: StoreEvent) {
        self.events.emit(&event);
        self.persist();
    }

    /// 保存失败只影响持久性，内存中的状态仍然有效
    fn persist(&mut self) {
        if self.persistence.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(persistence) = self.persistence.as_mut() {
            if let Err(e) = persistence.save(&snapshot) {
                warn!("⚠️ 快照保存失败，仅保留内存状态: {}", e);
            }
        }
    }
}

impl Default for QuestionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 表单内容写入题目，按答案类型清理无效字段
fn apply_input(question: &mut Question, input: QuestionInput) {
    let answer_type = input.answer_type;
    question.path = input.path.trim().to_string();
    question.answer_type = answer_type;
    question.text_body = input.text_body.trim().to_string();
    question.needs_context = answer_type == AnswerType::OpenText && input.needs_context;
    if answer_type.expects_answer() {
        question.mark_scheme = input.mark_scheme.trim().to_string();
        question.marks = input.marks;
    } else {
        question.mark_scheme = String::new();
        question.marks = 0;
    }
}

/// 刷新题目上的题组冗余字段
fn apply_set_metadata(question: &mut Question, set: &QuestionSet) {
    question.section = set.section.clone();
    question.topic = set.label.clone();
}
