//! 排序引擎
//!
//! 计算题目在题组内、跨题组以及拖拽后的新 order。
//! 每个函数结束时，涉及的题组 order 都是连续的 1..=N。

use std::collections::{HashMap, HashSet};

use crate::error::NotFoundError;
use crate::models::{Question, QuestionId, SetId};

/// 题组内移动的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// 目标位置越界，什么都没做
    AtBoundary,
}

/// 题组内的题目下标，按 order 升序；order 相同时保持插入顺序
pub fn sorted_indices(questions: &[Question], set_id: &str) -> Vec<usize> {
    let mut indices: Vec<usize> = questions
        .iter()
        .enumerate()
        .filter(|(_, q)| q.set_id == set_id)
        .map(|(i, _)| i)
        .collect();
    // 稳定排序
    indices.sort_by_key(|&i| questions[i].order);
    indices
}

/// 按给定顺序重新编号为 1..=N
fn renumber(questions: &mut [Question], indices: &[usize]) {
    for (position, &i) in indices.iter().enumerate() {
        questions[i].order = position + 1;
    }
}

/// 重新编号一个题组，幂等
pub fn renormalize(questions: &mut [Question], set_id: &str) {
    let indices = sorted_indices(questions, set_id);
    renumber(questions, &indices);
}

/// 重新编号所有题组
pub fn renormalize_all(questions: &mut [Question]) {
    let mut seen = HashSet::new();
    let set_ids: Vec<SetId> = questions
        .iter()
        .filter(|q| seen.insert(q.set_id.clone()))
        .map(|q| q.set_id.clone())
        .collect();

    for set_id in set_ids {
        renormalize(questions, &set_id);
    }
}

/// 在题组内移动 `delta` 步（-1 上移，+1 下移）
///
/// 越界时返回 `AtBoundary`，不是错误
pub fn move_within_set(
    questions: &mut [Question],
    question_id: &str,
    delta: isize,
) -> Result<MoveOutcome, NotFoundError> {
    let set_id = questions
        .iter()
        .find(|q| q.id == question_id)
        .map(|q| q.set_id.clone())
        .ok_or_else(|| NotFoundError::Question {
            id: question_id.to_string(),
        })?;

    let mut indices = sorted_indices(questions, &set_id);
    let Some(current) = indices.iter().position(|&i| questions[i].id == question_id) else {
        return Err(NotFoundError::Question {
            id: question_id.to_string(),
        });
    };

    let target = current as isize + delta;
    if target < 0 || target >= indices.len() as isize {
        return Ok(MoveOutcome::AtBoundary);
    }

    let moved = indices.remove(current);
    indices.insert(target as usize, moved);
    renumber(questions, &indices);
    Ok(MoveOutcome::Moved)
}

/// 把题目移到目标题组中，插在 `anchor` 之前；`anchor` 为空时追加到末尾
///
/// 返回原题组 ID。锚点不在目标题组中时不做任何修改。
pub fn relocate(
    questions: &mut [Question],
    question_id: &str,
    target_set: &str,
    anchor: Option<&str>,
) -> Result<SetId, NotFoundError> {
    let moved = questions
        .iter()
        .position(|q| q.id == question_id)
        .ok_or_else(|| NotFoundError::Question {
            id: question_id.to_string(),
        })?;
    let source_set = questions[moved].set_id.clone();

    if anchor == Some(question_id) {
        return Ok(source_set);
    }

    let mut target_list: Vec<usize> = sorted_indices(questions, target_set)
        .into_iter()
        .filter(|&i| i != moved)
        .collect();

    let insert_at = match anchor {
        Some(anchor_id) => target_list
            .iter()
            .position(|&i| questions[i].id == anchor_id)
            .ok_or_else(|| NotFoundError::Anchor {
                id: anchor_id.to_string(),
                set_id: target_set.to_string(),
            })?,
        None => target_list.len(),
    };

    target_list.insert(insert_at, moved);
    questions[moved].set_id = target_set.to_string();
    renumber(questions, &target_list);

    if source_set != target_set {
        renormalize(questions, &source_set);
    }
    Ok(source_set)
}

/// 按展示层给出的完整布局（题组 → 题目顺序）重排
///
/// 布局中未出现的题目保持原题组，排在已列出的题目之后。
/// 同一题目出现多次时以第一次为准。返回受影响的题组。
pub fn apply_layout(questions: &mut [Question], layout: &[(SetId, Vec<QuestionId>)]) -> Vec<SetId> {
    let position_of: HashMap<&str, usize> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| (q.id.as_str(), i))
        .collect();

    let mut placed: HashMap<usize, (SetId, usize)> = HashMap::new();
    for (set_id, ids) in layout {
        let mut slot = 0;
        for id in ids {
            let Some(&i) = position_of.get(id.as_str()) else {
                continue;
            };
            if placed.contains_key(&i) {
                continue;
            }
            slot += 1;
            placed.insert(i, (set_id.clone(), slot));
        }
    }

    let mut affected: Vec<SetId> = Vec::new();
    let mut note = |set_id: &SetId| {
        if !affected.contains(set_id) {
            affected.push(set_id.clone());
        }
    };

    for (set_id, _) in layout {
        note(set_id);
    }
    for (&i, (set_id, _)) in &placed {
        note(&questions[i].set_id);
        note(set_id);
    }

    // 未列出的题目排在列出的题目之后，相对顺序不变
    let offset = questions.len();
    for (i, question) in questions.iter_mut().enumerate() {
        match placed.get(&i) {
            Some((set_id, slot)) => {
                question.set_id = set_id.clone();
                question.order = *slot;
            }
            None if affected.contains(&question.set_id) => {
                question.order += offset;
            }
            None => {}
        }
    }

    for set_id in &affected {
        renormalize(questions, set_id);
    }
    affected
}
