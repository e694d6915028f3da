//! 存储变更通知
//!
//! 展示层订阅这些事件来刷新界面，存储本身不依赖任何界面

use std::fmt;

use crate::models::{QuestionId, SetId};

/// 存储变更事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ExamUpdated,
    SetCreated { set_id: SetId },
    SetUpdated { set_id: SetId },
    SetDeleted { set_id: SetId, removed_questions: usize },
    CurrentSetChanged { set_id: Option<SetId> },
    QuestionAdded { question_id: QuestionId, set_id: SetId },
    QuestionUpdated { question_id: QuestionId },
    QuestionDeleted { question_id: QuestionId, set_id: SetId },
    /// 这些题组的 order 发生了变化
    QuestionsReordered { set_ids: Vec<SetId> },
    EditStarted { question_id: QuestionId },
    EditEnded { question_id: QuestionId },
    /// 从快照整体恢复
    Restored,
}

type Listener = Box<dyn Fn(&StoreEvent) + Send>;

/// 事件分发
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅事件，返回订阅序号
    pub fn subscribe(&mut self, listener: impl Fn(&StoreEvent) + Send + 'static) -> usize {
        self.listeners.push(Box::new(listener));
        self.listeners.len() - 1
    }

    pub fn emit(&self, event: &StoreEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_reaches_every_listener() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        for _ in 0..2 {
            let sink = received.clone();
            bus.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        }
        bus.emit(&StoreEvent::ExamUpdated);

        assert_eq!(bus.len(), 2);
        assert_eq!(
            *received.lock().unwrap(),
            vec![StoreEvent::ExamUpdated, StoreEvent::ExamUpdated]
        );
    }
}
