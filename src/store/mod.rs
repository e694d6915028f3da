//! 存储层：题目与题组的唯一修改入口

pub mod events;
pub mod question_store;
pub mod reorder;

pub use events::{EventBus, StoreEvent};
pub use question_store::QuestionStore;
pub use reorder::MoveOutcome;
