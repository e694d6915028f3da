pub mod exam;
pub mod loaders;
pub mod question;
pub mod question_set;
pub mod snapshot;
pub mod subject;

pub use exam::{Exam, ExamCodeRule};
pub use loaders::{load_all_snapshots, load_snapshot};
pub use question::{
    visible_fields, AnswerType, FormField, Question, QuestionId, QuestionInput, SetId,
};
pub use question_set::QuestionSet;
pub use snapshot::StoreSnapshot;
pub use subject::Subject;
