//! CSV 导出
//!
//! 所有字段都加引号，内部引号加倍，行尾 CRLF

use serde::{Deserialize, Serialize};

use crate::error::PackagingError;
use crate::models::{AnswerType, Exam, Question, StoreSnapshot};

/// 固定的列顺序
pub const CSV_HEADERS: [&str; 12] = [
    "uniqueid",
    "path",
    "text_body",
    "answer_type",
    "mark_scheme",
    "needs_context",
    "exam",
    "subject",
    "section",
    "topic",
    "order",
    "marks",
];

/// 按导出顺序序列化快照中的题目
pub fn serialize_snapshot(snapshot: &StoreSnapshot) -> Result<String, PackagingError> {
    serialize_questions(snapshot.questions_in_export_order(), &snapshot.exam)
}

/// 按给定顺序序列化
pub fn serialize_questions<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
    exam: &Exam,
) -> Result<String, PackagingError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for question in questions {
        writer.write_record(row_fields(question, exam))?;
    }

    let bytes = writer.into_inner().map_err(|e| {
        PackagingError::Io(std::io::Error::new(e.error().kind(), e.error().to_string()))
    })?;
    String::from_utf8(bytes).map_err(|_| PackagingError::Utf8)
}

fn row_fields(question: &Question, exam: &Exam) -> [String; 12] {
    let exam_code = if question.exam.is_empty() {
        exam.exam_code.clone()
    } else {
        question.exam.clone()
    };
    [
        question.id.clone(),
        question.path.clone(),
        question.text_body.clone(),
        question.answer_type.code().to_string(),
        question.mark_scheme.clone(),
        question.needs_context.to_string(),
        exam_code,
        exam.subject.clone(),
        question.section.clone(),
        question.topic.clone(),
        question.order.to_string(),
        question.marks.to_string(),
    ]
}

/// 后端导出 Excel 用的 JSON 请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub subject: String,
    pub exam: String,
    pub questions: Vec<PayloadQuestion>,
}

/// 请求体中的一道题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadQuestion {
    pub uniqueid: String,
    pub path: String,
    pub text_body: String,
    pub answer_type: AnswerType,
    pub mark_scheme: String,
    pub needs_context: bool,
    pub exam: String,
    pub section: String,
    pub topic: String,
    pub order: usize,
    pub marks: i64,
}

impl ExportPayload {
    /// 题目没有 topic 时用科目代替
    pub fn from_questions<'a>(exam: &Exam, questions: impl IntoIterator<Item = &'a Question>) -> Self {
        let questions = questions
            .into_iter()
            .map(|q| PayloadQuestion {
                uniqueid: q.id.clone(),
                path: q.path.clone(),
                text_body: q.text_body.clone(),
                answer_type: q.answer_type,
                mark_scheme: q.mark_scheme.clone(),
                needs_context: q.needs_context,
                exam: if q.exam.is_empty() {
                    exam.exam_code.clone()
                } else {
                    q.exam.clone()
                },
                section: q.section.clone(),
                topic: if q.topic.is_empty() {
                    exam.subject.clone()
                } else {
                    q.topic.clone()
                },
                order: q.order,
                marks: q.marks,
            })
            .collect();

        Self {
            subject: exam.subject.clone(),
            exam: exam.exam_code.clone(),
            questions,
        }
    }

    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        Self::from_questions(&snapshot.exam, snapshot.questions_in_export_order())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionSet;

    fn question(id: &str, set_id: &str, order: usize) -> Question {
        Question {
            id: id.to_string(),
            set_id: set_id.to_string(),
            path: format!("{}-path", id),
            answer_type: AnswerType::OpenText,
            text_body: "What is X?".to_string(),
            mark_scheme: "Award 1 mark".to_string(),
            needs_context: false,
            marks: 2,
            order,
            exam: "M22".to_string(),
            section: "A".to_string(),
            topic: "Q1".to_string(),
        }
    }

    #[test]
    fn test_header_row() {
        let csv = serialize_questions(Vec::<&Question>::new(), &Exam::new("Physics", "M22")).unwrap();
        assert_eq!(
            csv,
            "\"uniqueid\",\"path\",\"text_body\",\"answer_type\",\"mark_scheme\",\"needs_context\",\
             \"exam\",\"subject\",\"section\",\"topic\",\"order\",\"marks\"\r\n"
        );
    }

    #[test]
    fn test_quote_escaping() {
        let mut q = question("q1", "s1", 1);
        q.text_body = r#"He said "hi""#.to_string();
        let csv = serialize_questions([&q], &Exam::new("Physics", "M22")).unwrap();
        let row = csv.split("\r\n").nth(1).unwrap();
        assert!(row.contains(r#","He said ""hi""","#));
        assert!(row.contains(r#","true","#) || row.contains(r#","false","#));
    }

    #[test]
    fn test_multiline_fields_stay_in_one_record() {
        let mut q = question("q1", "s1", 1);
        q.text_body = "line one\nline two, with comma".to_string();
        let csv = serialize_questions([&q], &Exam::new("Physics", "M22")).unwrap();
        assert!(csv.contains("\"line one\nline two, with comma\""));
        assert!(csv.ends_with("\"2\"\r\n"));
    }

    #[test]
    fn test_snapshot_order_follows_set_labels() {
        let snapshot = StoreSnapshot {
            exam: Exam::new("Physics", "M22"),
            sets: vec![
                QuestionSet {
                    id: "s2".into(),
                    label: "Question 2".into(),
                    section: String::new(),
                },
                QuestionSet {
                    id: "s1".into(),
                    label: "Question 1".into(),
                    section: String::new(),
                },
            ],
            questions: vec![
                question("b", "s2", 1),
                question("a2", "s1", 2),
                question("a1", "s1", 1),
            ],
            ..Default::default()
        };
        let csv = serialize_snapshot(&snapshot).unwrap();
        let ids: Vec<&str> = csv
            .split("\r\n")
            .skip(1)
            .filter(|row| !row.is_empty())
            .map(|row| row.split(',').next().unwrap().trim_matches('"'))
            .collect();
        assert_eq!(ids, vec!["a1", "a2", "b"]);
    }

    #[test]
    fn test_payload_topic_falls_back_to_subject() {
        let mut q = question("q1", "s1", 1);
        q.topic = String::new();
        let payload = ExportPayload::from_questions(&Exam::new("Physics", "M22"), [&q]);
        assert_eq!(payload.questions[0].topic, "Physics");

        let json = payload.to_json().unwrap();
        assert!(json.contains("\"answer_type\": 1"));
        assert!(json.contains("\"needs_context\": false"));
    }
}
