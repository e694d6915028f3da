//! 预览
//!
//! 给展示层用的纯文本预览、分组大纲和状态栏文字

use crate::models::{Question, QuestionSet};
use crate::services::rich_content::{self, Node};
use crate::store::reorder;
use crate::utils::logging::truncate_text;

/// 大纲中题干预览的最大字符数
pub const TEXT_PREVIEW_CHARS: usize = 80;
/// 大纲中评分标准预览的最大字符数
pub const MARK_SCHEME_PREVIEW_CHARS: usize = 60;

/// 去掉标签，段落和换行变成 `\n`，图片不显示
pub fn strip_html(html: &str) -> String {
    let mut out = String::new();
    collect_plain(&rich_content::parse(html), &mut out);
    out.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_plain(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            // 源码里的换行不分段
            Node::Text(text) => {
                out.extend(text.chars().map(|c| if c == '\n' { ' ' } else { c }))
            }
            Node::Element { tag, children, .. } => match tag.as_str() {
                "img" => {}
                "br" => out.push('\n'),
                _ if node.is_block() => {
                    out.push('\n');
                    collect_plain(children, out);
                    out.push('\n');
                }
                _ => collect_plain(children, out),
            },
        }
    }
}

/// 截断后的纯文本预览
pub fn preview_text(html: &str, max_chars: usize) -> String {
    truncate_text(&strip_html(html), max_chars)
}

/// 大纲中的一道题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub question_id: String,
    pub order: usize,
    pub path: String,
    pub answer_type: &'static str,
    pub text_preview: String,
    pub mark_scheme_preview: String,
}

/// 大纲中的一个题组
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineGroup {
    pub set_id: String,
    pub title: String,
    pub rows: Vec<OutlineRow>,
}

/// 按题组创建顺序分组，组内按 order 排序；没有题目的题组不显示
pub fn outline(sets: &[QuestionSet], questions: &[Question]) -> Vec<OutlineGroup> {
    sets.iter()
        .filter_map(|set| {
            let rows: Vec<OutlineRow> = reorder::sorted_indices(questions, &set.id)
                .into_iter()
                .map(|i| outline_row(&questions[i]))
                .collect();
            if rows.is_empty() {
                return None;
            }
            Some(OutlineGroup {
                set_id: set.id.clone(),
                title: set.display_name(),
                rows,
            })
        })
        .collect()
}

fn outline_row(question: &Question) -> OutlineRow {
    let mark_scheme_preview = if question.mark_scheme.trim().is_empty() {
        "(none)".to_string()
    } else {
        preview_text(&question.mark_scheme, MARK_SCHEME_PREVIEW_CHARS)
    };
    OutlineRow {
        question_id: question.id.clone(),
        order: question.order,
        path: question.path.clone(),
        answer_type: question.answer_type.label(),
        text_preview: preview_text(&question.text_body, TEXT_PREVIEW_CHARS),
        mark_scheme_preview,
    }
}

/// 状态栏文字
pub fn status_line(set_count: usize, question_count: usize) -> String {
    format!(
        "Ready | {} set(s) | {} question(s) entered",
        set_count, question_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerType;

    fn question(id: &str, set_id: &str, order: usize, mark_scheme: &str) -> Question {
        Question {
            id: id.to_string(),
            set_id: set_id.to_string(),
            path: id.to_string(),
            answer_type: AnswerType::OpenText,
            text_body: format!("<p>Text of {}</p>", id),
            mark_scheme: mark_scheme.to_string(),
            needs_context: false,
            marks: 1,
            order,
            exam: "M22".to_string(),
            section: String::new(),
            topic: String::new(),
        }
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>One &amp; <b>two</b></p><p>three<br>four</p>"),
            "One & two\nthree\nfour"
        );
        assert_eq!(strip_html(r#"<p><img src="a.png"></p>"#), "");
        assert_eq!(strip_html("<p>IF A&lt;b\n  THEN&nbsp;stop</p>"), "IF A<b THEN stop");
    }

    #[test]
    fn test_preview_text_truncates() {
        let long = format!("<p>{}</p>", "x".repeat(100));
        let preview = preview_text(&long, TEXT_PREVIEW_CHARS);
        assert_eq!(preview.chars().count(), TEXT_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_outline_groups_and_sorts() {
        let sets = vec![
            QuestionSet {
                id: "s1".into(),
                label: "Q1".into(),
                section: "A".into(),
            },
            QuestionSet {
                id: "empty".into(),
                label: "Q2".into(),
                section: String::new(),
            },
        ];
        let questions = vec![
            question("b", "s1", 2, ""),
            question("a", "s1", 1, "<p>Award 1</p>"),
        ];

        let groups = outline(&sets, &questions);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].title, "Q1 (Section A)");
        assert_eq!(groups[0].rows[0].path, "a");
        assert_eq!(groups[0].rows[0].mark_scheme_preview, "Award 1");
        assert_eq!(groups[0].rows[1].mark_scheme_preview, "(none)");
        assert_eq!(groups[0].rows[1].answer_type, "1 - Open text answer");
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(2, 5), "Ready | 2 set(s) | 5 question(s) entered");
    }
}
