//! 小标题去句号
//!
//! 补句号的规则会把 "Accept" 这类小标题变成 "Accept."，这里再去掉

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;
use crate::services::rich_content::Node;

pub const DEFAULT_HEADERS: &[&str] = &[
    "Accept",
    "Do not accept",
    "Note",
    "Notes to examiners",
    "Award",
    "Answers may include",
    "Example answer",
    "Mark scheme",
    "Marking notes",
];

static DEFAULT_PATTERN: Lazy<Regex> = Lazy::new(|| build_pattern(DEFAULT_HEADERS).unwrap());

/// 小标题规则
#[derive(Debug, Clone)]
pub struct HeaderRule {
    pattern: Option<Regex>,
}

impl HeaderRule {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Result<Self, ConfigError> {
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.as_ref().trim())
            .filter(|h| !h.is_empty())
            .collect();
        if names.is_empty() {
            return Ok(Self { pattern: None });
        }
        Ok(Self {
            pattern: Some(build_pattern(&names)?),
        })
    }

    /// 小标题是元素内最后一段完整文字时去掉其后的句号
    pub fn strip_periods(&self, nodes: &mut [Node]) {
        if let Some(pattern) = &self.pattern {
            strip_last_text(pattern, nodes);
        }
    }
}

impl Default for HeaderRule {
    fn default() -> Self {
        Self {
            pattern: Some(DEFAULT_PATTERN.clone()),
        }
    }
}

fn strip_last_text(pattern: &Regex, nodes: &mut [Node]) {
    for node in nodes.iter_mut() {
        if let Node::Element { children, .. } = node {
            strip_last_text(pattern, children);
        }
    }
    if let Some(Node::Text(text)) = nodes.last_mut() {
        if pattern.is_match(text) {
            *text = pattern.replace(text, "$1$2").into_owned();
        }
    }
}

fn build_pattern(headers: &[&str]) -> Result<Regex, regex::Error> {
    let mut names = headers.to_vec();
    // 长的优先，"Notes to examiners" 不能被 "Note" 截断
    names.sort_by_key(|h| std::cmp::Reverse(h.len()));
    let alternation = names
        .iter()
        .map(|h| regex::escape(h))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"^(\s*(?:{}))\.(\s*)$", alternation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rich_content::{parse, render};

    fn strip(rule: &HeaderRule, html: &str) -> String {
        let mut nodes = parse(html);
        rule.strip_periods(&mut nodes);
        render(&nodes)
    }

    #[test]
    fn test_strips_header_periods() {
        let rule = HeaderRule::default();
        assert_eq!(
            strip(&rule, "<p>Accept.</p><p>Note.</p>"),
            "<p>Accept</p><p>Note</p>"
        );
        assert_eq!(strip(&rule, "<p><b>Do not accept.</b></p>"), "<p><b>Do not accept</b></p>");
        assert_eq!(strip(&rule, "Notes to examiners."), "Notes to examiners");
    }

    #[test]
    fn test_leaves_sentences() {
        let rule = HeaderRule::default();
        assert_eq!(
            strip(&rule, "<p>Accept the answer.</p>"),
            "<p>Accept the answer.</p>"
        );
    }

    #[test]
    fn test_custom_headers() {
        let rule = HeaderRule::new(&["Method"]).unwrap();
        assert_eq!(strip(&rule, "<p>Method.</p><p>Accept.</p>"), "<p>Method</p><p>Accept.</p>");

        let none = HeaderRule::new::<&str>(&[]).unwrap();
        assert_eq!(strip(&none, "<p>Accept.</p>"), "<p>Accept.</p>");
    }
}
