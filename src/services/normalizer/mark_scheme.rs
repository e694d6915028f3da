//! 评分标准拆分
//!
//! 老师常把多条得分点用分号写在同一段里，这里按分号拆成一段一条

use crate::services::rich_content::{self, Node};

/// 分号后以这些词开头时视为新的得分点（不区分大小写）
const CONTINUATION_VERBS: &[&str] = &[
    "checking",
    "appropriate",
    "correct",
    "output",
    "input",
    "ensuring",
];

/// 每段至少这么多字符才拆分
const MIN_SEGMENT_CHARS: usize = 8;

/// 可以拆分的块
const SPLITTABLE: &[&str] = &["p", "div", "li"];

pub fn split_criteria(nodes: &mut Vec<Node>) {
    if !rich_content::plain_text(nodes).contains(';') {
        return;
    }
    *nodes = split_blocks(std::mem::take(nodes));
}

fn split_blocks(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element {
                tag,
                attrs,
                children,
            } if rich_content::is_block_tag(&tag) => {
                let leaf = !children.iter().any(Node::is_block);
                let segments = if leaf && SPLITTABLE.contains(&tag.as_str()) {
                    segment(&children)
                } else {
                    None
                };
                match segments {
                    Some(segments) => {
                        for segment in segments {
                            out.push(Node::Element {
                                tag: tag.clone(),
                                attrs: attrs.clone(),
                                children: segment,
                            });
                        }
                    }
                    None => out.push(Node::Element {
                        tag,
                        attrs,
                        children: split_blocks(children),
                    }),
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// 拆分一个块的内容；不满足条件时返回 `None`
fn segment(children: &[Node]) -> Option<Vec<Vec<Node>>> {
    let mut segments = Vec::new();
    let mut current: Vec<Node> = Vec::new();

    for (i, child) in children.iter().enumerate() {
        let Node::Text(text) = child else {
            current.push(child.clone());
            continue;
        };
        let mut remaining = text.as_str();
        while let Some(pos) = next_split(remaining, &children[i + 1..]) {
            rich_content::push_text(&mut current, &format!("{};", remaining[..pos].trim_end()));
            segments.push(std::mem::take(&mut current));
            remaining = remaining[pos + 1..].trim_start();
        }
        rich_content::push_text(&mut current, remaining);
    }
    segments.push(current);

    let long_enough = segments.iter().all(|segment| {
        let text = rich_content::plain_text(segment);
        text.trim().trim_end_matches(';').chars().count() >= MIN_SEGMENT_CHARS
    });
    (segments.len() >= 2 && long_enough).then_some(segments)
}

/// 下一个可拆分的分号位置
fn next_split(text: &str, following: &[Node]) -> Option<usize> {
    text.match_indices(';').map(|(pos, _)| pos).find(|&pos| {
        let after = text[pos + 1..].trim_start();
        if after.is_empty() {
            starts_criterion(rich_content::plain_text(following).trim_start())
        } else {
            starts_criterion(after)
        }
    })
}

fn starts_criterion(text: &str) -> bool {
    let word: String = text.chars().take_while(|c| c.is_alphabetic()).collect();
    let Some(first) = word.chars().next() else {
        return false;
    };
    first.is_uppercase() || CONTINUATION_VERBS.contains(&word.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rich_content::{parse, render};

    fn split(html: &str) -> String {
        let mut nodes = parse(html);
        split_criteria(&mut nodes);
        render(&nodes)
    }

    #[test]
    fn test_splits_capitalized_criteria() {
        assert_eq!(
            split(r#"<p class="ms">Correct loop; Correct output.</p>"#),
            r#"<p class="ms">Correct loop;</p><p class="ms">Correct output.</p>"#
        );
    }

    #[test]
    fn test_splits_on_known_verbs_and_across_tags() {
        let html = "<li>Award 1 mark; checking bounds; <b>Output</b> the total</li>";
        assert_eq!(
            split(html),
            "<li>Award 1 mark;</li><li>checking bounds;</li><li><b>Output</b> the total</li>"
        );
    }

    #[test]
    fn test_keeps_short_or_lowercase_segments() {
        assert_eq!(split("<p>a; B</p>"), "<p>a; B</p>");
        assert_eq!(
            split("<p>use a loop; then print</p>"),
            "<p>use a loop; then print</p>"
        );
    }

    #[test]
    fn test_nested_blocks() {
        assert_eq!(
            split("<ul><li>Correct loop; Correct output</li></ul>"),
            "<ul><li>Correct loop;</li><li>Correct output</li></ul>"
        );
    }
}
