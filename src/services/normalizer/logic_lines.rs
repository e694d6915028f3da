//! 条件表达式修复
//!
//! 伪代码题的条件常被编辑器拆开，比如 `IF X =` 和 `0 THEN` 落在两个段落里

use once_cell::sync::Lazy;
use regex::Regex;

use crate::services::rich_content::{self, Node};

static SPACED_COMPARISON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*(<=|>=|<>|!=|==|=|<|>|≠|≤|≥)\s*(-?\d)").unwrap()
});

/// 结尾是这些词时，条件还没写完
const KEYWORDS: &[&str] = &["IF", "WHILE", "UNTIL", "AND", "OR", "NOT", "MOD", "DIV"];

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '!', '≠', '≤', '≥'];

/// 只合并同类的段落级块
const MERGEABLE: &[&str] = &["p", "div", "li"];

pub fn repair_logic_lines(nodes: &mut Vec<Node>) {
    *nodes = merge_fragments(std::mem::take(nodes));
    rich_content::map_text(nodes, &|text: &str| tighten_comparisons(text));
}

/// `X < 0` → `X<0`
pub fn tighten_comparisons(text: &str) -> String {
    SPACED_COMPARISON.replace_all(text, "$1$2$3").into_owned()
}

fn merge_fragments(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = match node {
            Node::Element {
                tag,
                attrs,
                children,
            } => Node::Element {
                tag,
                attrs,
                children: merge_fragments(children),
            },
            text => text,
        };

        if let Some(previous) = out.last_mut() {
            if can_join_blocks(previous, &node) {
                join_blocks(previous, node);
                continue;
            }
        }

        if let Node::Text(next) = &node {
            if joins_across_break(&out, next) {
                out.pop();
                if let Some(Node::Text(before)) = out.last_mut() {
                    glue(before, next);
                }
                continue;
            }
        }
        out.push(node);
    }
    out
}

/// `[文本, <br>, 文本]` 中前一段没写完
fn joins_across_break(out: &[Node], next: &str) -> bool {
    match out {
        [.., Node::Text(before), br] => {
            br.is_tag("br") && ends_mid_condition(before) && starts_continuation(next)
        }
        _ => false,
    }
}

fn can_join_blocks(previous: &Node, next: &Node) -> bool {
    let (Some(a), Some(b)) = (previous.tag(), next.tag()) else {
        return false;
    };
    a == b
        && MERGEABLE.contains(&a)
        && ends_mid_condition(&previous.plain_text())
        && starts_continuation(&next.plain_text())
}

fn join_blocks(previous: &mut Node, next: Node) {
    let (Node::Element { children: head, .. }, Node::Element { children: tail, .. }) =
        (previous, next)
    else {
        return;
    };
    if let Some(Node::Text(text)) = head.last_mut() {
        let end = text.trim_end().len();
        text.truncate(end);
    }
    let mut tail = tail.into_iter();
    match tail.next() {
        Some(Node::Text(first)) => match head.last_mut() {
            Some(Node::Text(text)) => glue(text, &first),
            _ => head.push(Node::text(first.trim_start())),
        },
        Some(first) => head.push(first),
        None => {}
    }
    head.extend(tail);
}

/// 拼接两段文字；两边都是字母数字时保留一个空格
fn glue(before: &mut String, after: &str) {
    let end = before.trim_end().len();
    before.truncate(end);
    let after = after.trim_start();
    let word_boundary = before.ends_with(|c: char| c.is_alphanumeric())
        && after.starts_with(|c: char| c.is_alphanumeric());
    if word_boundary {
        before.push(' ');
    }
    before.push_str(after);
}

fn ends_mid_condition(text: &str) -> bool {
    let text = text.trim_end();
    if text.ends_with(OPERATOR_CHARS) {
        return true;
    }
    text.split_whitespace()
        .last()
        .is_some_and(|word| KEYWORDS.contains(&word))
}

fn starts_continuation(text: &str) -> bool {
    text.trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || OPERATOR_CHARS.contains(&c))
}
