//! 空格修复与句末补句号

use once_cell::sync::Lazy;
use regex::Regex;

use crate::services::rich_content::{self, Node};

/// 只在后面是大写字母时补空格，`e.g.` 和小数不受影响
static MISSING_SENTENCE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.!?])(\p{Lu})").unwrap());

/// 句末标点后直接跟大写字母时补一个空格
pub fn insert_sentence_spaces(nodes: &mut [Node]) {
    rich_content::map_text(nodes, &|text: &str| {
        MISSING_SENTENCE_SPACE.replace_all(text, "$1 $2").into_owned()
    });
}

/// 每个块的最后一段文字以字母结尾时补句号
///
/// 没有块级元素时把整段内容当作一个块
pub fn complete_sentences(nodes: &mut [Node]) {
    if nodes.iter().any(Node::is_block) {
        complete_blocks(nodes);
    } else {
        terminate_last_text(nodes);
    }
}

fn complete_blocks(nodes: &mut [Node]) {
    for node in nodes.iter_mut() {
        let is_block = node.is_block();
        if let Node::Element { children, .. } = node {
            complete_blocks(children);
            if is_block {
                terminate_last_text(children);
            }
        }
    }
}

/// 返回是否遇到了可见内容
fn terminate_last_text(nodes: &mut [Node]) -> bool {
    for node in nodes.iter_mut().rev() {
        match node {
            Node::Text(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                let end = text.trim_end().len();
                if text[..end].chars().last().is_some_and(char::is_alphabetic) {
                    text.insert(end, '.');
                }
                return true;
            }
            Node::Element { tag, children, .. } => match tag.as_str() {
                "br" => continue,
                "img" => return true,
                _ if rich_content::is_block_tag(tag) => return true,
                _ => {
                    if terminate_last_text(children) {
                        return true;
                    }
                }
            },
        }
    }
    false
}
