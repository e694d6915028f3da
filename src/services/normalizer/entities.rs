//! 实体与空白
//!
//! 实体由解析器在文本节点中解码，这一步只处理解码后的空白：
//! 不换行空格换成普通空格，连续空白折叠成一个

use once_cell::sync::Lazy;
use regex::Regex;

use crate::services::rich_content::{self, Node};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\u{a0}]+").unwrap());

/// 折叠所有文本节点中的空白
pub fn collapse_whitespace(nodes: &mut [Node]) {
    rich_content::map_text(nodes, &|text: &str| {
        WHITESPACE_RUN.replace_all(text, " ").into_owned()
    });
}
