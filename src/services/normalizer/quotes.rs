//! 双引号折叠：`""text""` → `"text"`

use once_cell::sync::Lazy;
use regex::Regex;

use crate::services::rich_content::{self, Node};

static DOUBLED_QUOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r#"""\s*([^"]*?)\s*"""#).unwrap());

/// 只处理文本节点，属性里的空值 `""` 不受影响
pub fn collapse_doubled_quotes(nodes: &mut [Node]) {
    rich_content::map_text(nodes, &|text: &str| {
        if text.contains("\"\"") {
            DOUBLED_QUOTES.replace_all(text, "\"$1\"").into_owned()
        } else {
            text.to_string()
        }
    });
}
