//! 题干路径
//!
//! 题干最终以纯文本导出，段落之间用 `\n` 分隔，未提取的图片保留为标签

use once_cell::sync::Lazy;
use phf::{phf_set, Set};
use regex::Regex;

use crate::services::rich_content::{self, Node};

/// 被加粗也没有意义的词：连词、数量词和两个语言名
static STOPWORDS: Set<&'static str> = phf_set! {
    "and", "or", "but", "nor", "yet", "so", "for",
    "both", "either", "neither", "all", "some", "any",
    "java", "python",
};

/// 强调类标签
static EMPHASIS_TAGS: Set<&'static str> = phf_set! { "strong", "b", "em", "i", "u" };

static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// 压平前的处理：虚词强调、标签边上的标点、换行
pub fn prepare(nodes: &mut Vec<Node>, strip_emphasis: bool) {
    if strip_emphasis {
        strip_stopword_emphasis(nodes);
    }
    repair_tag_punctuation(nodes);
    resolve_line_breaks(nodes);
}

/// 去掉只包住一个虚词的强调标签，其它强调保持不变
pub fn strip_stopword_emphasis(nodes: &mut Vec<Node>) {
    for node in nodes.iter_mut() {
        if let Some(word) = stopword_emphasis(node) {
            *node = Node::Text(word);
        } else if let Node::Element { children, .. } = node {
            strip_stopword_emphasis(children);
        }
    }
    rich_content::merge_adjacent_text(nodes);
}

fn stopword_emphasis(node: &Node) -> Option<String> {
    let Node::Element { tag, children, .. } = node else {
        return None;
    };
    let [Node::Text(text)] = children.as_slice() else {
        return None;
    };
    let word = text.trim();
    let single_word = !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic());
    (EMPHASIS_TAGS.contains(tag.as_str())
        && single_word
        && STOPWORDS.contains(word.to_ascii_lowercase().as_str()))
    .then(|| text.clone())
}

/// 修复去标签后留下的标点问题
///
/// - `<b>Note</b>that` 补空格
/// - `<i>end.</i>.` 去掉标签内多余的句号
pub fn repair_tag_punctuation(nodes: &mut [Node]) {
    for i in 0..nodes.len() {
        if let Node::Element { children, .. } = &mut nodes[i] {
            repair_tag_punctuation(children);
        }
        if !nodes[i].tag().is_some_and(|tag| EMPHASIS_TAGS.contains(tag)) {
            continue;
        }
        let (head, tail) = nodes.split_at_mut(i + 1);
        let Some(Node::Text(next)) = tail.first_mut() else {
            continue;
        };
        if next.starts_with(|c: char| c.is_alphanumeric()) {
            next.insert(0, ' ');
        } else if next.trim_start().starts_with(['.', ',', ';', ':', '!', '?']) {
            if let Node::Element { children, .. } = &mut head[i] {
                if let Some(Node::Text(inner)) = children.last_mut() {
                    if inner.ends_with('.') {
                        inner.pop();
                    }
                }
            }
        }
    }
}

/// 换行处理
///
/// 前文以句末标点结束且后文以大写开头时视为分段，其余换行变成空格
pub fn resolve_line_breaks(nodes: &mut [Node]) {
    for i in 0..nodes.len() {
        if nodes[i].is_tag("br") {
            let before = rich_content::plain_text(&nodes[..i]);
            let after = rich_content::plain_text(&nodes[i + 1..]);
            let separator = if is_paragraph_break(&before, &after) { "\n" } else { " " };
            nodes[i] = Node::text(separator);
        } else if let Node::Element { children, .. } = &mut nodes[i] {
            resolve_line_breaks(children);
        }
    }
}

fn is_paragraph_break(before: &str, after: &str) -> bool {
    let ends_sentence = before.trim_end().ends_with(['.', '!', '?']);
    let starts_capital = after
        .trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase());
    ends_sentence && starts_capital
}

/// 压平为纯文本
///
/// 文字保持解码后的样子，不再转义；图片标签原样保留
pub fn flatten(nodes: &[Node]) -> String {
    let mut out = String::new();
    flatten_into(nodes, &mut out);

    out.split('\n')
        .map(|line| SPACE_RUN.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn flatten_into(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element { tag, children, .. } => match tag.as_str() {
                "img" => out.push_str(&rich_content::render(std::slice::from_ref(node))),
                "br" => out.push(' '),
                _ if node.is_block() => {
                    out.push('\n');
                    flatten_into(children, out);
                    out.push('\n');
                }
                _ => flatten_into(children, out),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rich_content::{parse, render};

    fn prompt(html: &str, strip_emphasis: bool) -> String {
        let mut nodes = parse(html);
        prepare(&mut nodes, strip_emphasis);
        flatten(&nodes)
    }

    #[test]
    fn test_strip_stopword_emphasis() {
        let mut nodes = parse("Use <b>both</b> loops and <em>arrays</em>");
        strip_stopword_emphasis(&mut nodes);
        assert_eq!(render(&nodes), "Use both loops and <em>arrays</em>");
        assert_eq!(nodes.len(), 2);

        let mut nodes = parse("in <strong> Java </strong>");
        strip_stopword_emphasis(&mut nodes);
        assert_eq!(render(&nodes), "in  Java ");

        let mut nodes = parse("<b>and more</b>");
        strip_stopword_emphasis(&mut nodes);
        assert_eq!(render(&nodes), "<b>and more</b>");
    }

    #[test]
    fn test_repair_tag_punctuation() {
        let mut nodes = parse("<b>Note</b>that");
        repair_tag_punctuation(&mut nodes);
        assert_eq!(render(&nodes), "<b>Note</b> that");

        let mut nodes = parse("the <i>end.</i>.");
        repair_tag_punctuation(&mut nodes);
        assert_eq!(render(&nodes), "the <i>end</i>.");
    }

    #[test]
    fn test_resolve_line_breaks() {
        assert_eq!(prompt("Line one.<br>Next line", false), "Line one.\nNext line");
        assert_eq!(prompt("a value<br/>of 5", false), "a value of 5");
        assert_eq!(prompt("Done.<br>then more", false), "Done. then more");
    }

    #[test]
    fn test_flatten_keeps_images() {
        let html = r#"<p>See <img src="data:image/png;base64,AA=="> below</p><p>Second</p>"#;
        assert_eq!(
            flatten(&parse(html)),
            "See <img src=\"data:image/png;base64,AA==\"> below\nSecond"
        );
    }

    #[test]
    fn test_flatten_keeps_escaped_text_literal() {
        assert_eq!(
            flatten(&parse("<p>IF A&lt;b AND c&gt;d THEN stop</p>")),
            "IF A<b AND c>d THEN stop"
        );
        assert_eq!(
            flatten(&parse("<p>Explain what the &lt;b&gt; element does</p>")),
            "Explain what the <b> element does"
        );
    }

    #[test]
    fn test_prepare_and_flatten() {
        let html = "<p>State <b>all</b> outputs.<br>Then <b>explain</b>the loop</p>";
        assert_eq!(prompt(html, true), "State all outputs.\nThen explain the loop");
        assert_eq!(prompt("<p><b>or</b></p>", false), "or");
    }
}
