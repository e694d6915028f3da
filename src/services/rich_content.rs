//! 富文本内容树
//!
//! 编辑器输出的是 HTML 片段。解析和序列化都交给 html5ever：
//! 实体只在文本节点里解码，输出时文本和属性值按 HTML 规则重新转义，
//! 所以 `A&lt;b` 这样的文字不会变成标签，属性值里的 `>` 也不会截断标签。
//!
//! 规范化各阶段操作的是 [`Node`] 树：解析后从 `RcDom` 转换过来，
//! 序列化前再转换回 `RcDom`。

use html5ever::serialize::{SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{
    local_name, ns, parse_fragment, serialize, Attribute, LocalName, ParseOpts, QualName,
};
use markup5ever_rcdom::{Handle, Node as DomNode, NodeData, RcDom, SerializableHandle};
use phf::{phf_set, Set};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::warn;

/// 块级标签
static BLOCK_TAGS: Set<&'static str> = phf_set! {
    "p", "div", "li", "ul", "ol", "blockquote", "pre",
    "h1", "h2", "h3", "h4", "h5", "h6",
    "table", "thead", "tbody", "tr", "td", "th",
};

/// 内容树节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// 已解码的文字
    Text(String),
    Element {
        tag: String,
        /// 属性名与解码后的属性值，保持原顺序
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(content.into())
    }

    pub fn element(tag: &str, attrs: Vec<(String, String)>, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.to_string(),
            attrs,
            children,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { tag, .. } => Some(tag),
            Node::Text(_) => None,
        }
    }

    pub fn is_block(&self) -> bool {
        self.tag().is_some_and(is_block_tag)
    }

    pub fn is_tag(&self, name: &str) -> bool {
        self.tag() == Some(name)
    }

    /// 读取属性值
    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            Node::Text(_) => None,
        }
    }

    /// 节点内的纯文本
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(std::slice::from_ref(self), &mut out);
        out
    }
}

pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(tag)
}

/// 按 `<body>` 上下文解析 HTML 片段
///
/// 未闭合、错位的标签按浏览器的规则修复；注释被丢弃
pub fn parse(html: &str) -> Vec<Node> {
    let dom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), local_name!("body")),
        Vec::new(),
        false,
    )
    .one(html);

    // 片段挂在解析器生成的 html 根元素下
    let root = dom.document.children.borrow().first().cloned();
    root.map(|root| from_dom(&root.children.borrow()))
        .unwrap_or_default()
}

fn from_dom(handles: &[Handle]) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(handles.len());
    for handle in handles {
        match &handle.data {
            NodeData::Text { contents } => push_text(&mut nodes, &contents.borrow()),
            NodeData::Element { name, attrs, .. } => nodes.push(Node::Element {
                tag: name.local.to_string(),
                attrs: attrs
                    .borrow()
                    .iter()
                    .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                    .collect(),
                children: from_dom(&handle.children.borrow()),
            }),
            _ => {}
        }
    }
    nodes
}

fn to_dom(node: &Node) -> Handle {
    let (data, children) = match node {
        Node::Text(text) => (
            NodeData::Text {
                contents: RefCell::new(text.as_str().into()),
            },
            Vec::new(),
        ),
        Node::Element {
            tag,
            attrs,
            children,
        } => (
            NodeData::Element {
                name: QualName::new(None, ns!(html), LocalName::from(tag.as_str())),
                attrs: RefCell::new(
                    attrs
                        .iter()
                        .map(|(name, value)| Attribute {
                            name: QualName::new(None, ns!(), LocalName::from(name.as_str())),
                            value: value.as_str().into(),
                        })
                        .collect(),
                ),
                template_contents: Default::default(),
                mathml_annotation_xml_integration_point: false,
            },
            children.iter().map(to_dom).collect(),
        ),
    };

    Rc::new(DomNode {
        parent: Cell::new(None),
        children: RefCell::new(children),
        data,
    })
}

/// 序列化为 HTML；文本中的 `&`、`<`、`>` 和属性值中的 `&`、`"` 会被转义
pub fn render(nodes: &[Node]) -> String {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };

    for node in nodes {
        let handle = SerializableHandle::from(to_dom(node));
        if let Err(e) = serialize(&mut output, &handle, opts.clone()) {
            warn!("⚠️ 富文本序列化失败: {}", e);
        }
    }
    String::from_utf8_lossy(&output).into_owned()
}

/// 全部文本拼接（不含标签）
pub fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element { children, .. } => collect_text(children, out),
        }
    }
}

/// 是否包含可见内容：非空白文本或图片
///
/// 编辑器清空后常留下 `<p><br></p>` 或 `&nbsp;`，这些都算空
pub fn has_visible_content(html: &str) -> bool {
    fn visit(nodes: &[Node]) -> bool {
        nodes.iter().any(|node| match node {
            Node::Text(text) => !text.trim().is_empty(),
            Node::Element { tag, children, .. } => tag == "img" || visit(children),
        })
    }
    visit(&parse(html))
}

/// 追加文字，和前一个文本节点合并
pub fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(previous)) = nodes.last_mut() {
        previous.push_str(text);
    } else {
        nodes.push(Node::text(text));
    }
}

/// 合并相邻的文本节点（递归）
pub fn merge_adjacent_text(nodes: &mut Vec<Node>) {
    let mut merged = Vec::with_capacity(nodes.len());
    for mut node in std::mem::take(nodes) {
        match node {
            Node::Text(ref text) => push_text(&mut merged, text),
            Node::Element {
                ref mut children, ..
            } => {
                merge_adjacent_text(children);
                merged.push(node);
            }
        }
    }
    *nodes = merged;
}

/// 递归访问所有节点（先序）
pub fn walk_mut(nodes: &mut [Node], visit: &mut impl FnMut(&mut Node)) {
    for node in nodes {
        visit(node);
        if let Node::Element { children, .. } = node {
            walk_mut(children, visit);
        }
    }
}

/// 对所有文本节点应用变换
pub fn map_text(nodes: &mut [Node], f: &impl Fn(&str) -> String) {
    walk_mut(nodes, &mut |node| {
        if let Node::Text(text) = node {
            *text = f(text);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render() {
        let html = r#"<p class="x">Hello <strong>world</strong><br/>next</p>"#;
        let nodes = parse(html);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_block());
        assert_eq!(render(&nodes), r#"<p class="x">Hello <strong>world</strong><br>next</p>"#);
        assert_eq!(plain_text(&nodes), "Hello worldnext");
    }

    #[test]
    fn test_comparison_is_not_a_tag() {
        let nodes = parse("<p>IF X<0 THEN</p>");
        assert_eq!(nodes[0].plain_text(), "IF X<0 THEN");
        assert_eq!(render(&nodes), "<p>IF X&lt;0 THEN</p>");
    }

    #[test]
    fn test_entities_decode_in_text_only() {
        let nodes = parse("<p>A&lt;b &amp; c&gt;d, &lt;p&gt; tags</p>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].plain_text(), "A<b & c>d, <p> tags");
        assert_eq!(render(&nodes), "<p>A&lt;b &amp; c&gt;d, &lt;p&gt; tags</p>");
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        assert_eq!(render(&parse("<p>one <b>two</p>")), "<p>one <b>two</b></p>");
        assert_eq!(render(&parse("<p>a</p></i>b")), "<p>a</p>b");
        assert_eq!(render(&parse("a<!-- note -->b")), "ab");
    }

    #[test]
    fn test_attr() {
        let nodes = parse(r#"<img alt='x' src="data:image/png;base64,AAAA">"#);
        assert_eq!(nodes[0].attr("src"), Some("data:image/png;base64,AAAA"));
        assert_eq!(nodes[0].attr("alt"), Some("x"));
        assert_eq!(nodes[0].attr("width"), None);
    }

    #[test]
    fn test_attr_with_angle_bracket_and_quotes() {
        let html = r#"<p>See <img alt="x > 0" title='say "hi"' src="a.png"> here</p>"#;
        let nodes = parse(html);
        let Node::Element { children, .. } = &nodes[0] else {
            panic!("应该解析出段落");
        };
        assert_eq!(children.len(), 3);
        assert_eq!(children[1].attr("alt"), Some("x > 0"));
        assert_eq!(children[1].attr("title"), Some(r#"say "hi""#));
        assert_eq!(
            render(&nodes),
            r#"<p>See <img alt="x > 0" title="say &quot;hi&quot;" src="a.png"> here</p>"#
        );
    }

    #[test]
    fn test_merge_adjacent_text() {
        let mut nodes = vec![
            Node::text("a"),
            Node::text("b"),
            Node::element("p", Vec::new(), vec![Node::text("c"), Node::text("d")]),
        ];
        merge_adjacent_text(&mut nodes);
        assert_eq!(render(&nodes), "ab<p>cd</p>");
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_has_visible_content() {
        assert!(!has_visible_content(""));
        assert!(!has_visible_content("<p><br></p>"));
        assert!(!has_visible_content("<p>&nbsp; </p>"));
        assert!(has_visible_content("<p>x</p>"));
        assert!(has_visible_content("<p>&lt;</p>"));
        assert!(has_visible_content(r#"<p><img src="a.png"></p>"#));
    }
}
