//! 图片提取
//!
//! 把内容中的内嵌图片（data URI）换成占位符 `//image:<id>.<ext>`，
//! 图片字节放进 [`AssetPackage`]，最终写入压缩包的 `images/` 目录

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use tracing::{debug, warn};

use crate::error::AssetDecodeError;
use crate::infrastructure::{IdGenerator, UuidGenerator};
use crate::services::rich_content::{self, Node};

/// 占位符前缀
pub const PLACEHOLDER_PREFIX: &str = "//image:";

/// 一张提取出来的图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// 写在内容里的占位符
    pub token: String,
    /// 文件名（`<id>.<ext>`）
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ExtractedImage {
    /// 压缩包内路径
    pub fn archive_path(&self) -> String {
        format!("images/{}", self.file_name)
    }
}

/// 导出用的图片集合，按占位符索引，保持提取顺序
#[derive(Debug, Clone, Default)]
pub struct AssetPackage {
    images: Vec<ExtractedImage>,
}

impl AssetPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image: ExtractedImage) {
        self.images.push(image);
    }

    pub fn get(&self, token: &str) -> Option<&ExtractedImage> {
        self.images.iter().find(|image| image.token == token)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractedImage> {
        self.images.iter()
    }

    pub fn total_bytes(&self) -> usize {
        self.images.iter().map(|image| image.bytes.len()).sum()
    }
}

/// 图片提取器
pub struct ImageExtractor {
    ids: Box<dyn IdGenerator>,
    skipped: usize,
}

impl ImageExtractor {
    pub fn new() -> Self {
        Self {
            ids: Box::new(UuidGenerator),
            skipped: 0,
        }
    }

    pub fn with_id_generator(ids: impl IdGenerator + 'static) -> Self {
        Self {
            ids: Box::new(ids),
            skipped: 0,
        }
    }

    /// 解码失败而被丢弃的图片数
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// 提取内容中的内嵌图片，返回替换后的内容
    ///
    /// 外链图片保持不变；解码失败的图片被丢弃，周围文字保留
    pub fn extract(&mut self, content: &str, package: &mut AssetPackage) -> String {
        if !content.to_ascii_lowercase().contains("<img") {
            return content.to_string();
        }
        let nodes = self.extract_nodes(rich_content::parse(content), package);
        rich_content::render(&nodes)
    }

    /// 在内容树上提取，图片节点换成占位符文本节点
    pub fn extract_nodes(&mut self, nodes: Vec<Node>, package: &mut AssetPackage) -> Vec<Node> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Element { ref tag, .. } if tag == "img" => {
                    let inline = node
                        .attr("src")
                        .filter(|src| is_inline(src))
                        .map(str::to_string);
                    match inline {
                        Some(src) => {
                            if let Some(token) = self.store(&src, package) {
                                rich_content::push_text(&mut out, &token);
                            }
                        }
                        None => out.push(node),
                    }
                }
                Node::Element {
                    tag,
                    attrs,
                    children,
                } => out.push(Node::Element {
                    tag,
                    attrs,
                    children: self.extract_nodes(children, package),
                }),
                Node::Text(text) => rich_content::push_text(&mut out, &text),
            }
        }
        out
    }

    /// 解码并登记一张图片，返回占位符
    fn store(&mut self, src: &str, package: &mut AssetPackage) -> Option<String> {
        match decode_data_uri(src) {
            Ok((media_type, bytes)) => {
                let file_name = format!("{}.{}", self.ids.next_id(), extension_for(&media_type));
                let token = format!("{}{}", PLACEHOLDER_PREFIX, file_name);
                debug!("提取图片 {} ({} 字节)", token, bytes.len());
                package.insert(ExtractedImage {
                    token: token.clone(),
                    file_name,
                    media_type,
                    bytes,
                });
                Some(token)
            }
            Err(e) => {
                self.skipped += 1;
                warn!("⚠️ 图片解码失败，已跳过: {}", e);
                None
            }
        }
    }
}

impl Default for ImageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn is_inline(src: &str) -> bool {
    src.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// 解析 `data:<media-type>;base64,<payload>`
pub fn decode_data_uri(src: &str) -> Result<(String, Vec<u8>), AssetDecodeError> {
    let uri = src.trim();
    let rest = uri.get(5..).unwrap_or_default();
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetDecodeError::UnsupportedEncoding {
            media_type: rest.to_string(),
        })?;

    let mut params = header.split(';');
    let media_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(AssetDecodeError::UnsupportedEncoding { media_type });
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64_STANDARD
        .decode(payload.as_bytes())
        .map_err(|source| AssetDecodeError::InvalidPayload { source })?;
    if bytes.is_empty() {
        return Err(AssetDecodeError::EmptyPayload);
    }
    Ok((media_type, bytes))
}

/// 由媒体类型推导扩展名
pub fn extension_for(media_type: &str) -> &'static str {
    match media_type.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::SequentialGenerator;

    const PNG_HEADER: &str = "iVBORw0KGgo=";

    #[test]
    fn test_replaces_inline_image_with_token() {
        let mut extractor = ImageExtractor::with_id_generator(SequentialGenerator::new("img"));
        let mut package = AssetPackage::new();
        let html = format!(r#"<p>Before <img src="data:image/png;base64,{}"> after</p>"#, PNG_HEADER);

        let out = extractor.extract(&html, &mut package);
        assert_eq!(out, "<p>Before //image:img-1.png after</p>");
        assert_eq!(package.len(), 1);

        let image = package.get("//image:img-1.png").unwrap();
        assert_eq!(image.archive_path(), "images/img-1.png");
        assert_eq!(image.bytes, vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        assert!(!out.contains("data:image"));
        assert_eq!(out.matches(PLACEHOLDER_PREFIX).count(), 1);
    }

    #[test]
    fn test_escaped_text_around_image_stays_escaped() {
        let mut extractor = ImageExtractor::with_id_generator(SequentialGenerator::new("img"));
        let mut package = AssetPackage::new();
        let html = format!(
            r#"<p>IF A&lt;b <img src="data:image/jpeg;base64,{}"> THEN &amp; stop</p>"#,
            PNG_HEADER
        );

        let out = extractor.extract(&html, &mut package);
        assert_eq!(out, "<p>IF A&lt;b //image:img-1.jpg THEN &amp; stop</p>");
        assert_eq!(package.len(), 1);
    }

    #[test]
    fn test_attribute_with_angle_bracket_or_quotes() {
        let mut extractor = ImageExtractor::with_id_generator(SequentialGenerator::new("img"));
        let mut package = AssetPackage::new();

        let html = r#"<p>See <img alt="x > 0" src="data:image/png;base64,iVBORw0KGgo="> here</p>"#;
        let out = extractor.extract(html, &mut package);
        assert_eq!(out, "<p>See //image:img-1.png here</p>");
        assert_eq!(package.len(), 1);
        assert!(!out.contains("data:"));

        let html = r#"<img title='say "hi" > bye' src="data:image/png;base64,iVBORw0KGgo=">"#;
        let out = extractor.extract(html, &mut package);
        assert_eq!(out, "//image:img-2.png");
        assert_eq!(package.len(), 2);
    }

    #[test]
    fn test_extract_nodes_merges_token_into_text() {
        let mut extractor = ImageExtractor::with_id_generator(SequentialGenerator::new("img"));
        let mut package = AssetPackage::new();
        let nodes = rich_content::parse(&format!(
            r#"Look: <img src="data:image/png;base64,{}"> done"#,
            PNG_HEADER
        ));

        let nodes = extractor.extract_nodes(nodes, &mut package);
        assert_eq!(nodes, vec![Node::text("Look: //image:img-1.png done")]);
    }

    #[test]
    fn test_bad_images_are_dropped() {
        let mut extractor = ImageExtractor::with_id_generator(SequentialGenerator::new("img"));
        let mut package = AssetPackage::new();

        let out = extractor.extract(r#"<p>a <img src="data:image/png;base64,@@@"> b</p>"#, &mut package);
        assert_eq!(out, "<p>a  b</p>");
        let out = extractor.extract(r#"<p><img src="data:image/svg+xml,%3Csvg%3E"></p>"#, &mut package);
        assert_eq!(out, "<p></p>");

        assert!(package.is_empty());
        assert_eq!(extractor.skipped(), 2);
    }

    #[test]
    fn test_external_images_untouched() {
        let mut extractor = ImageExtractor::new();
        let mut package = AssetPackage::new();
        let html = r#"<p><img src="https://example.com/a.png"></p>"#;
        assert_eq!(extractor.extract(html, &mut package), html);
        assert!(package.is_empty());
    }

    #[test]
    fn test_decode_data_uri_errors() {
        assert!(matches!(
            decode_data_uri("data:image/png,abc"),
            Err(AssetDecodeError::UnsupportedEncoding { .. })
        ));
        assert!(matches!(
            decode_data_uri("data:image/png;base64,"),
            Err(AssetDecodeError::EmptyPayload)
        ));
        assert!(matches!(
            decode_data_uri("data:image/png;base64,!!"),
            Err(AssetDecodeError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/JPEG"), "jpg");
        assert_eq!(extension_for("image/svg+xml"), "svg");
        assert_eq!(extension_for("application/octet-stream"), "bin");
    }
}
