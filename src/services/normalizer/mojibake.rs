//! 乱码修复
//!
//! UTF-8 被当作 Windows-1252 再编码一次后留下的字节序列

/// 按顺序替换；单独的 `â€` 放在最后，只在更长的序列都处理完后兜底
const MOJIBAKE: &[(&str, &str)] = &[
    ("â€™", "\u{2019}"),
    ("â€˜", "\u{2018}"),
    ("â€œ", "\u{201c}"),
    ("â€\u{9d}", "\u{201d}"),
    ("â‰\u{a0}", "\u{2260}"),
    // 空白折叠后不换行空格已是普通空格
    ("â‰ ", "\u{2260}"),
    ("â‰¤", "\u{2264}"),
    ("â‰¥", "\u{2265}"),
    ("â€¢", "\u{2022}"),
    ("â€”", "\u{2014}"),
    ("â€“", "\u{2013}"),
    ("Â ", " "),
    ("â€", "\u{201d}"),
];

pub fn repair_mojibake(content: &str) -> String {
    if !content.contains('â') && !content.contains('Â') {
        return content.to_string();
    }
    let mut repaired = content.to_string();
    for (broken, intended) in MOJIBAKE {
        repaired = repaired.replace(broken, intended);
    }
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repairs_known_sequences() {
        assert_eq!(repair_mojibake("itâ€™s"), "it\u{2019}s");
        assert_eq!(repair_mojibake("â€œquotedâ€\u{9d}"), "\u{201c}quoted\u{201d}");
        assert_eq!(repair_mojibake("x â‰¤ 3 â€” y â‰¥ 1"), "x \u{2264} 3 \u{2014} y \u{2265} 1");
        assert_eq!(repair_mojibake("a â‰\u{a0} b"), "a \u{2260} b");
        assert_eq!(repair_mojibake("a â‰  b"), "a \u{2260} b");
        assert_eq!(repair_mojibake("â€¢ item"), "\u{2022} item");
    }

    #[test]
    fn test_trailing_fragment_fallback() {
        assert_eq!(repair_mojibake("end of quoteâ€"), "end of quote\u{201d}");
    }

    #[test]
    fn test_clean_text_untouched() {
        assert_eq!(repair_mojibake("plain text"), "plain text");
    }
}
