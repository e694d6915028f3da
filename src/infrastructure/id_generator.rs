//! ID 生成器 - 基础设施层
//!
//! 为题组和题目生成不透明的唯一 ID

use uuid::Uuid;

/// ID 生成能力
///
/// 存储只依赖此 trait，测试中可替换为确定性的实现
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> String;
}

/// 随机 UUID（v4）生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> String {
        new_id()
    }
}

/// 生成一个形如 `xxxxxxxx-xxxx-4xxx-[89ab]xxx-xxxxxxxxxxxx` 的随机 ID
pub fn new_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// 顺序 ID 生成器（`<prefix>-1`、`<prefix>-2` ...）
#[derive(Debug, Clone)]
pub struct SequentialGenerator {
    prefix: String,
    counter: u64,
}

impl SequentialGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }
}

impl IdGenerator for SequentialGenerator {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{}-{}", self.prefix, self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_layout() {
        let id = new_id();
        let groups: Vec<&str> = id.split('-').collect();
        assert_eq!(
            groups.iter().map(|g| g.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 4, 12]
        );
        // 版本位 4，变体位 10xx
        assert!(groups[2].starts_with('4'));
        assert!(matches!(groups[3].chars().next(), Some('8' | '9' | 'a' | 'b')));
        assert!(id.chars().all(|c| c == '-' || c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_uuid_generator_no_collisions() {
        let mut generator = UuidGenerator;
        let ids: HashSet<String> = (0..1000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_sequential_generator() {
        let mut generator = SequentialGenerator::new("q");
        assert_eq!(generator.next_id(), "q-1");
        assert_eq!(generator.next_id(), "q-2");
    }
}
