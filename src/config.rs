use std::str::FromStr;
use tracing::warn;

use crate::error::ConfigError;
use crate::models::ExamCodeRule;
use crate::services::normalizer::NormalizeOptions;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 快照文件（或存放快照的目录）
    pub snapshot_path: String,
    /// 导出目录
    pub output_dir: String,
    /// 考试代码规则：`prefix` / `prefix_year` / 正则
    pub exam_code_rule: String,
    /// 关闭的修复规则名称
    pub disabled_heuristics: Vec<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否在压缩包之外另存一份 CSV
    pub write_csv_alongside: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_path: "exam_snapshot.json".to_string(),
            output_dir: "export".to_string(),
            exam_code_rule: "prefix_year".to_string(),
            disabled_heuristics: Vec::new(),
            verbose_logging: false,
            output_log_file: "export_log.txt".to_string(),
            write_csv_alongside: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源读取，便于测试
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        Self {
            snapshot_path: lookup("SNAPSHOT_PATH").unwrap_or(default.snapshot_path),
            output_dir: lookup("OUTPUT_DIR").unwrap_or(default.output_dir),
            exam_code_rule: lookup("EXAM_CODE_RULE").unwrap_or(default.exam_code_rule),
            disabled_heuristics: lookup("DISABLED_HEURISTICS")
                .map(|v| split_list(&v))
                .unwrap_or(default.disabled_heuristics),
            verbose_logging: parse_or_default(
                "VERBOSE_LOGGING",
                lookup("VERBOSE_LOGGING"),
                default.verbose_logging,
            ),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            write_csv_alongside: parse_or_default(
                "WRITE_CSV_ALONGSIDE",
                lookup("WRITE_CSV_ALONGSIDE"),
                default.write_csv_alongside,
            ),
        }
    }

    /// 规范化选项
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions::with_disabled(self.disabled_heuristics.iter().map(String::as_str))
    }

    /// 编译考试代码规则
    pub fn exam_code_rule(&self) -> Result<ExamCodeRule, ConfigError> {
        ExamCodeRule::parse(&self.exam_code_rule)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 解析失败时记录警告并使用默认值
fn parse_or_default<T: FromStr + std::fmt::Debug>(
    var_name: &str,
    value: Option<String>,
    default: T,
) -> T {
    let Some(value) = value else {
        return default;
    };
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            let err = ConfigError::InvalidValue {
                var_name: var_name.to_string(),
                value,
                expected: std::any::type_name::<T>().to_string(),
            };
            warn!("⚠️ {}，使用默认值 {:?}", err, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalizer::Heuristic;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.snapshot_path, "exam_snapshot.json");
        assert_eq!(config.output_dir, "export");
        assert!(config.write_csv_alongside);
        assert!(!config.verbose_logging);
        assert_eq!(config.exam_code_rule().unwrap().pattern(), r"^[MN]\d{2}");
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = Config::from_lookup(lookup(&[
            ("VERBOSE_LOGGING", "true"),
            ("WRITE_CSV_ALONGSIDE", "nope"),
            ("DISABLED_HEURISTICS", "mojibake, logic-lines,,"),
            ("EXAM_CODE_RULE", "prefix"),
        ]));
        assert!(config.verbose_logging);
        assert!(config.write_csv_alongside);
        assert_eq!(config.disabled_heuristics, vec!["mojibake", "logic-lines"]);

        let options = config.normalize_options();
        assert!(!options.is_enabled(Heuristic::Mojibake));
        assert!(!options.is_enabled(Heuristic::LogicLines));
        assert_eq!(config.exam_code_rule().unwrap().pattern(), r"^[MN]");
    }

    #[test]
    fn test_invalid_rule_is_config_error() {
        let config = Config::from_lookup(lookup(&[("EXAM_CODE_RULE", "^[MN")]));
        assert!(matches!(
            config.exam_code_rule(),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
