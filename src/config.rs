//! 実行時設定。環境変数から読み込み、未設定・不正な値は既定値にフォールバックする。
//!
//! | 変数 | 既定値 | 内容 |
//! |------|--------|------|
//! | `FLASH_LOG` | `warn` | `tracing` のフィルタ（`EnvFilter` 構文） |
//! | `FLASH_BANNER` | `1` | `0` / `false` / `off` で起動バナーを出さない |
//! | `FLASH_PROMPT` | `⚡ ` | カレントディレクトリ行の後に出すプロンプト |

use std::env;

pub const DEFAULT_LOG_FILTER: &str = "warn";
pub const DEFAULT_PROMPT: &str = "⚡ ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_filter: String,
    pub banner: bool,
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            banner: true,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から組み立てる（テストでは環境変数を触らない）。
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(filter) = lookup("FLASH_LOG").filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }
        if let Some(banner) = lookup("FLASH_BANNER").and_then(|v| parse_flag(&v)) {
            config.banner = banner;
        }
        if let Some(prompt) = lookup("FLASH_PROMPT") {
            config.prompt = prompt;
        }
        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_of(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        assert_eq!(config_of(&[]), Config::default());
    }

    #[test]
    fn overrides() {
        let c = config_of(&[
            ("FLASH_LOG", "flash=debug"),
            ("FLASH_BANNER", "off"),
            ("FLASH_PROMPT", "$ "),
        ]);
        assert_eq!(c.log_filter, "flash=debug");
        assert!(!c.banner);
        assert_eq!(c.prompt, "$ ");
    }

    #[test]
    fn invalid_values_fall_back() {
        let c = config_of(&[("FLASH_LOG", "  "), ("FLASH_BANNER", "maybe")]);
        assert_eq!(c.log_filter, DEFAULT_LOG_FILTER);
        assert!(c.banner);
    }
}
