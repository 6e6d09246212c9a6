//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FLOWMATE__*` 覆盖
//! （双下划线表示嵌套，如 `FLOWMATE__NETWORK__DEFAULT=mainnet`）。

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::templater::{AddressBook, Network};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub engine: EngineSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            network: NetworkSection::default(),
            engine: EngineSection::default(),
        }
    }
}

/// [app] 段：应用名
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [network] 段：缺省网络与按网络的合约地址覆盖
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSection {
    /// 请求未显式指定时使用的网络
    #[serde(default = "default_network")]
    pub default: String,
    /// 按网络覆盖 / 补充内置地址表，如 [network.addresses.emulator] FlowToken = "0x01"
    #[serde(default)]
    pub addresses: HashMap<String, HashMap<String, String>>,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            default: default_network(),
            addresses: HashMap::new(),
        }
    }
}

fn default_network() -> String {
    "testnet".to_string()
}

impl NetworkSection {
    /// 内置地址表套上配置覆盖后的地址簿
    pub fn address_book(&self) -> AddressBook {
        let mut book = AddressBook::builtin();
        for (name, entries) in &self.addresses {
            if let Ok(network) = name.parse::<Network>() {
                book.extend(network, entries);
            } else {
                tracing::warn!(network = %name, "ignoring address overrides for unknown network");
            }
        }
        book
    }
}

/// [engine] 段：工具超时与每轮工具调用上限
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// 会话层每轮最多的工具调用数（保证 resolve→gate→template 循环终止）
    #[serde(default = "default_max_tool_steps")]
    pub max_tool_steps: u32,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
            max_tool_steps: default_max_tool_steps(),
        }
    }
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_max_tool_steps() -> u32 {
    5
}

/// 加载配置：default.toml（就近查找）→ 可选显式路径 → 环境变量覆盖
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FLOWMATE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.network.default, "testnet");
        assert_eq!(cfg.engine.max_tool_steps, 5);
        assert_eq!(cfg.engine.tool_timeout_secs, 30);
    }

    #[test]
    fn test_address_overrides_applied() {
        let mut section = NetworkSection::default();
        section.addresses.insert(
            "emulator".to_string(),
            [("FlowToken".to_string(), "0x01".to_string())].into_iter().collect(),
        );
        let book = section.address_book();
        assert_eq!(book.address(Network::Emulator, "FlowToken"), Some("0x01"));
        // 未覆盖的网络保持内置值
        assert_eq!(book.address(Network::Testnet, "FlowToken"), Some("0x7e60df042a9c0868"));
    }

    #[test]
    fn test_unknown_network_override_ignored() {
        let mut section = NetworkSection::default();
        section.addresses.insert(
            "devnet".to_string(),
            [("FlowToken".to_string(), "0x01".to_string())].into_iter().collect(),
        );
        // 不 panic，未知网络的覆盖被忽略
        let book = section.address_book();
        assert_eq!(book.address(Network::Testnet, "FlowToken"), Some("0x7e60df042a9c0868"));
    }
}
