//! 合约地址表
//!
//! network → (合约名 → 地址) 的配置数据，内置 flow.json 中的部署地址，
//! 可用配置文件按网络覆盖或补充。模板化只替换表内已知的合约名。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::EngineError;

/// 目标网络（显式参数，逐调用传递，进程内不保存「当前网络」可变状态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Emulator,
}

impl FromStr for Network {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "emulator" => Ok(Network::Emulator),
            other => Err(EngineError::Validation {
                field: "network".to_string(),
                message: format!("unknown network: {other}"),
            }),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Emulator => "emulator",
        };
        f.write_str(s)
    }
}

/// 每网络一张合约地址表
#[derive(Debug, Clone)]
pub struct AddressBook {
    networks: HashMap<Network, HashMap<String, String>>,
}

fn table(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl AddressBook {
    /// 内置地址表（flow.json 的部署配置）
    pub fn builtin() -> Self {
        let mut networks = HashMap::new();
        networks.insert(
            Network::Mainnet,
            table(&[
                ("FlowToken", "0x1654653399040a61"),
                ("USDCFlow", "0xf1ab99c82dee3526"),
                ("stFlowToken", "0xd6f80565193ad727"),
                ("FlowMateScheduledActionsHandler", "0x136a10c590912ef8"),
                ("FungibleToken", "0xf233dcee88fe0abe"),
                ("FungibleTokenMetadataViews", "0xf233dcee88fe0abe"),
                ("FlowTransactionScheduler", "0xe467b9dd11fa00df"),
                ("FlowTransactionSchedulerUtils", "0xe467b9dd11fa00df"),
                ("DeFiActions", "0x92195d814edf9cb0"),
                ("SwapRouter", "0xa6850776a94e6551"),
                ("IncrementFiSwapConnectors", "0xefa9bd7d1b17f1ed"),
                ("Staking", "0x1b77ba4b414de352"),
                ("StakingError", "0x1b77ba4b414de352"),
                ("SwapConfig", "0xb78ef7afa52ff906"),
                ("SwapError", "0xb78ef7afa52ff906"),
                ("SwapInterfaces", "0xb78ef7afa52ff906"),
                ("IncrementFiStakingConnectors", "0xefa9bd7d1b17f1ed"),
                ("IncrementFiFlashloanConnectors", "0xefa9bd7d1b17f1ed"),
            ]),
        );
        networks.insert(
            Network::Testnet,
            table(&[
                ("FlowToken", "0x7e60df042a9c0868"),
                ("USDCFlow", "0x64adf39cbc354fcb"),
                ("stFlowToken", "0xd6f80565193ad727"),
                ("FlowMateScheduledActionsHandler", "0x136a10c590912ef8"),
                ("FungibleToken", "0x9a0766d93b6608b7"),
                ("FungibleTokenMetadataViews", "0x9a0766d93b6608b7"),
                ("FlowTransactionScheduler", "0x8c5303eaa26202d6"),
                ("FlowTransactionSchedulerUtils", "0x8c5303eaa26202d6"),
                ("DeFiActions", "0x4c2ff9dd03ab442f"),
                ("SwapRouter", "0x2f8af5ed05bbde0d"),
                ("IncrementFiSwapConnectors", "0x49bae091e5ea16b5"),
                ("Staking", "0x26a1e94319e81a3c"),
                ("StakingError", "0x26a1e94319e81a3c"),
                ("SwapConfig", "0x8d5b9dd833e176da"),
                ("SwapError", "0x8d5b9dd833e176da"),
                ("SwapInterfaces", "0x8d5b9dd833e176da"),
                ("IncrementFiStakingConnectors", "0x49bae091e5ea16b5"),
                ("IncrementFiFlashloanConnectors", "0x49bae091e5ea16b5"),
            ]),
        );
        networks.insert(
            Network::Emulator,
            table(&[
                ("FlowToken", "0x0ae53cb6e3f42a79"),
                ("USDCFlow", "0xf8d6e0586b0a20c7"),
                ("stFlowToken", "0xd6f80565193ad727"),
                ("FlowMateScheduledActionsHandler", "0x136a10c590912ef8"),
                ("FungibleToken", "0xee82856bf20e2aa6"),
                ("FungibleTokenMetadataViews", "0xee82856bf20e2aa6"),
                ("FlowTransactionScheduler", "0xf8d6e0586b0a20c7"),
                ("FlowTransactionSchedulerUtils", "0xf8d6e0586b0a20c7"),
                ("DeFiActions", "0xf8d6e0586b0a20c7"),
                ("SwapRouter", "0xf8d6e0586b0a20c7"),
                ("IncrementFiSwapConnectors", "0xf8d6e0586b0a20c7"),
                ("Staking", "0xf8d6e0586b0a20c7"),
                ("StakingError", "0xf8d6e0586b0a20c7"),
                ("SwapConfig", "0xf8d6e0586b0a20c7"),
                ("SwapError", "0xf8d6e0586b0a20c7"),
                ("SwapInterfaces", "0xf8d6e0586b0a20c7"),
                ("IncrementFiStakingConnectors", "0xf8d6e0586b0a20c7"),
                ("IncrementFiFlashloanConnectors", "0xf8d6e0586b0a20c7"),
            ]),
        );
        Self { networks }
    }

    /// 空表（测试用）
    pub fn empty() -> Self {
        Self {
            networks: HashMap::new(),
        }
    }

    /// 查某网络上的合约地址
    pub fn address(&self, network: Network, contract: &str) -> Option<&str> {
        self.networks
            .get(&network)
            .and_then(|t| t.get(contract))
            .map(String::as_str)
    }

    /// 覆盖 / 补充某网络的条目（配置加载用）
    pub fn extend(&mut self, network: Network, entries: &HashMap<String, String>) {
        let t = self.networks.entry(network).or_default();
        for (k, v) in entries {
            t.insert(k.clone(), v.clone());
        }
    }

    /// 插入单条（测试与配置用）
    pub fn insert(&mut self, network: Network, contract: &str, address: &str) {
        self.networks
            .entry(network)
            .or_default()
            .insert(contract.to_string(), address.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parse_and_display() {
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
        assert!("devnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_builtin_tables_differ_per_network() {
        let book = AddressBook::builtin();
        assert_eq!(book.address(Network::Mainnet, "FlowToken"), Some("0x1654653399040a61"));
        assert_eq!(book.address(Network::Testnet, "FlowToken"), Some("0x7e60df042a9c0868"));
        assert_ne!(
            book.address(Network::Mainnet, "FlowToken"),
            book.address(Network::Emulator, "FlowToken")
        );
    }

    #[test]
    fn test_extend_overrides() {
        let mut book = AddressBook::builtin();
        let overrides: HashMap<String, String> =
            [("FlowToken".to_string(), "0x01".to_string())].into_iter().collect();
        book.extend(Network::Emulator, &overrides);
        assert_eq!(book.address(Network::Emulator, "FlowToken"), Some("0x01"));
        // 其他网络不受影响
        assert_eq!(book.address(Network::Testnet, "FlowToken"), Some("0x7e60df042a9c0868"));
    }
}
