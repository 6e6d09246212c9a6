//! 交易模板化
//!
//! 把交易源码中的符号化 import 重写为目标网络的具体地址，两种识别形式：
//! `import X from "Y"`（保留别名）与 `import "Y"`。表内没有的合约名保持原样并产出诊断
//! （非致命：只替换已知的，绝不发明地址）。已模板化的文本不再含带引号的合约名，
//! 重跑是 no-op。网络是显式参数，模板化相对网络是纯函数。

pub mod addresses;

use std::sync::OnceLock;

use regex::{Captures, Regex};

pub use addresses::{AddressBook, Network};

/// 模板化结果：重写后的源码与未能替换的合约名（诊断）
#[derive(Debug, Clone)]
pub struct Templated {
    pub code: String,
    pub untemplated: Vec<String>,
}

static IMPORT_WITH_FROM_RE: OnceLock<Regex> = OnceLock::new();
static IMPORT_BARE_RE: OnceLock<Regex> = OnceLock::new();

fn import_with_from_re() -> &'static Regex {
    IMPORT_WITH_FROM_RE.get_or_init(|| Regex::new(r#"import\s+(\w+)\s+from\s+"(\w+)""#).unwrap())
}

fn import_bare_re() -> &'static Regex {
    IMPORT_BARE_RE.get_or_init(|| Regex::new(r#"import\s+"(\w+)""#).unwrap())
}

/// 重写源码中的符号化合约引用为 network 上的具体地址
pub fn template(code: &str, network: Network, book: &AddressBook) -> Templated {
    let mut untemplated = Vec::new();

    // 形式一：import X from "Y" → import X from 0xADDR（保留别名 X）
    let pass1 = import_with_from_re().replace_all(code, |caps: &Captures| {
        let alias = &caps[1];
        let contract = &caps[2];
        match book.address(network, contract) {
            Some(address) => format!("import {alias} from {address}"),
            None => {
                tracing::warn!(contract, %network, "no address for contract, keeping original import");
                untemplated.push(contract.to_string());
                caps[0].to_string()
            }
        }
    });

    // 形式二：import "Y" → import Y from 0xADDR
    let pass2 = import_bare_re().replace_all(&pass1, |caps: &Captures| {
        let contract = &caps[1];
        match book.address(network, contract) {
            Some(address) => format!("import {contract} from {address}"),
            None => {
                tracing::warn!(contract, %network, "no address for contract, keeping original import");
                untemplated.push(contract.to_string());
                caps[0].to_string()
            }
        }
    });

    Templated {
        code: pass2.into_owned(),
        untemplated,
    }
}
