use serde::{Deserialize, Serialize};

use crate::channel::null_as_default;

/// `account` push. Balances are wei as decimal strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub balance: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub eth_balance: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allowance: String,
}

const WEI_PER_ETHER: f64 = 1e18;

/// Wei string to ether. Unparseable input reads as zero.
pub fn wei_to_ether(wei: &str) -> f64 {
    match wei.trim().parse::<f64>() {
        Ok(v) => v / WEI_PER_ETHER,
        Err(_) => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletState {
    /// `None` is the anonymous account.
    pub current_address: Option<String>,
    pub balance: f64,
    pub eth_balance: f64,
    pub allowance: f64,
    pub connection_status: String,
    pub approving: bool,
    pub authenticated: bool,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            current_address: None,
            balance: 0.0,
            eth_balance: 0.0,
            allowance: 0.0,
            connection_status: "starting".to_string(),
            approving: false,
            authenticated: false,
        }
    }
}

impl WalletState {
    pub fn apply_account(&mut self, info: &AccountInfo) {
        self.balance = wei_to_ether(&info.balance);
        self.eth_balance = wei_to_ether(&info.eth_balance);
        self.allowance = wei_to_ether(&info.allowance);
        if !info.address.is_empty() {
            self.current_address = Some(info.address.clone());
        }
    }

    pub fn has_xes_balance(&self) -> bool {
        self.balance > 0.0
    }

    pub fn has_ether_balance(&self) -> bool {
        self.eth_balance > 0.0
    }

    pub fn has_allowance(&self) -> bool {
        self.allowance > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_push_converts_wei() {
        let mut w = WalletState::default();
        w.apply_account(&AccountInfo {
            address: "0xme".into(),
            balance: "2500000000000000000".into(),
            eth_balance: "0".into(),
            allowance: "garbage".into(),
            ..Default::default()
        });
        assert_eq!(w.current_address.as_deref(), Some("0xme"));
        assert!((w.balance - 2.5).abs() < 1e-9);
        assert!(w.has_xes_balance());
        assert!(!w.has_ether_balance());
        assert!(!w.has_allowance());
    }

    #[test]
    fn starts_anonymous() {
        let w = WalletState::default();
        assert!(w.current_address.is_none());
        assert_eq!(w.connection_status, "starting");
    }
}
