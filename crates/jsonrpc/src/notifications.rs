//! Wallet server websocket notifications.
//!
//! These are fire-and-forget messages pushed to subscribed clients; no
//! response is expected. Each notification is a pure data contract with a
//! method name and a serializable payload.

use serde::{Deserialize, Serialize};

/// Method name for account balance notifications.
pub const ACCOUNT_BALANCE_NTFN_METHOD: &str = "accountbalance";

/// Method name for notifications about the wallet server's connection to
/// its chain server.
pub const CHAIN_CONNECTED_NTFN_METHOD: &str = "chainconnected";

/// Method name for notifications about the wallet lock state changing.
pub const WALLET_LOCK_STATE_NTFN_METHOD: &str = "walletlockstate";

/// Method name for notifications about a new transaction being recorded in
/// the wallet's transaction store.
pub const NEW_TX_NTFN_METHOD: &str = "newtx";

/// Payload of the `accountbalance` notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalanceNtfn {
    /// Name of the account whose balance changed.
    pub account: String,
    /// New balance, in coins.
    pub balance: f64,
    /// Whether the balance is confirmed or unconfirmed.
    pub confirmed: bool,
}

impl AccountBalanceNtfn {
    /// Creates a new `accountbalance` notification payload.
    pub fn new(account: String, balance: f64, confirmed: bool) -> Self {
        Self {
            account,
            balance,
            confirmed,
        }
    }
}

/// Payload of the `chainconnected` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConnectedNtfn {
    /// Whether the wallet server is connected to its chain server.
    pub connected: bool,
}

impl ChainConnectedNtfn {
    /// Creates a new `chainconnected` notification payload.
    pub fn new(connected: bool) -> Self {
        Self { connected }
    }
}

/// Payload of the `walletlockstate` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletLockStateNtfn {
    /// Whether the wallet is locked.
    pub locked: bool,
}

impl WalletLockStateNtfn {
    /// Creates a new `walletlockstate` notification payload.
    pub fn new(locked: bool) -> Self {
        Self { locked }
    }
}

/// Detail record describing one transaction affecting a wallet account,
/// carried by the `newtx` notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    /// Account the transaction touches.
    pub account: String,
    /// Receiving address, when one applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Transaction category, e.g. "send" or "receive".
    pub category: String,
    /// Amount in coins; negative for sends.
    pub amount: f64,
    /// Fee paid, in coins. Only present on sends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    /// Number of confirmations.
    pub confirmations: i64,
    /// Transaction id.
    pub txid: String,
    /// Unix time the transaction was recorded.
    pub time: u64,
}

/// Payload of the `newtx` notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTxNtfn {
    /// Account the transaction was recorded under.
    pub account: String,
    /// Detail record for the recorded transaction.
    pub details: TransactionDetails,
}

impl NewTxNtfn {
    /// Creates a new `newtx` notification payload.
    pub fn new(account: String, details: TransactionDetails) -> Self {
        Self { account, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_balance_ntfn_serialization() {
        let ntfn = AccountBalanceNtfn::new("default".to_string(), 1.25, true);
        let value = serde_json::to_value(&ntfn).unwrap();

        assert_eq!(value["account"], "default");
        assert_eq!(value["balance"], 1.25);
        assert_eq!(value["confirmed"], true);
    }

    #[test]
    fn test_new_tx_ntfn_optional_fields_omitted() {
        let details = TransactionDetails {
            account: "default".to_string(),
            address: None,
            category: "receive".to_string(),
            amount: 0.5,
            fee: None,
            confirmations: 0,
            txid: "ab".repeat(32),
            time: 1_700_000_000,
        };
        let value = serde_json::to_value(NewTxNtfn::new("default".to_string(), details)).unwrap();

        let detail_obj = value["details"].as_object().unwrap();
        assert!(!detail_obj.contains_key("address"));
        assert!(!detail_obj.contains_key("fee"));
        assert_eq!(detail_obj["category"], "receive");
    }
}
