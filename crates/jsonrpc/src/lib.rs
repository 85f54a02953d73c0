//! JSON-RPC data contracts for the utxod wallet server boundary.
//!
//! This crate declares the wallet-server websocket notifications as plain
//! data types and provides the registry that enumerates and validates the
//! known notification kinds. Transport and dispatch live with the wallet
//! server; nothing here sends anything.

pub mod notifications;
pub mod registry;

pub use notifications::{
    AccountBalanceNtfn, ChainConnectedNtfn, NewTxNtfn, TransactionDetails, WalletLockStateNtfn,
    ACCOUNT_BALANCE_NTFN_METHOD, CHAIN_CONNECTED_NTFN_METHOD, NEW_TX_NTFN_METHOD,
    WALLET_LOCK_STATE_NTFN_METHOD,
};
pub use registry::{NotificationDescriptor, NotificationRegistry, RegistryError, UsageFlags};
