//! Registry of known notification kinds.
//!
//! The wallet server only dispatches notifications whose method name,
//! capability flags, and payload shape were registered up front. The
//! registry is built during an explicit initialization step and handed to
//! whatever component serializes notifications; nothing registers itself
//! as a side effect of being linked in.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::{BitOr, BitOrAssign};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::notifications::{
    ACCOUNT_BALANCE_NTFN_METHOD, CHAIN_CONNECTED_NTFN_METHOD, NEW_TX_NTFN_METHOD,
    WALLET_LOCK_STATE_NTFN_METHOD,
};

/// Flags describing where a registered method is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageFlags(pub u8);

impl UsageFlags {
    /// No flags.
    pub const NONE: Self = Self(0);

    /// Only usable against a wallet server.
    pub const WALLET_ONLY: Self = Self(0x01);

    /// Only usable over a websocket transport.
    pub const WEBSOCKET_ONLY: Self = Self(0x02);

    /// A notification: fire-and-forget, no response expected.
    pub const NOTIFICATION: Self = Self(0x04);

    /// Checks if the flags include the specified flags.
    pub fn has_flag(&self, flag: Self) -> bool {
        (self.0 & flag.0) == flag.0
    }
}

impl BitOr for UsageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for UsageFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Describes one registered notification: its method name, usage flags,
/// and the top-level fields its payload object carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationDescriptor {
    method: &'static str,
    flags: UsageFlags,
    fields: &'static [&'static str],
}

impl NotificationDescriptor {
    /// Creates a new notification descriptor.
    pub fn new(method: &'static str, flags: UsageFlags, fields: &'static [&'static str]) -> Self {
        Self {
            method,
            flags,
            fields,
        }
    }

    /// Returns the method name.
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Returns the usage flags.
    pub fn flags(&self) -> UsageFlags {
        self.flags
    }

    /// Returns the payload's top-level field names.
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }
}

/// Errors surfaced by the notification registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A method name was registered twice.
    #[error("notification method '{0}' is already registered")]
    DuplicateMethod(&'static str),

    /// A method name was looked up that was never registered.
    #[error("notification method '{0}' is not registered")]
    UnknownMethod(String),

    /// A descriptor without the notification flag was offered to the
    /// registry.
    #[error("descriptor for '{0}' is not flagged as a notification")]
    NotANotification(&'static str),

    /// A payload did not match the registered shape for its method.
    #[error("malformed '{method}' payload: {reason}")]
    MalformedPayload {
        /// Method the payload was validated against.
        method: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Immutable-after-construction mapping from notification method names to
/// their descriptors.
#[derive(Debug, Clone, Default)]
pub struct NotificationRegistry {
    by_method: HashMap<&'static str, NotificationDescriptor>,
}

impl NotificationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            by_method: HashMap::new(),
        }
    }

    /// Creates a registry preloaded with the wallet server's notification
    /// set: account balance, chain connectivity, wallet lock state, and
    /// new transaction.
    pub fn with_wallet_notifications() -> Self {
        let flags = UsageFlags::WALLET_ONLY | UsageFlags::WEBSOCKET_ONLY | UsageFlags::NOTIFICATION;

        let mut registry = Self::new();
        let descriptors = [
            NotificationDescriptor::new(
                ACCOUNT_BALANCE_NTFN_METHOD,
                flags,
                &["account", "balance", "confirmed"],
            ),
            NotificationDescriptor::new(CHAIN_CONNECTED_NTFN_METHOD, flags, &["connected"]),
            NotificationDescriptor::new(WALLET_LOCK_STATE_NTFN_METHOD, flags, &["locked"]),
            NotificationDescriptor::new(NEW_TX_NTFN_METHOD, flags, &["account", "details"]),
        ];
        for descriptor in descriptors {
            registry
                .register(descriptor)
                .expect("built-in notification methods are distinct");
        }

        debug!(
            "registered {} built-in wallet notifications",
            registry.len()
        );
        registry
    }

    /// Registers a notification descriptor.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - The descriptor to register
    ///
    /// # Returns
    ///
    /// An error if the method name is already registered or the descriptor
    /// is not flagged as a notification.
    pub fn register(&mut self, descriptor: NotificationDescriptor) -> Result<(), RegistryError> {
        if !descriptor.flags().has_flag(UsageFlags::NOTIFICATION) {
            return Err(RegistryError::NotANotification(descriptor.method()));
        }

        match self.by_method.entry(descriptor.method()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateMethod(descriptor.method())),
            Entry::Vacant(slot) => {
                slot.insert(descriptor);
                Ok(())
            }
        }
    }

    /// Returns the descriptor registered for a method, if any.
    pub fn get(&self, method: &str) -> Option<&NotificationDescriptor> {
        self.by_method.get(method)
    }

    /// Returns whether a method is registered.
    pub fn contains(&self, method: &str) -> bool {
        self.by_method.contains_key(method)
    }

    /// Returns an iterator over the registered method names.
    pub fn methods(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_method.keys().copied()
    }

    /// Returns the number of registered methods.
    pub fn len(&self) -> usize {
        self.by_method.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_method.is_empty()
    }

    /// Validates a serialized payload against the registered shape for a
    /// method: the payload must be a JSON object carrying exactly the
    /// declared top-level fields.
    ///
    /// # Arguments
    ///
    /// * `method` - The notification method the payload belongs to
    /// * `payload` - The serialized payload to check
    pub fn validate_payload(&self, method: &str, payload: &Value) -> Result<(), RegistryError> {
        let descriptor = self
            .by_method
            .get(method)
            .ok_or_else(|| RegistryError::UnknownMethod(method.to_string()))?;

        let object = payload
            .as_object()
            .ok_or_else(|| RegistryError::MalformedPayload {
                method: method.to_string(),
                reason: "payload is not an object".to_string(),
            })?;

        for field in descriptor.fields() {
            if !object.contains_key(*field) {
                return Err(RegistryError::MalformedPayload {
                    method: method.to_string(),
                    reason: format!("missing field '{field}'"),
                });
            }
        }

        if let Some(extra) = object
            .keys()
            .find(|key| !descriptor.fields().iter().any(|field| *field == key.as_str()))
        {
            return Err(RegistryError::MalformedPayload {
                method: method.to_string(),
                reason: format!("unexpected field '{extra}'"),
            });
        }

        Ok(())
    }
}
