//! Currency Definitions
//!
//! A `Currency` is a read snapshot of one virtual currency's configuration:
//! payout cadence, base amount, per-group bonuses, and transfer policy. The
//! configuration store owns the live definitions; the engine only ever holds
//! a snapshot taken at evaluation or invocation time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Whether users may transfer this currency to each other with `give`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferPolicy {
    Allow,
    Disallow,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        TransferPolicy::Allow
    }
}

/// One currency's configuration snapshot.
///
/// `interval` is signed on purpose: a zero or negative interval is invalid
/// configuration that must evaluate as "never due" rather than being
/// unrepresentable, so a bad saved definition cannot take the scheduler down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    /// Unique, stable identifier. Command bindings are keyed by this.
    pub id: String,
    /// Display name used in triggers and chat lines.
    pub name: String,
    /// Minutes between payouts.
    pub interval: i64,
    /// Base amount credited to every online user on a payout tick.
    pub payout: i64,
    /// Inactive currencies never pay out; their commands stay bound.
    pub active: bool,
    /// Extra payout per bonus group, additive across groups.
    #[serde(default)]
    pub bonus: HashMap<String, i64>,
    #[serde(default)]
    pub transfer: TransferPolicy,
}

impl Currency {
    pub fn transfers_allowed(&self) -> bool {
        self.transfer == TransferPolicy::Allow
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Lifecycle action pushed by the configuration surface when a currency is
/// saved or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyAction {
    Create,
    Update,
    Delete,
}

/// Raised when a signal carries an action string outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid currency action: {0:?}")]
pub struct InvalidAction(pub String);

impl FromStr for CurrencyAction {
    type Err = InvalidAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(CurrencyAction::Create),
            "update" => Ok(CurrencyAction::Update),
            "delete" => Ok(CurrencyAction::Delete),
            other => Err(InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for CurrencyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CurrencyAction::Create => "create",
            CurrencyAction::Update => "update",
            CurrencyAction::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_currency() -> Currency {
        Currency {
            id: "coins".to_string(),
            name: "Coins".to_string(),
            interval: 5,
            payout: 10,
            active: true,
            bonus: HashMap::new(),
            transfer: TransferPolicy::Allow,
        }
    }

    #[test]
    fn test_transfer_policy_default_is_allow() {
        assert_eq!(TransferPolicy::default(), TransferPolicy::Allow);
        assert!(sample_currency().transfers_allowed());
    }

    #[test]
    fn test_transfer_policy_disallow() {
        let mut currency = sample_currency();
        currency.transfer = TransferPolicy::Disallow;
        assert!(!currency.transfers_allowed());
    }

    #[test]
    fn test_action_parses_lowercase_strings() {
        assert_eq!("create".parse(), Ok(CurrencyAction::Create));
        assert_eq!("update".parse(), Ok(CurrencyAction::Update));
        assert_eq!("delete".parse(), Ok(CurrencyAction::Delete));
    }

    #[test]
    fn test_action_rejects_unknown_strings() {
        let err = "rename".parse::<CurrencyAction>().unwrap_err();
        assert_eq!(err, InvalidAction("rename".to_string()));
        assert!("Create".parse::<CurrencyAction>().is_err());
    }

    #[test]
    fn test_currency_deserializes_with_defaults() {
        let currency: Currency = toml::from_str(
            r#"
            id = "embers"
            name = "Embers"
            interval = 15
            payout = 5
            active = true
            "#,
        )
        .unwrap();

        assert!(currency.bonus.is_empty());
        assert_eq!(currency.transfer, TransferPolicy::Allow);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(sample_currency().to_string(), "Coins (coins)");
        assert_eq!(CurrencyAction::Update.to_string(), "update");
    }
}
