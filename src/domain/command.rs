//! Currency Command Specifications
//!
//! Builds the immutable command specification bound to a currency: the
//! chat trigger, the five balance subcommands, and their permission
//! requirements. Specs are keyed by a deterministic command id so the
//! binder can always unregister the old binding before registering a
//! replacement.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::currency::Currency;

/// Prefix for every command id the engine registers.
pub const COMMAND_NAMESPACE: &str = "coinkeep:currency:";

/// Groups whose members may run the elevated subcommands.
pub const ELEVATED_GROUPS: [&str; 3] = ["Moderators", "Channel Editors", "Streamer"];

/// The closed set of balance subcommands every currency command carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubCommand {
    Add,
    Remove,
    Give,
    GiveAll,
    RemoveAll,
}

impl SubCommand {
    pub const ALL: [SubCommand; 5] = [
        SubCommand::Add,
        SubCommand::Remove,
        SubCommand::Give,
        SubCommand::GiveAll,
        SubCommand::RemoveAll,
    ];

    /// The argument text that triggers this subcommand.
    pub fn arg(&self) -> &'static str {
        match self {
            SubCommand::Add => "add",
            SubCommand::Remove => "remove",
            SubCommand::Give => "give",
            SubCommand::GiveAll => "giveall",
            SubCommand::RemoveAll => "removeall",
        }
    }

    pub fn usage(&self) -> &'static str {
        match self {
            SubCommand::Add => "add [@user] [amount]",
            SubCommand::Remove => "remove [@user] [amount]",
            SubCommand::Give => "give [@user] [amount]",
            SubCommand::GiveAll => "giveall [amount]",
            SubCommand::RemoveAll => "removeall [amount]",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SubCommand::Add => "Adds currency for a given user.",
            SubCommand::Remove => "Removes currency for a given user.",
            SubCommand::Give => "Gives currency from one user to another user.",
            SubCommand::GiveAll => "Gives currency to all online users.",
            SubCommand::RemoveAll => "Removes currency from all online users.",
        }
    }

    /// `give` is open to everyone; the rest mutate other users' balances
    /// and require elevated group membership.
    pub fn requires_elevation(&self) -> bool {
        !matches!(self, SubCommand::Give)
    }
}

impl FromStr for SubCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(SubCommand::Add),
            "remove" => Ok(SubCommand::Remove),
            "give" => Ok(SubCommand::Give),
            "giveall" => Ok(SubCommand::GiveAll),
            "removeall" => Ok(SubCommand::RemoveAll),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SubCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.arg())
    }
}

/// One subcommand entry in a built spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubCommandSpec {
    pub arg: SubCommand,
    pub usage: String,
    pub description: String,
    /// Empty means no permission requirement.
    pub permission_groups: Vec<String>,
}

/// Immutable command specification for one currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandSpec {
    /// Deterministic id: [`COMMAND_NAMESPACE`] plus the currency id.
    pub id: String,
    pub name: String,
    pub trigger: String,
    pub description: String,
    pub currency_id: String,
    pub currency_name: String,
    pub active: bool,
    pub user_cooldown: u64,
    pub global_cooldown: u64,
    pub sub_commands: Vec<SubCommandSpec>,
}

/// Derives the registry id for a currency's command.
pub fn command_id(currency_id: &str) -> String {
    format!("{}{}", COMMAND_NAMESPACE, currency_id)
}

/// Lowercases the display name and collapses whitespace runs to single
/// dashes, so "My Coin" binds the trigger `!my-coin`.
pub fn clean_trigger(name: &str) -> String {
    let cleaned: Vec<&str> = name.split_whitespace().collect();
    format!("!{}", cleaned.join("-").to_lowercase())
}

/// Strips a leading `@` mention marker from a username argument.
pub fn strip_mention(user: &str) -> &str {
    user.strip_prefix('@').unwrap_or(user)
}

/// Builds the command specification for a currency.
pub fn build_spec(currency: &Currency) -> CommandSpec {
    let sub_commands = SubCommand::ALL
        .iter()
        .map(|sub| SubCommandSpec {
            arg: *sub,
            usage: sub.usage().to_string(),
            description: sub.description().to_string(),
            permission_groups: if sub.requires_elevation() {
                ELEVATED_GROUPS.iter().map(|g| g.to_string()).collect()
            } else {
                Vec::new()
            },
        })
        .collect();

    CommandSpec {
        id: command_id(&currency.id),
        name: format!("{} Currency Command", currency.name),
        trigger: clean_trigger(&currency.name),
        description: format!("Allows management of the \"{}\" currency", currency.name),
        currency_id: currency.id.clone(),
        currency_name: currency.name.clone(),
        active: true,
        user_cooldown: 0,
        global_cooldown: 0,
        sub_commands,
    }
}
