//! Collaborator contracts for the virtual tabletop host.
//!
//! The host owns attribute storage, chat, token lookup, macros and player
//! permissions. Everything here is a thin contract; the rules live in
//! [`crate::resource`] and [`crate::router`].

use crate::dice::{DiceError, DiceSource};
use crate::sheet::{AttributeStore, CharacterId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by host collaborators.
///
/// These are never shown to players; the router logs them.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Attribute store error: {0}")]
    Store(String),

    #[error("Messaging error: {0}")]
    Messaging(String),

    #[error("Dice error: {0}")]
    Dice(#[from] DiceError),

    #[error("Host unavailable: {0}")]
    Unavailable(String),
}

/// Who a chat message is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Whisper to a single player by display name.
    Player(String),
    /// Whisper to the GM.
    Gm,
    /// Post to the whole table.
    Everyone,
}

impl Recipient {
    /// Prefix `content` with the whisper command for this recipient.
    pub fn address(&self, content: &str) -> String {
        match self {
            Recipient::Player(name) => format!("/w \"{name}\" {content}"),
            Recipient::Gm => format!("/w gm {content}"),
            Recipient::Everyone => content.to_string(),
        }
    }
}

/// Chat output.
pub trait Messenger {
    /// Post a raw chat line as `speaker`.
    fn send_chat(&self, speaker: &str, content: &str) -> Result<(), HostError>;

    /// Emote as the given character ("Thorin catches his breath.").
    fn emote_as(&self, character: &CharacterId, text: &str) -> Result<(), HostError>;
}

/// Feedback channel for one command: a speaker name and the player to answer.
#[derive(Debug, Clone)]
pub struct Feedback<'a> {
    pub speaker: &'a str,
    pub recipient: Recipient,
}

impl<'a> Feedback<'a> {
    pub fn new(speaker: &'a str, recipient: Recipient) -> Self {
        Self { speaker, recipient }
    }

    pub fn notify<M: Messenger + ?Sized>(&self, messenger: &M, text: &str) -> Result<(), HostError> {
        messenger.send_chat(self.speaker, &self.recipient.address(text))
    }

    pub fn error<M: Messenger + ?Sized>(&self, messenger: &M, text: &str) -> Result<(), HostError> {
        let styled = format!("<span style=\"color: red; font-weight: bold;\">{text}</span>");
        self.notify(messenger, &styled)
    }
}

/// A token as seen on the tabletop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    /// Character journal this token represents, if any.
    pub represents: Option<CharacterId>,
    /// Freehand drawings can be selected but never represent a character.
    #[serde(default)]
    pub is_drawing: bool,
}

/// Token and journal lookup.
pub trait TokenResolver {
    fn token(&self, token_id: &str) -> Result<Option<Token>, HostError>;

    /// Journal name of a character, if the journal exists.
    fn journal_name(&self, character: &CharacterId) -> Result<Option<String>, HostError>;
}

/// A convenience macro offered to players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSpec {
    pub name: String,
    pub action: String,
    /// Show as a token action button when a token is selected.
    pub token_action: bool,
}

/// Macro provisioning.
pub trait MacroProvisioner {
    /// Create the macro unless one with the same name exists. Returns
    /// whether a macro was created.
    fn create_macro_if_absent(&self, spec: &MacroSpec, owner: &str) -> Result<bool, HostError>;
}

/// Player privilege lookup.
pub trait Permissions {
    fn is_gm(&self, player_id: &str) -> Result<bool, HostError>;
}

/// Everything the router needs from the host.
pub trait Host:
    AttributeStore + DiceSource + Messenger + TokenResolver + MacroProvisioner + Permissions
{
}

impl<T: ?Sized> Host for T where
    T: AttributeStore + DiceSource + Messenger + TokenResolver + MacroProvisioner + Permissions
{
}
