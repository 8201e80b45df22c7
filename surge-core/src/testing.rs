//! In-memory host for tests and headless play.
//!
//! This module provides:
//! - `MemoryHost`, a host that keeps a [`Campaign`] in memory and records
//!   every outbound chat line
//! - `ScriptedDice` for deterministic rolls
//! - `sample_fighter` and the `CharacterRecord` builder for fixtures

use crate::dice::DiceSource;
use crate::host::{HostError, MacroProvisioner, MacroSpec, Messenger, Permissions, Token, TokenResolver};
use crate::sheet::{self, AttributeKind, AttributeStore, CharacterId};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use uuid::Uuid;

/// One attribute on a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub current: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

/// A character journal with its attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl CharacterRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(id),
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Set the current value, keeping any stored maximum.
    pub fn attr(mut self, name: &str, current: &str) -> Self {
        self.attributes.entry(name.to_string()).or_default().current = current.to_string();
        self
    }

    /// Set both halves of an attribute.
    pub fn attr_max(mut self, name: &str, current: &str, max: &str) -> Self {
        self.attributes.insert(
            name.to_string(),
            AttributeValue {
                current: current.to_string(),
                max: Some(max.to_string()),
            },
        );
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.attributes.remove(name);
        self
    }
}

/// A hurt level 5 fighter: 12/28 hp, 3 of 5 d10 hit dice, constitution 14.
pub fn sample_fighter(id: &str, name: &str) -> CharacterRecord {
    CharacterRecord::new(id, name)
        .attr_max(sheet::HP, "12", "28")
        .attr_max(sheet::HIT_DICE, "3", "5")
        .attr(sheet::HIT_DIE_SIZE, "10")
        .attr(sheet::LEVEL, "5")
        .attr(sheet::CONSTITUTION, "14")
        .attr(sheet::HEALING_SURGE, "ready")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub gm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroRecord {
    pub id: String,
    pub owner: String,
    #[serde(flatten)]
    pub spec: MacroSpec,
}

/// Everything the in-memory host knows about a game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(default)]
    pub characters: Vec<CharacterRecord>,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    #[serde(default)]
    pub macros: Vec<MacroRecord>,
}

impl Campaign {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn character(&self, id: &CharacterId) -> Option<&CharacterRecord> {
        self.characters.iter().find(|c| &c.id == id)
    }

    pub fn player(&self, id: &str) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.id == id)
    }
}

/// A chat line produced by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Chat { speaker: String, content: String },
    Emote { speaker: String, text: String },
}

impl Outbound {
    pub fn content(&self) -> &str {
        match self {
            Outbound::Chat { content, .. } => content,
            Outbound::Emote { text, .. } => text,
        }
    }
}

impl fmt::Display for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outbound::Chat { speaker, content } => write!(f, "{speaker}: {content}"),
            Outbound::Emote { speaker, text } => write!(f, "{speaker} {text}"),
        }
    }
}

/// Host backed by an in-memory [`Campaign`].
pub struct MemoryHost<D> {
    campaign: RefCell<Campaign>,
    dice: D,
    outbox: RefCell<Vec<Outbound>>,
    fail_writes: Cell<bool>,
}

impl<D: DiceSource> MemoryHost<D> {
    pub fn new(dice: D) -> Self {
        Self::from_campaign(Campaign::default(), dice)
    }

    pub fn from_campaign(campaign: Campaign, dice: D) -> Self {
        Self {
            campaign: RefCell::new(campaign),
            dice,
            outbox: RefCell::new(Vec::new()),
            fail_writes: Cell::new(false),
        }
    }

    pub fn with_character(self, record: CharacterRecord) -> Self {
        self.campaign.borrow_mut().characters.push(record);
        self
    }

    pub fn with_token(self, token_id: &str, character_id: &str) -> Self {
        self.campaign.borrow_mut().tokens.push(Token {
            id: token_id.to_string(),
            represents: Some(CharacterId::new(character_id)),
            is_drawing: false,
        });
        self
    }

    pub fn with_raw_token(self, token: Token) -> Self {
        self.campaign.borrow_mut().tokens.push(token);
        self
    }

    pub fn with_player(self, id: &str, name: &str, gm: bool) -> Self {
        self.campaign.borrow_mut().players.push(PlayerRecord {
            id: id.to_string(),
            name: name.to_string(),
            gm,
        });
        self
    }

    pub fn dice(&self) -> &D {
        &self.dice
    }

    /// Make every attribute write fail, to exercise host error handling.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn campaign(&self) -> Campaign {
        self.campaign.borrow().clone()
    }

    pub fn attribute(&self, id: &CharacterId, name: &str, kind: AttributeKind) -> Option<String> {
        let campaign = self.campaign.borrow();
        let value = campaign.character(id)?.attributes.get(name)?;
        match kind {
            AttributeKind::Current => Some(value.current.clone()),
            AttributeKind::Max => value.max.clone(),
        }
    }

    pub fn attribute_int(&self, id: &CharacterId, name: &str, kind: AttributeKind) -> Option<i32> {
        self.attribute(id, name, kind)?.trim().parse().ok()
    }

    pub fn outbox(&self) -> Vec<Outbound> {
        self.outbox.borrow().clone()
    }

    pub fn take_outbox(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.outbox.borrow_mut())
    }

    fn character_name(&self, id: &CharacterId) -> String {
        self.campaign
            .borrow()
            .character(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

impl<D: DiceSource> AttributeStore for MemoryHost<D> {
    fn read_attribute(
        &self,
        character: &CharacterId,
        name: &str,
        kind: AttributeKind,
    ) -> Result<Option<String>, HostError> {
        Ok(self.attribute(character, name, kind))
    }

    fn write_attribute(
        &self,
        character: &CharacterId,
        name: &str,
        current: &str,
        max: Option<&str>,
    ) -> Result<(), HostError> {
        if self.fail_writes.get() {
            return Err(HostError::Store(format!("write to {name} rejected")));
        }
        let mut campaign = self.campaign.borrow_mut();
        let record = campaign
            .characters
            .iter_mut()
            .find(|c| &c.id == character)
            .ok_or_else(|| HostError::Store(format!("no character {character}")))?;
        let value = record.attributes.entry(name.to_string()).or_default();
        value.current = current.to_string();
        if let Some(max) = max {
            value.max = Some(max.to_string());
        }
        Ok(())
    }
}

impl<D: DiceSource> DiceSource for MemoryHost<D> {
    fn roll_die(&self, sides: u32) -> Result<u32, HostError> {
        self.dice.roll_die(sides)
    }

    fn pick_index(&self, len: usize) -> Result<usize, HostError> {
        self.dice.pick_index(len)
    }
}

impl<D: DiceSource> Messenger for MemoryHost<D> {
    fn send_chat(&self, speaker: &str, content: &str) -> Result<(), HostError> {
        self.outbox.borrow_mut().push(Outbound::Chat {
            speaker: speaker.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    fn emote_as(&self, character: &CharacterId, text: &str) -> Result<(), HostError> {
        let speaker = self.character_name(character);
        self.outbox.borrow_mut().push(Outbound::Emote {
            speaker,
            text: text.to_string(),
        });
        Ok(())
    }
}

impl<D: DiceSource> TokenResolver for MemoryHost<D> {
    fn token(&self, token_id: &str) -> Result<Option<Token>, HostError> {
        Ok(self
            .campaign
            .borrow()
            .tokens
            .iter()
            .find(|t| t.id == token_id)
            .cloned())
    }

    fn journal_name(&self, character: &CharacterId) -> Result<Option<String>, HostError> {
        Ok(self.campaign.borrow().character(character).map(|c| c.name.clone()))
    }
}

impl<D: DiceSource> MacroProvisioner for MemoryHost<D> {
    fn create_macro_if_absent(&self, spec: &MacroSpec, owner: &str) -> Result<bool, HostError> {
        let mut campaign = self.campaign.borrow_mut();
        if campaign.macros.iter().any(|m| m.spec.name == spec.name) {
            return Ok(false);
        }
        campaign.macros.push(MacroRecord {
            id: Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            spec: spec.clone(),
        });
        Ok(true)
    }
}

impl<D: DiceSource> Permissions for MemoryHost<D> {
    fn is_gm(&self, player_id: &str) -> Result<bool, HostError> {
        Ok(self
            .campaign
            .borrow()
            .player(player_id)
            .map(|p| p.gm)
            .unwrap_or(false))
    }
}

/// Dice that return queued rolls and picks, then fail.
#[derive(Debug, Default)]
pub struct ScriptedDice {
    rolls: RefCell<VecDeque<u32>>,
    picks: RefCell<VecDeque<usize>>,
    rolls_made: Cell<usize>,
}

impl ScriptedDice {
    pub fn with_rolls(rolls: &[u32]) -> Self {
        Self {
            rolls: RefCell::new(rolls.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn queue_pick(&self, index: usize) {
        self.picks.borrow_mut().push_back(index);
    }

    /// Number of dice rolled so far.
    pub fn rolls_made(&self) -> usize {
        self.rolls_made.get()
    }
}

impl DiceSource for ScriptedDice {
    fn roll_die(&self, sides: u32) -> Result<u32, HostError> {
        let roll = self
            .rolls
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| HostError::Unavailable("no scripted roll left".to_string()))?;
        if roll == 0 || roll > sides {
            return Err(HostError::Unavailable(format!(
                "scripted roll {roll} does not fit a d{sides}"
            )));
        }
        self.rolls_made.set(self.rolls_made.get() + 1);
        Ok(roll)
    }

    /// Unscripted picks take the first entry.
    fn pick_index(&self, len: usize) -> Result<usize, HostError> {
        let index = self.picks.borrow_mut().pop_front().unwrap_or(0);
        Ok(index.min(len.saturating_sub(1)))
    }
}
