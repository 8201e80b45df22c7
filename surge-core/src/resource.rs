//! Healing surge and hit dice resource for one character.
//!
//! A [`CharacterResource`] is loaded fresh from the attribute store for every
//! command and dropped when the command finishes. Each mutating step writes
//! the changed field back immediately; nothing is batched.
//!
//! Loading and writing are not atomic across a command. Two commands for the
//! same character delivered close together can both read the same hit dice
//! count and both spend from it. [`crate::locks::CharacterLocks`] serializes
//! commands per character when the router is configured to use it.

use crate::dice::{pick_random, DiceSource};
use crate::flavor::{EXHAUST_LINES, INVIGORATED};
use crate::host::{Feedback, HostError, Messenger};
use crate::sheet::{self, AttributeKind, AttributeStore, CharacterId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors surfaced by resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Attribute {0} is missing or empty")]
    AttributeMissing(String),

    #[error("Attribute {name} has an invalid value: {value:?}")]
    AttributeInvalid { name: String, value: String },

    #[error("Your healing surge is exhausted until you finish a short rest")]
    HealingSurgeUnusable,

    #[error("You are already at full health")]
    FullHealth,

    #[error("You have no hit dice remaining")]
    NoHitDiceRemaining,

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

impl ResourceError {
    /// Short name of the failure, shown ahead of the message.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ResourceError::AttributeMissing(_) => "AttributeMissing",
            ResourceError::AttributeInvalid { .. } => "AttributeInvalid",
            ResourceError::HealingSurgeUnusable => "HealingSurgeUnusable",
            ResourceError::FullHealth => "FullHealth",
            ResourceError::NoHitDiceRemaining => "NoHitDiceRemaining",
            ResourceError::Host(_) => "HostError",
        }
    }

    /// Whether players should see this error. Host failures are logged instead.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, ResourceError::Host(_))
    }
}

/// Whether the healing surge can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HealingSurgeState {
    #[default]
    Ready,
    NotReady,
}

impl HealingSurgeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealingSurgeState::Ready => "ready",
            HealingSurgeState::NotReady => "not_ready",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "ready" => Some(HealingSurgeState::Ready),
            "not_ready" => Some(HealingSurgeState::NotReady),
            _ => None,
        }
    }
}

impl fmt::Display for HealingSurgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of spending one hit die.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealOutcome {
    pub roll: u32,
    pub modifier: i32,
    /// `roll + modifier`, not floored at zero.
    pub amount: i32,
    pub hp_before: i32,
    pub hp_after: i32,
    pub hit_dice_remaining: i32,
}

/// Result of a short or long rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestOutcome {
    pub hit_dice_recovered: i32,
    pub surge_renewed: bool,
}

/// Hit dice recovered by a short rest: a quarter of the level, at least one.
pub fn short_rest_recovery(level: i32) -> i32 {
    level.div_euclid(4).max(1)
}

/// In-memory projection of one character's healing attributes.
pub struct CharacterResource<'h, H: ?Sized> {
    host: &'h H,
    id: CharacterId,
    hp: i32,
    max_hp: i32,
    hit_dice: i32,
    max_hit_dice: i32,
    hit_die_size: u32,
    con_mod: i32,
    level: i32,
    surge: HealingSurgeState,
}

impl<'h, H> CharacterResource<'h, H>
where
    H: AttributeStore + DiceSource + Messenger + ?Sized,
{
    /// Load the character's attributes from the store.
    ///
    /// A missing healing surge attribute is first use: it is written as
    /// ready and loaded as ready.
    pub fn load(host: &'h H, id: CharacterId) -> Result<Self, ResourceError> {
        let hp = sheet::read_required_int(host, &id, sheet::HP, AttributeKind::Current)?;
        let max_hp = sheet::read_required_int(host, &id, sheet::HP, AttributeKind::Max)?;
        let hit_dice = sheet::read_required_int(host, &id, sheet::HIT_DICE, AttributeKind::Current)?;
        let max_hit_dice = sheet::read_required_int(host, &id, sheet::HIT_DICE, AttributeKind::Max)?;
        let die_size = sheet::read_required_int(host, &id, sheet::HIT_DIE_SIZE, AttributeKind::Current)?;
        let level = sheet::read_required_int(host, &id, sheet::LEVEL, AttributeKind::Current)?;
        let constitution =
            sheet::read_required_int(host, &id, sheet::CONSTITUTION, AttributeKind::Current)?;

        let hit_die_size = u32::try_from(die_size)
            .ok()
            .filter(|sides| *sides >= 1)
            .ok_or_else(|| ResourceError::AttributeInvalid {
                name: sheet::HIT_DIE_SIZE.to_string(),
                value: die_size.to_string(),
            })?;

        let surge = match host.read_attribute(&id, sheet::HEALING_SURGE, AttributeKind::Current)? {
            Some(value) if !value.trim().is_empty() => HealingSurgeState::parse(&value).ok_or(
                ResourceError::AttributeInvalid {
                    name: sheet::HEALING_SURGE.to_string(),
                    value,
                },
            )?,
            _ => {
                debug!("{id}: no healing surge attribute, creating it as ready");
                let state = HealingSurgeState::Ready;
                host.write_attribute(&id, sheet::HEALING_SURGE, state.as_str(), None)?;
                state
            }
        };

        Ok(Self {
            host,
            id,
            hp,
            max_hp,
            hit_dice,
            max_hit_dice,
            hit_die_size,
            con_mod: sheet::ability_modifier(constitution),
            level,
            surge,
        })
    }

    pub fn id(&self) -> &CharacterId {
        &self.id
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn hit_dice(&self) -> i32 {
        self.hit_dice
    }

    pub fn max_hit_dice(&self) -> i32 {
        self.max_hit_dice
    }

    pub fn hit_die_size(&self) -> u32 {
        self.hit_die_size
    }

    pub fn con_mod(&self) -> i32 {
        self.con_mod
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn healing_surge_state(&self) -> HealingSurgeState {
        self.surge
    }

    pub fn is_healing_surge_ready(&self) -> bool {
        self.surge == HealingSurgeState::Ready
    }

    pub fn is_hit_dice_ready(&self) -> bool {
        self.hit_dice > 0
    }

    pub fn is_hurt(&self) -> bool {
        self.hp < self.max_hp
    }

    /// Spend one hit die and heal by `d(hit_die_size) + con_mod`.
    ///
    /// Checks run in order (surge, hurt, dice) and nothing is written before
    /// all three pass. The amount is not floored, so a large negative
    /// modifier can lower hit points.
    pub fn spend_hit_die_to_heal(
        &mut self,
        feedback: &Feedback<'_>,
    ) -> Result<HealOutcome, ResourceError> {
        if !self.is_healing_surge_ready() {
            return Err(ResourceError::HealingSurgeUnusable);
        }
        if !self.is_hurt() {
            return Err(ResourceError::FullHealth);
        }
        if !self.is_hit_dice_ready() {
            return Err(ResourceError::NoHitDiceRemaining);
        }

        self.set_hit_dice(self.hit_dice - 1)?;

        let roll = self.host.roll_die(self.hit_die_size)?;
        let amount = (roll as i32).saturating_add(self.con_mod);
        let hp_before = self.hp;
        let hp_after = self.update_hp(amount)?;

        feedback.notify(
            self.host,
            &format!("Healed up to [[{roll} + {}]] hp", self.con_mod),
        )?;

        Ok(HealOutcome {
            roll,
            modifier: self.con_mod,
            amount,
            hp_before,
            hp_after,
            hit_dice_remaining: self.hit_dice,
        })
    }

    /// Apply a heal amount, capped at maximum hit points only.
    pub fn update_hp(&mut self, heal_amount: i32) -> Result<i32, ResourceError> {
        self.hp = heal_amount.saturating_add(self.hp).min(self.max_hp);
        self.host
            .write_attribute(&self.id, sheet::HP, &self.hp.to_string(), None)?;
        debug!("{}: hp now {}/{}", self.id, self.hp, self.max_hp);
        Ok(self.hp)
    }

    /// Spend the healing surge until the next short rest.
    pub fn exhaust(&mut self) -> Result<(), ResourceError> {
        self.set_surge(HealingSurgeState::NotReady)?;
        let line = pick_random(self.host, EXHAUST_LINES)?;
        self.host.emote_as(&self.id, line)?;
        Ok(())
    }

    /// Make the healing surge usable again.
    pub fn renew_surge(&mut self) -> Result<(), ResourceError> {
        self.set_surge(HealingSurgeState::Ready)
    }

    /// Short rest: recover a quarter of the level in hit dice (at least one)
    /// and renew the surge.
    ///
    /// With the hit dice pool already full, the rest changes nothing and the
    /// surge is left as it was.
    pub fn do_short_rest(&mut self) -> Result<RestOutcome, ResourceError> {
        self.host.emote_as(&self.id, INVIGORATED)?;

        if self.hit_dice == self.max_hit_dice {
            return Ok(RestOutcome {
                hit_dice_recovered: 0,
                surge_renewed: false,
            });
        }

        let before = self.hit_dice;
        let recovered = self
            .hit_dice
            .saturating_add(short_rest_recovery(self.level))
            .min(self.max_hit_dice);
        self.set_hit_dice(recovered)?;
        self.renew_surge()?;

        Ok(RestOutcome {
            hit_dice_recovered: self.hit_dice.saturating_sub(before),
            surge_renewed: true,
        })
    }

    /// Long rest: refill the hit dice pool and renew the surge.
    pub fn do_long_rest(&mut self) -> Result<RestOutcome, ResourceError> {
        let before = self.hit_dice;
        if self.hit_dice != self.max_hit_dice {
            self.set_hit_dice(self.max_hit_dice)?;
        }
        self.renew_surge()?;
        self.host.emote_as(&self.id, INVIGORATED)?;

        Ok(RestOutcome {
            hit_dice_recovered: self.hit_dice.saturating_sub(before),
            surge_renewed: true,
        })
    }

    fn set_hit_dice(&mut self, hit_dice: i32) -> Result<(), ResourceError> {
        self.hit_dice = hit_dice;
        self.host
            .write_attribute(&self.id, sheet::HIT_DICE, &hit_dice.to_string(), None)?;
        debug!("{}: hit dice now {}/{}", self.id, self.hit_dice, self.max_hit_dice);
        Ok(())
    }

    fn set_surge(&mut self, state: HealingSurgeState) -> Result<(), ResourceError> {
        self.surge = state;
        self.host
            .write_attribute(&self.id, sheet::HEALING_SURGE, state.as_str(), None)?;
        debug!("{}: healing surge {state}", self.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Recipient;
    use crate::testing::{sample_fighter, CharacterRecord, MemoryHost, ScriptedDice};

    const ID: &str = "char-1";

    fn host_with(record: CharacterRecord, rolls: &[u32]) -> MemoryHost<ScriptedDice> {
        MemoryHost::new(ScriptedDice::with_rolls(rolls)).with_character(record)
    }

    fn feedback() -> Feedback<'static> {
        Feedback::new("Intelligent Healing Surge", Recipient::Player("Sam".to_string()))
    }

    fn int(host: &MemoryHost<ScriptedDice>, name: &str) -> i32 {
        host.attribute_int(&CharacterId::from(ID), name, AttributeKind::Current)
            .unwrap()
    }

    #[test]
    fn test_short_rest_recovery_floor() {
        assert_eq!(short_rest_recovery(1), 1);
        assert_eq!(short_rest_recovery(2), 1);
        assert_eq!(short_rest_recovery(3), 1);
        assert_eq!(short_rest_recovery(4), 1);
        assert_eq!(short_rest_recovery(8), 2);
        assert_eq!(short_rest_recovery(11), 2);
        assert_eq!(short_rest_recovery(20), 5);
    }

    #[test]
    fn test_load_derives_con_mod() {
        let host = host_with(sample_fighter(ID, "Thorin").attr(sheet::CONSTITUTION, "9"), &[]);
        let resource = CharacterResource::load(&host, ID.into()).unwrap();
        assert_eq!(resource.con_mod(), -1);
        assert_eq!(resource.hit_die_size(), 10);
    }

    #[test]
    fn test_load_reports_missing_attribute() {
        let host = host_with(sample_fighter(ID, "Thorin").without(sheet::LEVEL), &[]);
        let err = CharacterResource::load(&host, ID.into()).err().unwrap();
        assert!(matches!(err, ResourceError::AttributeMissing(ref name) if name == "level"));
    }

    #[test]
    fn test_load_treats_empty_max_as_missing() {
        let host = host_with(sample_fighter(ID, "Thorin").attr_max(sheet::HIT_DICE, "3", ""), &[]);
        let err = CharacterResource::load(&host, ID.into()).err().unwrap();
        assert!(matches!(err, ResourceError::AttributeMissing(ref name) if name == "hit_dice|max"));
    }

    #[test]
    fn test_load_rejects_non_numeric_values() {
        let host = host_with(sample_fighter(ID, "Thorin").attr(sheet::HIT_DIE_SIZE, "d8"), &[]);
        let err = CharacterResource::load(&host, ID.into()).err().unwrap();
        assert!(matches!(err, ResourceError::AttributeInvalid { .. }));

        let host = host_with(sample_fighter(ID, "Thorin").attr(sheet::HIT_DIE_SIZE, "0"), &[]);
        let err = CharacterResource::load(&host, ID.into()).err().unwrap();
        assert!(matches!(err, ResourceError::AttributeInvalid { .. }));
    }

    #[test]
    fn test_first_load_creates_ready_surge() {
        let host = host_with(sample_fighter(ID, "Thorin").without(sheet::HEALING_SURGE), &[]);
        let resource = CharacterResource::load(&host, ID.into()).unwrap();
        assert!(resource.is_healing_surge_ready());
        assert_eq!(
            host.attribute(&ID.into(), sheet::HEALING_SURGE, AttributeKind::Current),
            Some("ready".to_string())
        );
    }

    #[test]
    fn test_predicates() {
        let host = host_with(
            sample_fighter(ID, "Thorin")
                .attr_max(sheet::HP, "20", "20")
                .attr_max(sheet::HIT_DICE, "0", "5")
                .attr(sheet::HEALING_SURGE, "not_ready"),
            &[],
        );
        let resource = CharacterResource::load(&host, ID.into()).unwrap();
        assert!(!resource.is_hurt());
        assert!(!resource.is_hit_dice_ready());
        assert!(!resource.is_healing_surge_ready());
    }

    #[test]
    fn test_heal_with_negative_modifier() {
        // hp 10/20, d8, con 8 (-1), 3 dice, roll 5 -> heals 4
        let record = sample_fighter(ID, "Thorin")
            .attr_max(sheet::HP, "10", "20")
            .attr(sheet::HIT_DIE_SIZE, "8")
            .attr(sheet::CONSTITUTION, "8")
            .attr_max(sheet::HIT_DICE, "3", "5");
        let host = host_with(record, &[5]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        let outcome = resource.spend_hit_die_to_heal(&feedback()).unwrap();
        assert_eq!(outcome.amount, 4);
        assert_eq!(outcome.hp_after, 14);
        assert_eq!(outcome.hit_dice_remaining, 2);
        assert_eq!(int(&host, sheet::HP), 14);
        assert_eq!(int(&host, sheet::HIT_DICE), 2);
        assert_eq!(host.dice().rolls_made(), 1);

        let outbox = host.take_outbox();
        assert_eq!(outbox.len(), 1);
        assert!(outbox[0].to_string().contains("Healed up to [[5 + -1]] hp"));
        assert!(outbox[0].to_string().contains("/w \"Sam\""));
    }

    #[test]
    fn test_heal_caps_at_max_hp() {
        let record = sample_fighter(ID, "Thorin").attr_max(sheet::HP, "18", "20");
        let host = host_with(record, &[10]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        let outcome = resource.spend_hit_die_to_heal(&feedback()).unwrap();
        assert_eq!(outcome.hp_after, 20);
        assert_eq!(int(&host, sheet::HP), 20);
    }

    #[test]
    fn test_negative_heal_lowers_hp_without_floor() {
        // con 1 gives -5; a roll of 1 heals -4
        let record = sample_fighter(ID, "Thorin")
            .attr_max(sheet::HP, "2", "20")
            .attr(sheet::CONSTITUTION, "1");
        let host = host_with(record, &[1]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        let outcome = resource.spend_hit_die_to_heal(&feedback()).unwrap();
        assert_eq!(outcome.amount, -4);
        assert_eq!(outcome.hp_after, -2);
        assert_eq!(int(&host, sheet::HP), -2);
    }

    #[test]
    fn test_heal_gate_order() {
        // Exhausted, full and out of dice: the surge check wins.
        let record = sample_fighter(ID, "Thorin")
            .attr_max(sheet::HP, "20", "20")
            .attr_max(sheet::HIT_DICE, "0", "5")
            .attr(sheet::HEALING_SURGE, "not_ready");
        let host = host_with(record, &[4]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();
        assert!(matches!(
            resource.spend_hit_die_to_heal(&feedback()),
            Err(ResourceError::HealingSurgeUnusable)
        ));

        // Full and out of dice: full health wins.
        let record = sample_fighter(ID, "Thorin")
            .attr_max(sheet::HP, "20", "20")
            .attr_max(sheet::HIT_DICE, "0", "5");
        let host = host_with(record, &[4]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();
        assert!(matches!(
            resource.spend_hit_die_to_heal(&feedback()),
            Err(ResourceError::FullHealth)
        ));

        let record = sample_fighter(ID, "Thorin").attr_max(sheet::HIT_DICE, "0", "5");
        let host = host_with(record, &[4]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();
        assert!(matches!(
            resource.spend_hit_die_to_heal(&feedback()),
            Err(ResourceError::NoHitDiceRemaining)
        ));
        assert_eq!(int(&host, sheet::HIT_DICE), 0);
        assert_eq!(host.dice().rolls_made(), 0);
        assert!(host.take_outbox().is_empty());
    }

    #[test]
    fn test_exhaust_is_idempotent() {
        let host = host_with(sample_fighter(ID, "Thorin"), &[]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        resource.exhaust().unwrap();
        resource.exhaust().unwrap();
        assert_eq!(resource.healing_surge_state(), HealingSurgeState::NotReady);
        assert_eq!(
            host.attribute(&ID.into(), sheet::HEALING_SURGE, AttributeKind::Current),
            Some("not_ready".to_string())
        );

        let outbox = host.take_outbox();
        assert_eq!(outbox.len(), 2);
        assert!(outbox
            .iter()
            .all(|m| EXHAUST_LINES.iter().any(|line| m.to_string().ends_with(line))));
    }

    #[test]
    fn test_short_rest_example() {
        let record = sample_fighter(ID, "Thorin")
            .attr(sheet::LEVEL, "8")
            .attr_max(sheet::HIT_DICE, "2", "5")
            .attr(sheet::HEALING_SURGE, "not_ready");
        let host = host_with(record, &[]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        let outcome = resource.do_short_rest().unwrap();
        assert_eq!(outcome.hit_dice_recovered, 2);
        assert!(outcome.surge_renewed);
        assert_eq!(int(&host, sheet::HIT_DICE), 4);
        assert!(resource.is_healing_surge_ready());
    }

    #[test]
    fn test_short_rest_low_level_recovers_one() {
        for level in ["1", "2", "3"] {
            let record = sample_fighter(ID, "Thorin")
                .attr(sheet::LEVEL, level)
                .attr_max(sheet::HIT_DICE, "0", "3");
            let host = host_with(record, &[]);
            let mut resource = CharacterResource::load(&host, ID.into()).unwrap();
            resource.do_short_rest().unwrap();
            assert_eq!(int(&host, sheet::HIT_DICE), 1, "level {level}");
        }
    }

    #[test]
    fn test_short_rest_with_full_pool_leaves_surge_alone() {
        let record = sample_fighter(ID, "Thorin")
            .attr_max(sheet::HIT_DICE, "5", "5")
            .attr(sheet::HEALING_SURGE, "not_ready");
        let host = host_with(record, &[]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        let outcome = resource.do_short_rest().unwrap();
        assert_eq!(outcome.hit_dice_recovered, 0);
        assert!(!outcome.surge_renewed);
        assert_eq!(int(&host, sheet::HIT_DICE), 5);
        assert!(!resource.is_healing_surge_ready());
        // The rest is still announced.
        assert_eq!(host.take_outbox().len(), 1);
    }

    #[test]
    fn test_long_rest_refills_and_renews() {
        let record = sample_fighter(ID, "Thorin")
            .attr_max(sheet::HIT_DICE, "1", "5")
            .attr(sheet::HEALING_SURGE, "not_ready");
        let host = host_with(record, &[]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        let outcome = resource.do_long_rest().unwrap();
        assert_eq!(outcome.hit_dice_recovered, 4);
        assert_eq!(int(&host, sheet::HIT_DICE), 5);
        assert_eq!(
            host.attribute(&ID.into(), sheet::HEALING_SURGE, AttributeKind::Current),
            Some("ready".to_string())
        );
    }

    #[test]
    fn test_long_rest_with_full_pool_still_renews() {
        let record = sample_fighter(ID, "Thorin")
            .attr_max(sheet::HIT_DICE, "5", "5")
            .attr(sheet::HEALING_SURGE, "not_ready");
        let host = host_with(record, &[]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        let outcome = resource.do_long_rest().unwrap();
        assert_eq!(outcome.hit_dice_recovered, 0);
        assert!(resource.is_healing_surge_ready());
    }

    #[test]
    fn test_heal_saturates_at_i32_limits() {
        let record = sample_fighter(ID, "Thorin")
            .attr_max(sheet::HP, &(i32::MAX - 1).to_string(), &i32::MAX.to_string());
        let host = host_with(record, &[5]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        let outcome = resource.spend_hit_die_to_heal(&feedback()).unwrap();
        assert_eq!(outcome.amount, 7);
        assert_eq!(outcome.hp_after, i32::MAX);
        assert_eq!(int(&host, sheet::HP), i32::MAX);

        let record = sample_fighter(ID, "Thorin")
            .attr_max(sheet::HP, &(i32::MIN + 1).to_string(), "28")
            .attr(sheet::CONSTITUTION, "1");
        let host = host_with(record, &[1]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        let outcome = resource.spend_hit_die_to_heal(&feedback()).unwrap();
        assert_eq!(outcome.amount, -4);
        assert_eq!(outcome.hp_after, i32::MIN);
    }

    #[test]
    fn test_load_accepts_extreme_constitution() {
        let record = sample_fighter(ID, "Thorin").attr(sheet::CONSTITUTION, &i32::MIN.to_string());
        let host = host_with(record, &[1]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();
        assert_eq!(resource.con_mod(), -1_073_741_829);

        let outcome = resource.spend_hit_die_to_heal(&feedback()).unwrap();
        assert_eq!(outcome.amount, 1 - 1_073_741_829);
    }

    #[test]
    fn test_short_rest_saturates_at_i32_max() {
        let record = sample_fighter(ID, "Thorin")
            .attr(sheet::LEVEL, "20")
            .attr_max(sheet::HIT_DICE, &(i32::MAX - 1).to_string(), &i32::MAX.to_string());
        let host = host_with(record, &[]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        let outcome = resource.do_short_rest().unwrap();
        assert_eq!(outcome.hit_dice_recovered, 1);
        assert_eq!(int(&host, sheet::HIT_DICE), i32::MAX);
    }

    #[test]
    fn test_exhaust_emotes_the_picked_line() {
        let host = host_with(sample_fighter(ID, "Thorin"), &[]);
        host.dice().queue_pick(3);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();

        resource.exhaust().unwrap();
        let outbox = host.take_outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].content(), EXHAUST_LINES[3]);
    }

    #[test]
    fn test_short_rest_announces_before_writing() {
        let record = sample_fighter(ID, "Thorin").attr_max(sheet::HIT_DICE, "2", "5");
        let host = host_with(record, &[]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();
        host.set_fail_writes(true);

        assert!(matches!(
            resource.do_short_rest(),
            Err(ResourceError::Host(HostError::Store(_)))
        ));
        let outbox = host.take_outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].content(), INVIGORATED);
    }

    #[test]
    fn test_long_rest_announces_after_writing() {
        let record = sample_fighter(ID, "Thorin").attr_max(sheet::HIT_DICE, "1", "5");
        let host = host_with(record, &[]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();
        host.set_fail_writes(true);

        assert!(matches!(
            resource.do_long_rest(),
            Err(ResourceError::Host(HostError::Store(_)))
        ));
        assert!(host.take_outbox().is_empty());
    }

    #[test]
    fn test_heal_persists_hit_dice_before_rolling() {
        let host = host_with(sample_fighter(ID, "Thorin"), &[4]);
        let mut resource = CharacterResource::load(&host, ID.into()).unwrap();
        host.set_fail_writes(true);

        assert!(matches!(
            resource.spend_hit_die_to_heal(&feedback()),
            Err(ResourceError::Host(HostError::Store(_)))
        ));
        assert_eq!(host.dice().rolls_made(), 0);
        assert!(host.take_outbox().is_empty());
    }
}
