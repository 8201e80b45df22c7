//! Chat command routing.
//!
//! The router turns one inbound chat event into one resource operation:
//! strip the prefix, pick the subcommand, resolve the selected token to a
//! character, load a fresh [`CharacterResource`], run the operation and
//! report back to the sender.
//!
//! Errors are split at this boundary. Validation and rule errors are
//! whispered to the sender; host failures are logged and the player sees
//! nothing.

use crate::config::RouterConfig;
use crate::host::{Feedback, Host, HostError, MacroSpec, Recipient, TokenResolver};
use crate::locks::CharacterLocks;
use crate::resource::{CharacterResource, ResourceError};
use crate::sheet::{self, AttributeKind, AttributeStore, CharacterId};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Chat event type the router listens to.
pub const API_EVENT: &str = "api";

/// Object type of a selected token.
pub const GRAPHIC: &str = "graphic";

const GM_TAG: &str = " (GM)";

/// Errors produced while handling a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("A token must be selected before using this script.")]
    SelectionInvalid,

    #[error("Only the GM can use this command.")]
    RestrictedAccess,

    #[error("Unknown command {0:?}. Use one of: {flags}", flags = Subcommand::usage())]
    UnknownSubcommand(String),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

impl CommandError {
    pub fn kind_name(&self) -> &'static str {
        match self {
            CommandError::SelectionInvalid => "SelectionInvalid",
            CommandError::RestrictedAccess => "RestrictedAccess",
            CommandError::UnknownSubcommand(_) => "UnknownSubcommand",
            CommandError::Resource(e) => e.kind_name(),
            CommandError::Host(_) => "HostError",
        }
    }

    /// Whether the sender should be told. Host failures are only logged.
    pub fn is_user_facing(&self) -> bool {
        match self {
            CommandError::Resource(e) => e.is_user_facing(),
            CommandError::Host(_) => false,
            _ => true,
        }
    }

    /// Text whispered to the sender.
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.kind_name(), self)
    }
}

/// The operations reachable from chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subcommand {
    Surge,
    ShortRest,
    LongRest,
    Exhaust,
    Initialize,
}

impl Subcommand {
    pub fn all() -> [Subcommand; 5] {
        [
            Subcommand::Surge,
            Subcommand::ShortRest,
            Subcommand::LongRest,
            Subcommand::Exhaust,
            Subcommand::Initialize,
        ]
    }

    pub fn flag(&self) -> &'static str {
        match self {
            Subcommand::Surge => "-surge",
            Subcommand::ShortRest => "-short",
            Subcommand::LongRest => "-long",
            Subcommand::Exhaust => "-exhaust",
            Subcommand::Initialize => "-initialize",
        }
    }

    /// Parse the first word of the arguments.
    pub fn parse(args: &str) -> Result<Self, CommandError> {
        let word = args.split_whitespace().next().unwrap_or("");
        match word.to_lowercase().as_str() {
            "-surge" => Ok(Subcommand::Surge),
            "-short" | "-shortrest" => Ok(Subcommand::ShortRest),
            "-long" | "-longrest" => Ok(Subcommand::LongRest),
            "-exhaust" => Ok(Subcommand::Exhaust),
            "-initialize" => Ok(Subcommand::Initialize),
            _ => Err(CommandError::UnknownSubcommand(word.to_string())),
        }
    }

    fn usage() -> String {
        Subcommand::all()
            .iter()
            .map(|s| s.flag())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.flag())
    }
}

/// A selected object attached to a chat event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedObject {
    pub id: String,
    #[serde(default = "default_object_type")]
    pub object_type: String,
}

fn default_object_type() -> String {
    GRAPHIC.to_string()
}

/// An inbound chat event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Event type; only `api` events are commands.
    pub kind: String,
    pub content: String,
    /// Sender display name, possibly tagged ` (GM)`.
    pub who: String,
    pub player_id: String,
    #[serde(default)]
    pub selected: Vec<SelectedObject>,
}

impl ChatEvent {
    /// An `api` event with the given tokens selected.
    pub fn api(player_id: &str, who: &str, content: &str, selected: &[&str]) -> Self {
        Self {
            kind: API_EVENT.to_string(),
            content: content.to_string(),
            who: who.to_string(),
            player_id: player_id.to_string(),
            selected: selected
                .iter()
                .map(|id| SelectedObject {
                    id: id.to_string(),
                    object_type: default_object_type(),
                })
                .collect(),
        }
    }

    /// Sender name usable as a whisper target.
    pub fn sender(&self) -> &str {
        self.who.strip_suffix(GM_TAG).unwrap_or(&self.who)
    }
}

/// What happened to an event.
#[derive(Debug)]
pub enum Handled {
    /// Not a command for this router.
    Ignored,
    Completed(Subcommand),
    /// Rejected with a message to the sender.
    Rejected(CommandError),
    /// Failed on a host error; logged only.
    Failed(CommandError),
}

/// The acting character behind a selected token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCharacter {
    pub id: CharacterId,
    pub name: String,
    pub is_npc: bool,
}

/// Resolve exactly one selected, non-drawing token to its character.
pub fn resolve_character<H>(
    host: &H,
    selected: &[SelectedObject],
) -> Result<ResolvedCharacter, CommandError>
where
    H: TokenResolver + AttributeStore + ?Sized,
{
    let [object] = selected else {
        return Err(CommandError::SelectionInvalid);
    };
    if object.object_type != GRAPHIC {
        return Err(CommandError::SelectionInvalid);
    }

    let token = host.token(&object.id)?.ok_or(CommandError::SelectionInvalid)?;
    if token.is_drawing {
        return Err(CommandError::SelectionInvalid);
    }
    let id = token.represents.ok_or(CommandError::SelectionInvalid)?;
    let journal_name = host
        .journal_name(&id)?
        .ok_or(CommandError::SelectionInvalid)?;

    let name = host
        .read_attribute(&id, sheet::NAME, AttributeKind::Current)?
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(journal_name);
    let is_npc = host
        .read_attribute(&id, sheet::NPC, AttributeKind::Current)?
        .is_some_and(|v| v.trim() == "1");

    Ok(ResolvedCharacter { id, name, is_npc })
}

/// Routes chat commands to character resources.
pub struct CommandRouter<'h, H: ?Sized> {
    host: &'h H,
    config: RouterConfig,
    locks: CharacterLocks,
}

impl<'h, H: Host + ?Sized> CommandRouter<'h, H> {
    pub fn new(host: &'h H, config: RouterConfig) -> Self {
        Self {
            host,
            config,
            locks: CharacterLocks::new(),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Full chat command for a subcommand, e.g. `!ihs -surge`.
    pub fn command(&self, subcommand: Subcommand) -> String {
        format!("{} {}", self.config.prefix(), subcommand.flag())
    }

    /// Macros created by `-initialize`.
    pub fn macros(&self) -> Vec<MacroSpec> {
        [
            ("HealingSurge", Subcommand::Surge),
            ("ShortRest", Subcommand::ShortRest),
            ("LongRest", Subcommand::LongRest),
        ]
        .into_iter()
        .map(|(name, subcommand)| MacroSpec {
            name: name.to_string(),
            action: self.command(subcommand),
            token_action: true,
        })
        .collect()
    }

    /// Handle one chat event to completion.
    pub fn handle(&self, event: &ChatEvent) -> Handled {
        if event.kind != API_EVENT {
            return Handled::Ignored;
        }
        let Some(args) = self.strip_prefix(&event.content) else {
            return Handled::Ignored;
        };

        let feedback = Feedback::new(
            &self.config.feedback_name,
            Recipient::Player(event.sender().to_string()),
        );

        let result = Subcommand::parse(args)
            .and_then(|subcommand| self.dispatch(subcommand, event, &feedback).map(|()| subcommand));

        match result {
            Ok(subcommand) => Handled::Completed(subcommand),
            Err(err) if err.is_user_facing() => {
                warn!("{} rejected for {}: {err}", event.content, event.sender());
                if let Err(send_err) = feedback.error(self.host, &err.user_message()) {
                    error!("Could not report error to {}: {send_err}", event.sender());
                }
                Handled::Rejected(err)
            }
            Err(err) => {
                error!("{} failed for {}: {err}", event.content, event.sender());
                Handled::Failed(err)
            }
        }
    }

    fn strip_prefix<'c>(&self, content: &'c str) -> Option<&'c str> {
        let rest = content.trim_start().strip_prefix(&self.config.prefix())?;
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            Some(rest.trim())
        } else {
            None
        }
    }

    fn dispatch(
        &self,
        subcommand: Subcommand,
        event: &ChatEvent,
        feedback: &Feedback<'_>,
    ) -> Result<(), CommandError> {
        debug!("{} {subcommand} from {}", self.config.prefix(), event.sender());
        match subcommand {
            Subcommand::Initialize => self.initialize(&event.player_id, feedback),
            Subcommand::Surge => self.with_character(event, |resource| self.surge(resource, feedback)),
            Subcommand::ShortRest => self.with_character(event, |resource| {
                let outcome = resource.do_short_rest()?;
                debug!("{}: short rest {outcome:?}", resource.id());
                Ok(())
            }),
            Subcommand::LongRest => self.with_character(event, |resource| {
                let outcome = resource.do_long_rest()?;
                debug!("{}: long rest {outcome:?}", resource.id());
                Ok(())
            }),
            Subcommand::Exhaust => self.with_character(event, |resource| Ok(resource.exhaust()?)),
        }
    }

    fn with_character<F>(&self, event: &ChatEvent, f: F) -> Result<(), CommandError>
    where
        F: FnOnce(&mut CharacterResource<'h, H>) -> Result<(), CommandError>,
    {
        let character = resolve_character(self.host, &event.selected)?;
        let run = || -> Result<(), CommandError> {
            debug!("Loading {} ({})", character.name, character.id);
            let mut resource = CharacterResource::load(self.host, character.id.clone())?;
            f(&mut resource)
        };

        if self.config.serialize_per_character {
            self.locks.with_lock(&character.id, run)
        } else {
            run()
        }
    }

    /// Heal once, then either offer another die or spend the surge.
    fn surge(
        &self,
        resource: &mut CharacterResource<'h, H>,
        feedback: &Feedback<'_>,
    ) -> Result<(), CommandError> {
        let outcome = resource.spend_hit_die_to_heal(feedback)?;
        debug!("{}: healed {outcome:?}", resource.id());

        if resource.is_hurt() && resource.is_hit_dice_ready() {
            feedback.notify(self.host, &self.continuation_prompt(resource))?;
        } else {
            resource.exhaust()?;
        }
        Ok(())
    }

    fn continuation_prompt(&self, resource: &CharacterResource<'h, H>) -> String {
        format!(
            "{}/{} hp, {} hit dice left. Spend another hit die? [Yes]({}) [No]({})",
            resource.hp(),
            resource.max_hp(),
            resource.hit_dice(),
            self.command(Subcommand::Surge),
            self.command(Subcommand::Exhaust),
        )
    }

    fn initialize(&self, player_id: &str, feedback: &Feedback<'_>) -> Result<(), CommandError> {
        if !self.host.is_gm(player_id)? {
            return Err(CommandError::RestrictedAccess);
        }

        let mut created = Vec::new();
        for spec in self.macros() {
            if self.host.create_macro_if_absent(&spec, player_id)? {
                info!("Created macro {} ({})", spec.name, spec.action);
                created.push(spec.name);
            }
        }

        let text = if created.is_empty() {
            "All macros already exist.".to_string()
        } else {
            format!("Created macros: {}", created.join(", "))
        };
        feedback.notify(self.host, &text)?;
        Ok(())
    }
}
