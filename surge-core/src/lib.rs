//! Healing surge rules for a virtual tabletop.
//!
//! This crate provides:
//! - The hit dice / healing surge resource model for a single character
//! - A chat command router (`!ihs -surge`, `-short`, `-long`, `-exhaust`, `-initialize`)
//! - Narrow collaborator traits for the host (attribute store, dice, chat, tokens, macros)
//! - In-memory collaborators for tests and headless play
//!
//! # Quick Start
//!
//! ```ignore
//! use surge_core::testing::{sample_fighter, MemoryHost};
//! use surge_core::{ChatEvent, CommandRouter, RouterConfig, SeededDice};
//!
//! let host = MemoryHost::new(SeededDice::new(7))
//!     .with_character(sample_fighter("char-1", "Thorin"))
//!     .with_token("tok-1", "char-1")
//!     .with_player("p-1", "Sam", false);
//!
//! let router = CommandRouter::new(&host, RouterConfig::default());
//! router.handle(&ChatEvent::api("p-1", "Sam", "!ihs -surge", &["tok-1"]));
//!
//! for message in host.take_outbox() {
//!     println!("{message}");
//! }
//! ```

pub mod config;
pub mod dice;
pub mod flavor;
pub mod host;
pub mod locks;
pub mod resource;
pub mod router;
pub mod sheet;
pub mod testing;

// Primary public API
pub use config::{ConfigError, RouterConfig};
pub use dice::{DiceSource, SeededDice, ThreadRngDice};
pub use host::{Feedback, Host, HostError, Messenger, Recipient};
pub use resource::{CharacterResource, HealOutcome, HealingSurgeState, ResourceError, RestOutcome};
pub use router::{ChatEvent, CommandError, CommandRouter, Handled, Subcommand};
pub use sheet::{AttributeKind, AttributeStore, CharacterId};
