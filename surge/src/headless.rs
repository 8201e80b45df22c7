//! Line-oriented table simulator.
//!
//! - Lines starting with `#` are simulator commands (status, save, quit, help)
//! - Every other line is a chat message from a player

use anyhow::Context;
use std::io::{self, BufRead, Write};
use std::path::Path;
use surge_core::sheet::{self, AttributeKind};
use surge_core::testing::MemoryHost;
use surge_core::{ChatEvent, CharacterId, CommandRouter, DiceSource, Handled, RouterConfig};

/// A parsed chat line.
#[derive(Debug, PartialEq, Eq)]
pub struct ChatLine<'a> {
    pub player_id: &'a str,
    pub tokens: Vec<&'a str>,
    pub content: &'a str,
}

/// Parse `<player-id> [@token ...] <message>`.
pub fn parse_chat_line(line: &str) -> Option<ChatLine<'_>> {
    let line = line.trim();
    let (player_id, mut rest) = line.split_once(char::is_whitespace)?;
    let mut tokens = Vec::new();
    while let Some(after_at) = rest.trim_start().strip_prefix('@') {
        let (token, remainder) = after_at
            .split_once(char::is_whitespace)
            .unwrap_or((after_at, ""));
        tokens.push(token);
        rest = remainder;
    }
    let content = rest.trim();
    if content.is_empty() {
        return None;
    }
    Some(ChatLine {
        player_id,
        tokens,
        content,
    })
}

fn print_help(prefix: &str) {
    println!("Commands:");
    println!("  #status <character-id> - Show hit points, hit dice and surge");
    println!("  #save <path>           - Save the campaign");
    println!("  #quit                  - Exit");
    println!("  #help                  - Show this help");
    println!("Chat: <player-id> [@token-id ...] {prefix} -surge|-short|-long|-exhaust|-initialize");
}

fn print_status<D: DiceSource>(host: &MemoryHost<D>, id: &str) {
    let id = CharacterId::from(id);
    let Some(record) = host.campaign().character(&id).cloned() else {
        println!("[ERROR] No character {id}");
        return;
    };
    let value = |name: &str, kind: AttributeKind| {
        host.attribute(&id, name, kind).unwrap_or_else(|| "-".to_string())
    };
    println!("[STATUS] {}", record.name);
    println!(
        "  HP: {}/{}",
        value(sheet::HP, AttributeKind::Current),
        value(sheet::HP, AttributeKind::Max)
    );
    println!(
        "  Hit dice: {}/{} (d{})",
        value(sheet::HIT_DICE, AttributeKind::Current),
        value(sheet::HIT_DICE, AttributeKind::Max),
        value(sheet::HIT_DIE_SIZE, AttributeKind::Current)
    );
    println!(
        "  Healing surge: {}",
        value(sheet::HEALING_SURGE, AttributeKind::Current)
    );
}

pub async fn save_campaign<D: DiceSource>(host: &MemoryHost<D>, path: &Path) -> anyhow::Result<()> {
    let json = host.campaign().to_json()?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("writing campaign {}", path.display()))
}

/// Run the simulator until EOF or `#quit`.
pub async fn run_headless<D: DiceSource>(
    host: &MemoryHost<D>,
    config: RouterConfig,
) -> anyhow::Result<()> {
    let prefix = config.prefix();
    let router = CommandRouter::new(host, config);

    println!("=== Healing Surge Headless Mode ===");
    print_help(&prefix);
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("reading input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('#') {
            let parts: Vec<&str> = command.split_whitespace().collect();
            match parts.first().copied() {
                Some("quit") | Some("exit") => break,
                Some("status") => match parts.get(1) {
                    Some(id) => print_status(host, id),
                    None => println!("[ERROR] Usage: #status <character-id>"),
                },
                Some("save") => match parts.get(1) {
                    Some(path) => match save_campaign(host, Path::new(path)).await {
                        Ok(()) => println!("[SAVED] Campaign saved to {path}"),
                        Err(e) => println!("[ERROR] Save failed: {e:#}"),
                    },
                    None => println!("[ERROR] Usage: #save <path>"),
                },
                Some("help") => print_help(&prefix),
                _ => println!("[ERROR] Unknown command. Type #help for help."),
            }
            stdout.flush().ok();
            continue;
        }

        let Some(chat) = parse_chat_line(line) else {
            println!("[ERROR] Expected: <player-id> [@token-id ...] <message>");
            continue;
        };
        let Some(player) = host.campaign().player(chat.player_id).cloned() else {
            println!("[ERROR] No player {}", chat.player_id);
            continue;
        };

        let who = if player.gm {
            format!("{} (GM)", player.name)
        } else {
            player.name.clone()
        };
        let event = ChatEvent::api(&player.id, &who, chat.content, &chat.tokens);

        match router.handle(&event) {
            Handled::Ignored => println!("{who}: {}", chat.content),
            Handled::Failed(err) => println!("[HOST ERROR] {err}"),
            Handled::Completed(_) | Handled::Rejected(_) => {}
        }
        for message in host.take_outbox() {
            println!("{message}");
        }
        stdout.flush().ok();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_line_with_tokens() {
        let chat = parse_chat_line("p-sam @tok-1 !ihs -surge").unwrap();
        assert_eq!(chat.player_id, "p-sam");
        assert_eq!(chat.tokens, vec!["tok-1"]);
        assert_eq!(chat.content, "!ihs -surge");
    }

    #[test]
    fn test_parse_chat_line_without_tokens() {
        let chat = parse_chat_line("p-gm   !ihs -initialize").unwrap();
        assert!(chat.tokens.is_empty());
        assert_eq!(chat.content, "!ihs -initialize");
    }

    #[test]
    fn test_parse_chat_line_multiple_tokens() {
        let chat = parse_chat_line("p-sam @a @b !ihs -long").unwrap();
        assert_eq!(chat.tokens, vec!["a", "b"]);
    }

    #[test]
    fn test_example_campaign_plays() {
        use surge_core::testing::{Campaign, ScriptedDice};

        let campaign = Campaign::from_json(include_str!("../campaign.example.json")).unwrap();
        let host = MemoryHost::from_campaign(campaign, ScriptedDice::with_rolls(&[6]));
        let router = CommandRouter::new(&host, RouterConfig::default());

        let chat = parse_chat_line("p-sam @tok-thorin !ihs -surge").unwrap();
        let event = ChatEvent::api(chat.player_id, "Sam", chat.content, &chat.tokens);
        assert!(matches!(router.handle(&event), Handled::Completed(_)));

        // 14 + 6 + 3 (constitution 16)
        let id = CharacterId::from("char-thorin");
        assert_eq!(host.attribute_int(&id, sheet::HP, AttributeKind::Current), Some(23));

        let chat = parse_chat_line("p-sam @tok-scribble !ihs -surge").unwrap();
        let event = ChatEvent::api(chat.player_id, "Sam", chat.content, &chat.tokens);
        assert!(matches!(router.handle(&event), Handled::Rejected(_)));
    }

    #[test]
    fn test_parse_chat_line_needs_a_message() {
        assert!(parse_chat_line("p-sam").is_none());
        assert!(parse_chat_line("p-sam @tok-1").is_none());
    }
}
