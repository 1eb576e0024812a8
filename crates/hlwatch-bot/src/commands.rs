//! Chat command interface.
//!
//! Commands edit the watch-list owned by [`CommandHandler`] and push every
//! change to the feed client, which adjusts its subscriptions.

use hlwatch_core::{CoreError, WatchList};
use hlwatch_telegram::ParseMode;
use hlwatch_ws::ConnectionManager;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum characters of the last feed message shown by `/debug`.
const DEBUG_MAX_CHARS: usize = 4000;

pub const HELP_TEXT: &str = "Bot started! 🚀 Use commands:\n\
    /add {label} {address} - add address\n\
    /remove {label} - remove address\n\
    /list - list addresses\n\
    /debug - show last message";

/// A recognised chat command with its raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Add(Vec<String>),
    Remove(Vec<String>),
    List,
    Debug,
}

impl Command {
    /// Parse a message text.
    ///
    /// Returns `None` for plain text and unknown commands. A `@BotName`
    /// suffix on the command word is accepted.
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next()?.strip_prefix('/')?;
        let name = head.split_once('@').map_or(head, |(name, _bot)| name);
        let args: Vec<String> = tokens.map(str::to_string).collect();

        match name {
            "start" => Some(Self::Start),
            "add" => Some(Self::Add(args)),
            "remove" => Some(Self::Remove(args)),
            "list" => Some(Self::List),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

/// Text to send back to the chat a command came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: Some(ParseMode::Markdown),
        }
    }
}

/// Executes chat commands against the watch-list.
pub struct CommandHandler {
    watch_list: WatchList,
    feed: Arc<ConnectionManager>,
}

impl CommandHandler {
    /// Create a handler with an empty watch-list.
    pub fn new(feed: Arc<ConnectionManager>) -> Self {
        Self {
            watch_list: WatchList::new(),
            feed,
        }
    }

    pub fn watch_list(&self) -> &WatchList {
        &self.watch_list
    }

    /// Handle one message text; `None` means no reply.
    pub fn handle(&mut self, text: &str) -> Option<Reply> {
        let Some(command) = Command::parse(text) else {
            debug!(text, "Ignoring non-command message");
            return None;
        };

        let reply = match command {
            Command::Start => Reply::plain(HELP_TEXT),
            Command::Add(args) => self.add(&args),
            Command::Remove(args) => self.remove(&args),
            Command::List => self.list(),
            Command::Debug => self.debug(),
        };
        Some(reply)
    }

    fn add(&mut self, args: &[String]) -> Reply {
        let [label, address] = args else {
            return Reply::plain("Usage: /add {label} {address} ❗");
        };

        match self.watch_list.add(label, address) {
            Ok(entry) => {
                let text = format!("Added address: {} ({}) ✅", entry.label, entry.address);
                info!(label = %entry.label, address = %entry.address, "Address added");
                self.push_watch_list();
                Reply::plain(text)
            }
            Err(CoreError::InvalidAddress(address)) => {
                warn!(%address, "Rejected invalid address");
                Reply::plain("Invalid address format 🚫")
            }
            Err(e) => Reply::plain(format!("{e} 😕")),
        }
    }

    fn remove(&mut self, args: &[String]) -> Reply {
        let [label] = args else {
            return Reply::plain("Usage: /remove {label} ❗");
        };

        match self.watch_list.remove(label) {
            Ok(entry) => {
                info!(label = %entry.label, address = %entry.address, "Address removed");
                self.push_watch_list();
                Reply::plain(format!("Removed label: {} 🗑️", entry.label))
            }
            Err(e) => Reply::plain(format!("{e} 😕")),
        }
    }

    fn list(&self) -> Reply {
        if self.watch_list.is_empty() {
            return Reply::plain("Address list is empty 📭");
        }

        let lines: Vec<String> = self
            .watch_list
            .entries()
            .iter()
            .map(|entry| format!("{}: {}", entry.label, entry.address))
            .collect();
        Reply::plain(format!("Address list: 📋\n{}", lines.join("\n")))
    }

    fn debug(&self) -> Reply {
        let Some(message) = self.feed.last_message() else {
            return Reply::plain("No recent messages 📪");
        };

        let pretty = serde_json::to_string_pretty(&message).unwrap_or_else(|_| message.to_string());
        Reply::markdown(format!(
            "Last message: 📬\n```json\n{}\n```",
            truncate_chars(&pretty, DEBUG_MAX_CHARS)
        ))
    }

    fn push_watch_list(&self) {
        self.feed.set_watch_list(self.watch_list.snapshot());
    }
}

/// First `max` characters of `text`, never splitting a character.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlwatch_ws::ConnectionConfig;
    use tokio::sync::mpsc;

    const ADDR_A: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const ADDR_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn handler() -> CommandHandler {
        let (fill_tx, _fill_rx) = mpsc::channel(8);
        let feed = Arc::new(ConnectionManager::new(ConnectionConfig::default(), fill_tx));
        CommandHandler::new(feed)
    }

    fn reply_text(handler: &mut CommandHandler, text: &str) -> String {
        handler.handle(text).expect("reply").text
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/list@hlwatch_bot"), Some(Command::List));
        assert_eq!(
            Command::parse("  /add  a   0x1 "),
            Some(Command::Add(vec!["a".to_string(), "0x1".to_string()]))
        );
        assert_eq!(Command::parse("/remove"), Some(Command::Remove(vec![])));
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_start_replies_help() {
        let mut h = handler();
        let text = reply_text(&mut h, "/start");
        assert!(text.starts_with("Bot started! 🚀"));
        assert!(text.contains("/add {label} {address} - add address"));
        assert!(text.ends_with("/debug - show last message"));
    }

    #[test]
    fn test_add_and_list() {
        let mut h = handler();
        assert_eq!(
            reply_text(&mut h, &format!("/add A {ADDR_A}")),
            format!("Added address: A ({ADDR_A}) ✅")
        );
        reply_text(&mut h, &format!("/add B {ADDR_B}"));

        assert_eq!(
            reply_text(&mut h, "/list"),
            format!("Address list: 📋\nA: {ADDR_A}\nB: {ADDR_B}")
        );
        // Every change reaches the feed client
        assert_eq!(h.feed.watch_list().len(), 2);
    }

    #[test]
    fn test_add_usage() {
        let mut h = handler();
        assert_eq!(reply_text(&mut h, "/add A"), "Usage: /add {label} {address} ❗");
        assert_eq!(
            reply_text(&mut h, &format!("/add A {ADDR_A} extra")),
            "Usage: /add {label} {address} ❗"
        );
        assert!(h.watch_list().is_empty());
    }

    #[test]
    fn test_add_duplicate_label() {
        let mut h = handler();
        reply_text(&mut h, &format!("/add A {ADDR_A}"));
        assert_eq!(
            reply_text(&mut h, &format!("/add A {ADDR_B}")),
            "Label \"A\" already exists 😕"
        );
        assert_eq!(h.watch_list().len(), 1);
    }

    #[test]
    fn test_add_invalid_address() {
        let mut h = handler();
        assert_eq!(reply_text(&mut h, "/add A 0x123"), "Invalid address format 🚫");
        assert!(h.feed.watch_list().is_empty());
    }

    #[test]
    fn test_remove() {
        let mut h = handler();
        reply_text(&mut h, &format!("/add A {ADDR_A}"));

        assert_eq!(reply_text(&mut h, "/remove A"), "Removed label: A 🗑️");
        assert!(h.watch_list().is_empty());
        assert!(h.feed.watch_list().is_empty());
        assert_eq!(reply_text(&mut h, "/list"), "Address list is empty 📭");
    }

    #[test]
    fn test_remove_missing_label_leaves_list_unchanged() {
        let mut h = handler();
        reply_text(&mut h, &format!("/add A {ADDR_A}"));

        assert_eq!(reply_text(&mut h, "/remove Z"), "Label \"Z\" not found 😕");
        assert_eq!(h.watch_list().len(), 1);
        assert_eq!(reply_text(&mut h, "/remove"), "Usage: /remove {label} ❗");
    }

    #[test]
    fn test_debug_without_messages() {
        let mut h = handler();
        let reply = h.handle("/debug").unwrap();
        assert_eq!(reply.text, "No recent messages 📪");
        assert_eq!(reply.parse_mode, None);
    }

    #[test]
    fn test_plain_text_ignored() {
        let mut h = handler();
        assert!(h.handle("gm").is_none());
        assert!(h.handle("/help").is_none());
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars("📈📈", 1), "📈");
    }
}
