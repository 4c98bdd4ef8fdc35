//! Console Chat Adapter
//!
//! Prints outgoing chat lines and parses incoming ones. The line parser
//! is the demo binary's stand-in for the out-of-scope chat dispatch
//! framework: `<sender>: !trigger args...`, whitespace-tokenized.

use async_trait::async_trait;

use crate::ports::chat::ChatPort;

/// Chat stub that prints outgoing lines to the console.
#[derive(Debug, Default)]
pub struct ConsoleChat;

#[async_trait]
impl ChatPort for ConsoleChat {
    async fn send(&self, message: &str, target: Option<&str>) {
        match target {
            Some(user) => println!("[whisper -> {}] {}", user, message),
            None => println!("[chat] {}", message),
        }
    }
}

/// One parsed incoming chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInvocation {
    pub sender: String,
    pub trigger: String,
    pub args: Vec<String>,
}

/// Parses `<sender>: !trigger args...`. Returns `None` for lines that
/// are not command invocations.
pub fn parse_chat_line(line: &str) -> Option<ChatInvocation> {
    let (sender, rest) = line.split_once(':')?;
    let sender = sender.trim();
    if sender.is_empty() {
        return None;
    }

    let mut tokens = rest.split_whitespace();
    let trigger = tokens.next()?;
    if !trigger.starts_with('!') {
        return None;
    }

    Some(ChatInvocation {
        sender: sender.to_string(),
        trigger: trigger.to_string(),
        args: tokens.map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_command_with_args() {
        let invocation = parse_chat_line("Alice: !coins give @Bob 30").unwrap();
        assert_eq!(invocation.sender, "Alice");
        assert_eq!(invocation.trigger, "!coins");
        assert_eq!(invocation.args, vec!["give", "@Bob", "30"]);
    }

    #[test]
    fn test_parses_bare_trigger() {
        let invocation = parse_chat_line("Bob:   !coins  ").unwrap();
        assert_eq!(invocation.sender, "Bob");
        assert_eq!(invocation.trigger, "!coins");
        assert!(invocation.args.is_empty());
    }

    #[test]
    fn test_rejects_non_command_lines() {
        assert_eq!(parse_chat_line("Alice: hello there"), None);
        assert_eq!(parse_chat_line("no separator here"), None);
        assert_eq!(parse_chat_line(": !coins"), None);
        assert_eq!(parse_chat_line("Alice:"), None);
    }
}
