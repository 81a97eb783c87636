//! Chat protocol lines.
//!
//! ```text
//! [@tags ][:prefix ]COMMAND[ param...][ :trailing]
//! ```
//!
//! Parsing is lenient: anything with a command word is accepted. Lines
//! go on the wire without their `\r\n`; the mailbox adds it.

use std::fmt;

/// One parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub tags: Option<String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    /// `Some("")` renders as a bare ` :`.
    pub trailing: Option<String>,
}

impl Message {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn with_trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = Some(trailing.into());
        self
    }

    /// Parse a raw line. Returns `None` if there is no command word.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']).trim_start();
        let mut msg = Message::default();

        if let Some(stripped) = rest.strip_prefix('@') {
            let (tags, tail) = split_word(stripped);
            msg.tags = Some(tags.to_string());
            rest = tail;
        }
        if let Some(stripped) = rest.strip_prefix(':') {
            let (prefix, tail) = split_word(stripped);
            msg.prefix = Some(prefix.to_string());
            rest = tail;
        }

        let (command, mut rest) = split_word(rest);
        if command.is_empty() {
            return None;
        }
        msg.command = command.to_ascii_uppercase();

        while !rest.is_empty() {
            if let Some(trailing) = rest.strip_prefix(':') {
                msg.trailing = Some(trailing.to_string());
                break;
            }
            let (param, tail) = split_word(rest);
            msg.params.push(param.to_string());
            rest = tail;
        }

        Some(msg)
    }

    pub fn pass(password: &str) -> Self {
        Message::new("PASS").with_param(password)
    }

    pub fn nick(nickname: &str) -> Self {
        Message::new("NICK").with_param(nickname)
    }

    pub fn join(channel: &str) -> Self {
        Message::new("JOIN").with_param(channel)
    }

    pub fn part(channel: &str) -> Self {
        Message::new("PART").with_param(channel)
    }

    /// The answer to a `PING`: same arguments, `PONG` command.
    pub fn pong(ping: &Message) -> Self {
        Self {
            tags: None,
            prefix: None,
            command: "PONG".to_string(),
            params: ping.params.clone(),
            trailing: ping.trailing.clone(),
        }
    }
}

/// Split off the first space-delimited word and skip the spaces after it.
fn split_word(s: &str) -> (&str, &str) {
    match s.find(' ') {
        Some(i) => (&s[..i], s[i..].trim_start_matches(' ')),
        None => (s, ""),
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tags) = &self.tags {
            write!(f, "@{tags} ")?;
        }
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        f.write_str(&self.command)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        if let Some(trailing) = &self.trailing {
            write!(f, " :{trailing}")?;
        }
        Ok(())
    }
}
