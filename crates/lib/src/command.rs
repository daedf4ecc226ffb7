//! Mesh command parsing: `!wsp`, `!ping`, `!help`, `!clima`, `!sismo`.
//!
//! Matching is a case-sensitive prefix match on the trimmed message; arguments are split on
//! runs of whitespace.

/// Usage text returned for `!help`.
pub const HELP_TEXT: &str = "🤖 Available commands:\n\
!wsp <phone> <message> - Send WhatsApp message\n\
!ping - Check if the bridge is alive\n\
!clima [city] - Current weather\n\
!sismo - Latest earthquake in the region\n\
!help - Show this help message";

const WSP: &str = "!wsp";
const PING: &str = "!ping";
const HELP: &str = "!help";
const CLIMA: &str = "!clima";
const SISMO: &str = "!sismo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKind {
    Weather,
    Earthquake,
}

/// What a mesh message asks the relay to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Send `body` to the chat user at `phone` (no leading `+`).
    SendToChat { phone: String, body: String },
    Ping,
    Help,
    /// `argument` is the location for weather and the region keyword for earthquakes.
    InfoQuery { kind: InfoKind, argument: String },
    Unrecognized { raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Invalid !wsp command. Format: !wsp <phone> <message>")]
    MalformedSend,
}

/// Turns mesh text into an [`Intent`]. Holds the defaults substituted into info queries.
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    default_location: String,
    quake_region: String,
}

impl CommandInterpreter {
    pub fn new(default_location: impl Into<String>, quake_region: impl Into<String>) -> Self {
        Self {
            default_location: default_location.into(),
            quake_region: quake_region.into(),
        }
    }

    pub fn interpret(&self, text: &str) -> Result<Intent, CommandError> {
        let trimmed = text.trim();
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(Intent::Unrecognized {
                raw: text.to_string(),
            });
        }

        if trimmed.starts_with(HELP) {
            return Ok(Intent::Help);
        }
        if trimmed.starts_with(PING) {
            return Ok(Intent::Ping);
        }
        if trimmed.starts_with(CLIMA) {
            let argument = if tokens.len() >= 2 {
                tokens[1..].join(" ")
            } else {
                self.default_location.clone()
            };
            return Ok(Intent::InfoQuery {
                kind: InfoKind::Weather,
                argument,
            });
        }
        if trimmed.starts_with(SISMO) {
            return Ok(Intent::InfoQuery {
                kind: InfoKind::Earthquake,
                argument: self.quake_region.clone(),
            });
        }
        if trimmed.starts_with(WSP) {
            if tokens.len() < 3 {
                return Err(CommandError::MalformedSend);
            }
            let phone = tokens[1].strip_prefix('+').unwrap_or(tokens[1]);
            return Ok(Intent::SendToChat {
                phone: phone.to_string(),
                body: tokens[2..].join(" "),
            });
        }

        Ok(Intent::Unrecognized {
            raw: text.to_string(),
        })
    }
}

impl Default for CommandInterpreter {
    fn default() -> Self {
        Self::new("Santiago", "Chile")
    }
}
