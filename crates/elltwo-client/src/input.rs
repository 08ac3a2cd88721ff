//! Key-script input: one event per line.
//!
//! ```text
//! down            shift+down      w       esc     o
//! shift+enter     backspace       shift+x ctrl+s  mod+s
//! type some text  click 3         toggle  reload  revert
//! export html     quit
//! ```
//!
//! `mod` is Cmd with `--platform-mac` and Ctrl otherwise. Blank lines and
//! lines starting with `#` are skipped.

use elltwo_core::{
    CellId, Display, ExportFormat, Key, KeyEvent, KeydownResult, MessageSink, Modifiers, Session,
};
use tracing::{debug, warn};

use crate::error::InputError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Key(KeyEvent),
    Type(String),
    Click(CellId),
    Toggle,
    Reload,
    Revert,
    Export(ExportFormat),
    Quit,
}

/// Parse one script line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str, platform_mac: bool) -> Result<Option<Command>, InputError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (word, rest) = match trimmed.split_once(' ') {
        Some((word, rest)) => (word, Some(rest)),
        None => (trimmed, None),
    };

    let command = match word {
        "type" => {
            // Keep inner spacing exactly as written.
            let text = line
                .trim_start()
                .strip_prefix("type ")
                .ok_or(InputError::MissingArgument("type"))?;
            Command::Type(text.to_string())
        }
        "click" => {
            let raw = rest.ok_or(InputError::MissingArgument("click"))?.trim();
            let id = raw
                .parse::<i64>()
                .map_err(|_| InputError::BadCellId(raw.to_string()))?;
            Command::Click(CellId(id))
        }
        "export" => {
            let raw = rest.ok_or(InputError::MissingArgument("export"))?.trim();
            let format =
                ExportFormat::parse(raw).ok_or_else(|| InputError::UnknownFormat(raw.to_string()))?;
            Command::Export(format)
        }
        "toggle" => Command::Toggle,
        "reload" => Command::Reload,
        "revert" => Command::Revert,
        "quit" => Command::Quit,
        chord => Command::Key(parse_chord(chord, platform_mac)?),
    };
    Ok(Some(command))
}

/// Parse `shift+ctrl+x`-style chords.
pub fn parse_chord(chord: &str, platform_mac: bool) -> Result<KeyEvent, InputError> {
    let (held, key) = if chord == "+" {
        ("", "+")
    } else if let Some(held) = chord.strip_suffix("++") {
        (held, "+")
    } else {
        chord.rsplit_once('+').unwrap_or(("", chord))
    };

    let mut modifiers = Modifiers::NONE;
    for part in held.split('+').filter(|p| !p.is_empty()) {
        match part.to_ascii_lowercase().as_str() {
            "shift" => modifiers.shift = true,
            "ctrl" | "control" => modifiers.ctrl = true,
            "alt" | "opt" => modifiers.alt = true,
            "cmd" | "meta" | "super" => modifiers.meta = true,
            "mod" => {
                let primary = Modifiers::primary(platform_mac);
                modifiers.ctrl |= primary.ctrl;
                modifiers.meta |= primary.meta;
            }
            other => return Err(InputError::UnknownModifier(other.to_string())),
        }
    }

    Ok(KeyEvent::new(parse_key(key)?, modifiers))
}

fn parse_key(name: &str) -> Result<Key, InputError> {
    let key = match name.to_ascii_lowercase().as_str() {
        "up" => Key::ArrowUp,
        "down" => Key::ArrowDown,
        "left" => Key::ArrowLeft,
        "right" => Key::ArrowRight,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "esc" | "escape" => Key::Escape,
        "enter" | "return" => Key::Enter,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "tab" => Key::Tab,
        "space" => Key::Space,
        _ if name.chars().count() == 1 => Key::character(name),
        _ => return Err(InputError::UnknownKey(name.to_string())),
    };
    Ok(key)
}

impl Command {
    /// Run the command against a session.
    pub fn apply<D: Display, S: MessageSink>(self, session: &mut Session<D, S>) {
        match self {
            Command::Key(event) => {
                let result = session.input(&event);
                if result == KeydownResult::NotHandled {
                    debug!(?event, "key not bound here");
                }
            }
            Command::Type(text) => {
                if !session.type_text(&text) {
                    warn!("no cell is being edited, press `w` first");
                }
            }
            Command::Click(id) => match session.click(id) {
                Ok(true) => {}
                Ok(false) => debug!(cid = %id, "click ignored outside editing mode"),
                Err(e) => warn!(error = %e, "click failed"),
            },
            Command::Toggle => {
                session.toggle_editing();
            }
            Command::Reload => session.reload(),
            Command::Revert => session.revert(),
            Command::Export(format) => match format {
                ExportFormat::Md | ExportFormat::Mdplus => {
                    let data = session.markdown();
                    session.export(format, data, None);
                }
                other => warn!(
                    format = other.as_str(),
                    "no generator for this format in the terminal client"
                ),
            },
            Command::Quit => {}
        }
    }
}
