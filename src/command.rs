//! Inbound serial command parsing.
//!
//! `SET:` lines mutate the settings record; `CMD:` lines drive mode and
//! transmit actions. Anything malformed or out of range surfaces as a
//! `CommandError`, echoed to the host as `ERR:<reason>`.

use snafu::Snafu;

use crate::settings::{AppMode, DecodeMode, Settings};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetLocatorLength(u8),
    SetDecodeMode(DecodeMode),
    SetTxAdvance(u16),
    SetRxRetard(u16),
    SetHalfRate(bool),
    SetMorseWpm(u8),
    SetConfidence(f32),
    /// Triggers a reboot into the new mode.
    SetApp(AppMode),
    SetMessage { slot: u8, text: String },
    Tx,
    Rx,
    TxMessage(u8),
    /// Continuous CW dashes for spectrum alignment.
    Dashes,
    MorseTx(String),
    Ident,
    Clear,
    Reboot,
}

#[derive(Debug, Snafu)]
pub enum CommandError {
    #[snafu(display("Unknown command '{line}'"))]
    Unknown { line: String },

    #[snafu(display("Missing argument for '{line}'"))]
    MissingArgument { line: String },

    #[snafu(display("Bad value '{value}' for {name}"))]
    BadValue { name: &'static str, value: String },

    #[snafu(display("{name} {value} out of range {min}..{max}"))]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Parse one inbound line (without its terminator).
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(rest) = line.strip_prefix("SET:") {
        parse_set(line, rest)
    } else if let Some(rest) = line.strip_prefix("CMD:") {
        parse_cmd(line, rest)
    } else {
        Err(CommandError::Unknown {
            line: line.to_string(),
        })
    }
}

fn parse_set(line: &str, rest: &str) -> Result<Command, CommandError> {
    let (key, value) = rest.split_once(':').ok_or(CommandError::MissingArgument {
        line: line.to_string(),
    })?;
    match key {
        "loclen" => {
            let n = int_in_range("loclen", value, 6, 10)? as u8;
            if n % 2 != 0 {
                return Err(CommandError::BadValue {
                    name: "loclen",
                    value: value.to_string(),
                });
            }
            Ok(Command::SetLocatorLength(n))
        }
        "decmode" => {
            let n = int_in_range("decmode", value, 0, 2)? as u8;
            Ok(Command::SetDecodeMode(DecodeMode::from_index(n).unwrap()))
        }
        "txadv" => Ok(Command::SetTxAdvance(
            int_in_range("txadv", value, 0, 999)? as u16,
        )),
        "rxret" => Ok(Command::SetRxRetard(
            int_in_range("rxret", value, 0, 999)? as u16,
        )),
        "halfrate" => Ok(Command::SetHalfRate(
            int_in_range("halfrate", value, 0, 1)? == 1,
        )),
        "morsewpm" => Ok(Command::SetMorseWpm(
            int_in_range("morsewpm", value, 5, 40)? as u8,
        )),
        "confidence" => {
            let v: f32 = value.parse().map_err(|_| CommandError::BadValue {
                name: "confidence",
                value: value.to_string(),
            })?;
            if !(0.0..=1.0).contains(&v) {
                return Err(CommandError::BadValue {
                    name: "confidence",
                    value: value.to_string(),
                });
            }
            Ok(Command::SetConfidence(v))
        }
        "app" => {
            let n = int_in_range("app", value, 0, 3)? as u8;
            Ok(Command::SetApp(AppMode::from_index(n).unwrap()))
        }
        "msg" => {
            let (slot, text) = value.split_once(':').ok_or(CommandError::MissingArgument {
                line: line.to_string(),
            })?;
            let slot = int_in_range("msg slot", slot, 0, 9)? as u8;
            Ok(Command::SetMessage {
                slot,
                text: text.to_string(),
            })
        }
        _ => Err(CommandError::Unknown {
            line: line.to_string(),
        }),
    }
}

fn parse_cmd(line: &str, rest: &str) -> Result<Command, CommandError> {
    match rest {
        "tx" => return Ok(Command::Tx),
        "rx" => return Ok(Command::Rx),
        "dashes" => return Ok(Command::Dashes),
        "ident" => return Ok(Command::Ident),
        "clear" => return Ok(Command::Clear),
        "reboot" => return Ok(Command::Reboot),
        _ => {}
    }
    if let Some(slot) = rest.strip_prefix("txmsg:") {
        let slot = int_in_range("txmsg slot", slot, 0, 9)? as u8;
        Ok(Command::TxMessage(slot))
    } else if let Some(text) = rest.strip_prefix("morsetx:") {
        if text.is_empty() {
            return Err(CommandError::MissingArgument {
                line: line.to_string(),
            });
        }
        Ok(Command::MorseTx(text.to_string()))
    } else {
        Err(CommandError::Unknown {
            line: line.to_string(),
        })
    }
}

fn int_in_range(name: &'static str, value: &str, min: i64, max: i64) -> Result<i64, CommandError> {
    let n: i64 = value.parse().map_err(|_| CommandError::BadValue {
        name,
        value: value.to_string(),
    })?;
    if n < min || n > max {
        return Err(CommandError::OutOfRange {
            name,
            value: n,
            min,
            max,
        });
    }
    Ok(n)
}

/// Apply a `SET:` command to the settings record. Returns `true` when the
/// change requires a DSP engine reboot.
pub fn apply(settings: &mut Settings, command: &Command) -> bool {
    match command {
        Command::SetLocatorLength(n) => settings.locator_length = *n,
        Command::SetDecodeMode(mode) => settings.decode_mode = *mode,
        Command::SetTxAdvance(ms) => settings.tx_advance_ms = *ms,
        Command::SetRxRetard(ms) => settings.rx_retard_ms = *ms,
        Command::SetHalfRate(on) => settings.half_rate = *on,
        Command::SetMorseWpm(wpm) => settings.morse_wpm = *wpm,
        Command::SetConfidence(v) => settings.confidence_threshold = *v,
        Command::SetApp(app) => {
            settings.app = *app;
            return true;
        }
        Command::SetMessage { slot, text } => {
            settings.message_slots[*slot as usize] = text.clone();
        }
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_commands_parse() {
        assert_eq!(parse("SET:loclen:8").unwrap(), Command::SetLocatorLength(8));
        assert_eq!(
            parse("SET:decmode:2").unwrap(),
            Command::SetDecodeMode(DecodeMode::Rainscatter)
        );
        assert_eq!(parse("SET:txadv:250").unwrap(), Command::SetTxAdvance(250));
        assert_eq!(parse("SET:rxret:0").unwrap(), Command::SetRxRetard(0));
        assert_eq!(parse("SET:halfrate:1").unwrap(), Command::SetHalfRate(true));
        assert_eq!(parse("SET:morsewpm:20").unwrap(), Command::SetMorseWpm(20));
        assert_eq!(
            parse("SET:confidence:0.25").unwrap(),
            Command::SetConfidence(0.25)
        );
        assert_eq!(
            parse("SET:app:3").unwrap(),
            Command::SetApp(AppMode::Morse)
        );
        assert_eq!(
            parse("SET:msg:4:CQ TEST \u{86}").unwrap(),
            Command::SetMessage {
                slot: 4,
                text: "CQ TEST \u{86}".to_string()
            }
        );
    }

    #[test]
    fn test_cmd_commands_parse() {
        assert_eq!(parse("CMD:tx").unwrap(), Command::Tx);
        assert_eq!(parse("CMD:rx").unwrap(), Command::Rx);
        assert_eq!(parse("CMD:txmsg:3").unwrap(), Command::TxMessage(3));
        assert_eq!(parse("CMD:dashes").unwrap(), Command::Dashes);
        assert_eq!(
            parse("CMD:morsetx:CQ DE G4EML").unwrap(),
            Command::MorseTx("CQ DE G4EML".to_string())
        );
        assert_eq!(parse("CMD:ident").unwrap(), Command::Ident);
        assert_eq!(parse("CMD:clear").unwrap(), Command::Clear);
        assert_eq!(parse("CMD:reboot").unwrap(), Command::Reboot);
    }

    #[test]
    fn test_out_of_range_values() {
        assert!(matches!(
            parse("SET:txadv:1000"),
            Err(CommandError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse("SET:morsewpm:4"),
            Err(CommandError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse("SET:confidence:1.5"),
            Err(CommandError::BadValue { .. })
        ));
        assert!(matches!(
            parse("SET:loclen:7"),
            Err(CommandError::BadValue { .. })
        ));
        assert!(matches!(
            parse("CMD:txmsg:12"),
            Err(CommandError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(parse("PING").is_err());
        assert!(parse("SET:loclen").is_err());
        assert!(parse("SET:bogus:1").is_err());
        assert!(parse("CMD:bogus").is_err());
        assert!(parse("CMD:morsetx:").is_err());
        assert!(matches!(
            parse("SET:decmode:x"),
            Err(CommandError::BadValue { .. })
        ));
    }

    #[test]
    fn test_apply_updates_settings() {
        let mut settings = Settings::default();
        assert!(!apply(&mut settings, &Command::SetHalfRate(true)));
        assert!(settings.half_rate);
        assert!(!apply(
            &mut settings,
            &Command::SetMessage {
                slot: 2,
                text: "HELLO".to_string()
            }
        ));
        assert_eq!(settings.message_slots[2], "HELLO");
        // Mode change demands a reboot
        assert!(apply(&mut settings, &Command::SetApp(AppMode::Pi4)));
        assert_eq!(settings.app, AppMode::Pi4);
    }

    #[test]
    fn test_trailing_newline_tolerated() {
        assert_eq!(parse("CMD:tx\n").unwrap(), Command::Tx);
    }
}
