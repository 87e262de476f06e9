//! The TCP command line grammar (§4.F). Parsing only — turning a `Command`
//! into bus bytes, and matching a reply to one, lives in [`crate::connection`].

use crate::error::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HkCircuit {
    Hk1,
    Hk2,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GetOrSet<T> {
    Get,
    Set(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermDesinfectAction {
    Get,
    Enable,
    Disable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZirkPumpAction {
    Get,
    Set(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetErrors { offset: u32 },
    HkDayTemp { circuit: HkCircuit, action: GetOrSet<f32> },
    HkNightTemp { circuit: HkCircuit, action: GetOrSet<f32> },
    HkKennlinie { circuit: HkCircuit, action: GetOrSet<(u8, u8, u8)> },
    WwTemp { action: GetOrSet<f32> },
    ThermDesinfect(ThermDesinfectAction),
    ZirkPump(ZirkPumpAction),
}

/// Parse one line of client input (already stripped of its trailing `\n`).
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (verb, rest) = tokens.split_first().ok_or(CommandError::InvalidCmd)?;
    match *verb {
        "geterrors" => {
            let [offset] = rest else { return Err(CommandError::InvalidArgs) };
            Ok(Command::GetErrors { offset: offset.parse().map_err(|_| CommandError::InvalidArgs)? })
        }
        "hk1" => parse_hk(HkCircuit::Hk1, rest),
        "hk2" => parse_hk(HkCircuit::Hk2, rest),
        "ww" => parse_ww(rest),
        "thermdesinfect" => parse_thermdesinfect(rest),
        "zirkpump" => parse_zirkpump(rest),
        _ => Err(CommandError::InvalidCmd),
    }
}

fn parse_get_or_set_f32(rest: &[&str]) -> Result<GetOrSet<f32>, CommandError> {
    match rest {
        ["get"] => Ok(GetOrSet::Get),
        ["set", value] => Ok(GetOrSet::Set(value.parse().map_err(|_| CommandError::InvalidArgs)?)),
        _ => Err(CommandError::InvalidArgs),
    }
}

fn parse_hk(circuit: HkCircuit, rest: &[&str]) -> Result<Command, CommandError> {
    let (sub_verb, tail) = rest.split_first().ok_or(CommandError::InvalidArgs)?;
    match *sub_verb {
        "daytemp" => Ok(Command::HkDayTemp { circuit, action: parse_get_or_set_f32(tail)? }),
        "nighttemp" => Ok(Command::HkNightTemp { circuit, action: parse_get_or_set_f32(tail)? }),
        "kennlinie" => {
            let action = match tail {
                ["get"] => GetOrSet::Get,
                ["set", low, medium, high] => GetOrSet::Set((
                    low.parse().map_err(|_| CommandError::InvalidArgs)?,
                    medium.parse().map_err(|_| CommandError::InvalidArgs)?,
                    high.parse().map_err(|_| CommandError::InvalidArgs)?,
                )),
                _ => return Err(CommandError::InvalidArgs),
            };
            Ok(Command::HkKennlinie { circuit, action })
        }
        _ => Err(CommandError::InvalidCmd),
    }
}

fn parse_ww(rest: &[&str]) -> Result<Command, CommandError> {
    let (sub_verb, tail) = rest.split_first().ok_or(CommandError::InvalidArgs)?;
    match *sub_verb {
        "temp" => Ok(Command::WwTemp { action: parse_get_or_set_f32(tail)? }),
        _ => Err(CommandError::InvalidCmd),
    }
}

fn parse_thermdesinfect(rest: &[&str]) -> Result<Command, CommandError> {
    match rest {
        ["get"] => Ok(Command::ThermDesinfect(ThermDesinfectAction::Get)),
        ["enable"] => Ok(Command::ThermDesinfect(ThermDesinfectAction::Enable)),
        ["disable"] => Ok(Command::ThermDesinfect(ThermDesinfectAction::Disable)),
        _ => Err(CommandError::InvalidArgs),
    }
}

fn parse_zirkpump(rest: &[&str]) -> Result<Command, CommandError> {
    match rest {
        ["get"] => Ok(Command::ZirkPump(ZirkPumpAction::Get)),
        ["set", byte] => Ok(Command::ZirkPump(ZirkPumpAction::Set(
            byte.parse().map_err(|_| CommandError::InvalidArgs)?,
        ))),
        _ => Err(CommandError::InvalidArgs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_verb_is_invalid_cmd() {
        assert!(matches!(parse("frobnicate"), Err(CommandError::InvalidCmd)));
    }

    #[test]
    fn geterrors_needs_one_offset() {
        assert!(matches!(parse("geterrors"), Err(CommandError::InvalidArgs)));
        assert_eq!(parse("geterrors 5").unwrap(), Command::GetErrors { offset: 5 });
    }

    #[test]
    fn hk_daytemp_set_parses_float() {
        let cmd = parse("hk1 daytemp set 21.5").unwrap();
        assert_eq!(
            cmd,
            Command::HkDayTemp { circuit: HkCircuit::Hk1, action: GetOrSet::Set(21.5) }
        );
    }

    #[test]
    fn hk_daytemp_set_bad_float_is_invalid_args() {
        assert!(matches!(parse("hk1 daytemp set abc"), Err(CommandError::InvalidArgs)));
    }

    #[test]
    fn thermdesinfect_enable() {
        assert_eq!(
            parse("thermdesinfect enable").unwrap(),
            Command::ThermDesinfect(ThermDesinfectAction::Enable)
        );
    }

    #[test]
    fn zirkpump_set_parses_byte() {
        assert_eq!(
            parse("zirkpump set 17").unwrap(),
            Command::ZirkPump(ZirkPumpAction::Set(17))
        );
    }
}
