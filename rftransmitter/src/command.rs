/*!
Command dispatch from generic key/value maps.

Accepts `{"command": "transmit", "code": <integer>}` and answers with
`{"success": true}` or `{"error": "<message>"}`. Validation happens before
the transmitter is touched.
*/

use serde_json::{Map, Value};
use shared::{Code, CodeError};
use tracing::warn;

use crate::error::CommandError;
use crate::transmitter::Transmitter;

/// Key/value map used for both commands and responses
pub type CommandMap = Map<String, Value>;

/// A validated command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Transmit { code: Code },
}

impl Command {
    pub fn parse(map: &CommandMap) -> Result<Self, CommandError> {
        let name = map.get("command").ok_or(CommandError::MissingCommand)?;
        match name.as_str() {
            Some("transmit") => {
                let code = map.get("code").ok_or(CommandError::MissingCode)?;
                let raw = match (code.as_i64(), code.as_u64()) {
                    (Some(raw), _) => raw,
                    // Integral but wider than i64: a range error, not a type error
                    (None, Some(wide)) => {
                        return Err(CodeError::OutOfRange(wide.into()).into());
                    }
                    (None, None) => return Err(CommandError::InvalidCode(code.to_string())),
                };
                Ok(Self::Transmit {
                    code: Code::new(raw)?,
                })
            }
            Some(other) => Err(CommandError::UnsupportedCommand(other.to_string())),
            None => Err(CommandError::UnsupportedCommand(name.to_string())),
        }
    }
}

/// Validate and execute a command
pub fn dispatch(transmitter: &Transmitter, map: &CommandMap) -> Result<CommandMap, CommandError> {
    match Command::parse(map)? {
        Command::Transmit { code } => {
            transmitter.transmit(code)?;
            let mut response = CommandMap::new();
            response.insert("success".to_string(), Value::Bool(true));
            Ok(response)
        }
    }
}

/// Like [`dispatch`], with failures folded into an `error` response
pub fn respond(transmitter: &Transmitter, map: &CommandMap) -> CommandMap {
    dispatch(transmitter, map).unwrap_or_else(|e| {
        warn!("Command failed: {}", e);
        let mut response = CommandMap::new();
        response.insert("error".to_string(), Value::String(e.to_string()));
        response
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineBackend;
    use crate::testing::{FakeClock, RecordingLine, RecordingWaiter};
    use serde_json::json;
    use std::time::Duration;

    fn setup() -> (Transmitter, RecordingLine) {
        let clock = FakeClock::default();
        let line = RecordingLine::new(clock.clone());
        let transmitter = Transmitter::new(
            LineBackend::Owned(Box::new(line.clone())),
            Duration::from_micros(350),
            Box::new(RecordingWaiter::new(clock)),
        );
        (transmitter, line)
    }

    fn map(value: Value) -> CommandMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_transmit_command_succeeds() {
        let (transmitter, line) = setup();
        let response = respond(&transmitter, &map(json!({"command": "transmit", "code": 5})));
        assert_eq!(Value::Object(response), json!({"success": true}));
        assert_eq!(line.attempts(), 500);
    }

    #[test]
    fn test_missing_code_does_not_touch_line() {
        let (transmitter, line) = setup();
        let err = dispatch(&transmitter, &map(json!({"command": "transmit"}))).unwrap_err();
        assert!(matches!(err, CommandError::MissingCode));
        assert_eq!(line.attempts(), 0);
    }

    #[test]
    fn test_validation_errors() {
        let (transmitter, line) = setup();
        let cases = [
            (json!({}), "command is required"),
            (json!({"command": "receive"}), "unsupported command \"receive\""),
            (json!({"command": 3}), "unsupported command \"3\""),
            (json!({"command": "transmit", "code": "5"}), "code must be an integer, got \"5\""),
            (json!({"command": "transmit", "code": 1.5}), "code must be an integer, got 1.5"),
            (json!({"command": "transmit", "code": -1}), "code -1 is outside the 24-bit range 0..=16777215"),
            (json!({"command": "transmit", "code": 16777216}), "code 16777216 is outside the 24-bit range 0..=16777215"),
        ];

        for (command, expected) in cases {
            let response = respond(&transmitter, &map(command));
            assert_eq!(Value::Object(response), json!({"error": expected}));
        }
        assert_eq!(line.attempts(), 0);
    }

    #[test]
    fn test_oversized_unsigned_code_is_out_of_range() {
        let (transmitter, line) = setup();
        let err = dispatch(&transmitter, &map(json!({"command": "transmit", "code": u64::MAX}))).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Code(CodeError::OutOfRange(value)) if value == u64::MAX as i128
        ));
        assert_eq!(
            err.to_string(),
            "code 18446744073709551615 is outside the 24-bit range 0..=16777215"
        );
        assert_eq!(line.attempts(), 0);
    }

    #[test]
    fn test_line_error_is_reported() {
        let clock = FakeClock::default();
        let line = RecordingLine::failing_at(clock.clone(), 1);
        let transmitter = Transmitter::new(
            LineBackend::Owned(Box::new(line)),
            Duration::from_micros(350),
            Box::new(RecordingWaiter::new(clock)),
        );

        let err = dispatch(&transmitter, &map(json!({"command": "transmit", "code": 1}))).unwrap_err();
        assert!(matches!(err, CommandError::Transmit(_)));
        assert!(err.to_string().contains("/dev/mock-gpiochip"));
    }

    #[test]
    fn test_parse_command() {
        let command = Command::parse(&map(json!({"command": "transmit", "code": 1361}))).unwrap();
        assert_eq!(command, Command::Transmit { code: Code::new(1361).unwrap() });
    }
}
