use std::{error::Error, fmt};

use backtrack_core::StepInput;

/// One action taken against the session per script token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScriptAction {
    /// Advance one frame with the embedded input.
    Step(StepInput),
    /// Request a rewind.
    Rewind,
}

/// Parses a whitespace-separated input script into session actions.
///
/// Tokens: `.` idles one frame, `L`/`R`/`J` hold left/right/jump and may
/// be combined (`RJ`), `!` rewinds. Any token may carry a `*N` repeat
/// suffix, so `R*30 RJ !` walks right for thirty frames, jumps while
/// walking, then rewinds.
pub(crate) fn parse_script(text: &str) -> Result<Vec<ScriptAction>, ScriptError> {
    let mut actions = Vec::new();
    for token in text.split_whitespace() {
        let (action, count) = parse_token(token)?;
        for _ in 0..count {
            actions.push(action);
        }
    }
    Ok(actions)
}

fn parse_token(token: &str) -> Result<(ScriptAction, usize), ScriptError> {
    let (head, count) = match token.split_once('*') {
        Some((head, count)) => {
            let count = count
                .parse::<usize>()
                .ok()
                .filter(|count| *count > 0)
                .ok_or_else(|| ScriptError::InvalidRepeat {
                    token: token.to_owned(),
                })?;
            (head, count)
        }
        None => (token, 1),
    };
    if head.is_empty() {
        return Err(ScriptError::EmptyToken {
            token: token.to_owned(),
        });
    }

    let action = match head {
        "!" => ScriptAction::Rewind,
        "." => ScriptAction::Step(StepInput::idle()),
        _ => {
            let mut input = StepInput::idle();
            for symbol in head.chars() {
                match symbol {
                    'L' => input.left = true,
                    'R' => input.right = true,
                    'J' => input.jump = true,
                    other => {
                        return Err(ScriptError::UnknownSymbol {
                            symbol: other,
                            token: token.to_owned(),
                        })
                    }
                }
            }
            ScriptAction::Step(input)
        }
    };
    Ok((action, count))
}

/// Errors produced while parsing an input script.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ScriptError {
    /// A token consisted only of a repeat suffix.
    EmptyToken {
        /// The offending token as written.
        token: String,
    },
    /// A repeat suffix was not a positive integer.
    InvalidRepeat {
        /// The offending token as written.
        token: String,
    },
    /// A token contained a symbol outside the script alphabet.
    UnknownSymbol {
        /// The unsupported symbol.
        symbol: char,
        /// The offending token as written.
        token: String,
    },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyToken { token } => {
                write!(f, "script token '{token}' has no action before its repeat")
            }
            Self::InvalidRepeat { token } => {
                write!(f, "script token '{token}' needs a positive repeat count")
            }
            Self::UnknownSymbol { symbol, token } => {
                write!(f, "script token '{token}' contains unsupported symbol '{symbol}'")
            }
        }
    }
}

impl Error for ScriptError {}
