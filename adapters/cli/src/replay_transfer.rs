#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

const REPLAY_DOMAIN: &str = "backtrack";
const REPLAY_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded replay payload.
pub(crate) const REPLAY_HEADER: &str = "backtrack:v1";
/// Delimiter separating the prefix, level index and payload.
const FIELD_DELIMITER: char = ':';

/// Shareable record of a scripted run and the outcome it produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ReplaySnapshot {
    /// Catalog index of the level the script was recorded against.
    pub level: u32,
    /// Input script in the token syntax accepted by the runner.
    pub script: String,
    /// Frame counter after the final script action.
    pub frames: u64,
    /// Frame the run won on, if it won.
    pub won_at: Option<u64>,
}

impl ReplaySnapshot {
    /// Encodes the replay into a single-line string suitable for sharing.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializableReplay {
            script: self.script.clone(),
            frames: self.frames,
            won_at: self.won_at,
        };
        let json = serde_json::to_vec(&payload).expect("replay serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{REPLAY_HEADER}:{}:{encoded}", self.level)
    }

    /// Decodes a replay from its string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, ReplayTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ReplayTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(ReplayTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(ReplayTransferError::MissingVersion)?;
        let level = parts.next().ok_or(ReplayTransferError::MissingLevel)?;
        let payload = parts.next().ok_or(ReplayTransferError::MissingPayload)?;

        if domain != REPLAY_DOMAIN {
            return Err(ReplayTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != REPLAY_VERSION {
            return Err(ReplayTransferError::UnsupportedVersion(version.to_owned()));
        }

        let level = level
            .trim()
            .parse::<u32>()
            .map_err(|_| ReplayTransferError::InvalidLevel(level.to_owned()))?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(ReplayTransferError::InvalidEncoding)?;
        let decoded: SerializableReplay =
            serde_json::from_slice(&bytes).map_err(ReplayTransferError::InvalidPayload)?;

        Ok(Self {
            level,
            script: decoded.script,
            frames: decoded.frames,
            won_at: decoded.won_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct SerializableReplay {
    script: String,
    frames: u64,
    won_at: Option<u64>,
}

/// Errors that can occur while decoding replay transfer strings.
#[derive(Debug)]
pub(crate) enum ReplayTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded replay.
    MissingPrefix,
    /// The encoded replay did not contain a version segment.
    MissingVersion,
    /// The encoded replay did not include a level index.
    MissingLevel,
    /// The encoded replay did not include the payload segment.
    MissingPayload,
    /// The encoded replay used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded replay used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The level index could not be parsed from the encoded replay.
    InvalidLevel(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for ReplayTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "replay string was empty"),
            Self::MissingPrefix => write!(f, "replay string is missing the prefix"),
            Self::MissingVersion => write!(f, "replay string is missing the version"),
            Self::MissingLevel => write!(f, "replay string is missing the level index"),
            Self::MissingPayload => write!(f, "replay string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "replay prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "replay version '{version}' is not supported")
            }
            Self::InvalidLevel(level) => {
                write!(f, "could not parse replay level index '{level}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode replay payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse replay payload: {error}")
            }
        }
    }
}

impl Error for ReplayTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}
