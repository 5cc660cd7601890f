//! The enumerated voice set.
//!
//! Each named voice maps to an opaque identifier understood by the speech
//! provider behind the workflow. Membership in this set is a precondition
//! for accepting a generation request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A named voice from the fixed voice set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    Rachel,
    Domi,
    Bella,
    Antoni,
    Elli,
    Josh,
    Arnold,
    Adam,
    Sam,
}

/// Submitted voice name is not in the enumerated set.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid voice: {0}")]
pub struct VoiceParseError(pub String);

impl Voice {
    /// All valid voices, in presentation order.
    pub const ALL: [Voice; 9] = [
        Voice::Rachel,
        Voice::Domi,
        Voice::Bella,
        Voice::Antoni,
        Voice::Elli,
        Voice::Josh,
        Voice::Arnold,
        Voice::Adam,
        Voice::Sam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Rachel => "Rachel",
            Voice::Domi => "Domi",
            Voice::Bella => "Bella",
            Voice::Antoni => "Antoni",
            Voice::Elli => "Elli",
            Voice::Josh => "Josh",
            Voice::Arnold => "Arnold",
            Voice::Adam => "Adam",
            Voice::Sam => "Sam",
        }
    }

    /// Opaque voice identifier used by the external speech provider.
    pub fn provider_id(&self) -> &'static str {
        match self {
            Voice::Rachel => "21m00Tcm4TlvDq8ikWAM",
            Voice::Domi => "AZnzlk1XvdvUeBnXmlld",
            Voice::Bella => "EXAVITQu4vr4xnSDxMaL",
            Voice::Antoni => "ErXwobaYiN019PkySvjV",
            Voice::Elli => "MF3mGyEYCl7XYWbV9V6O",
            Voice::Josh => "TxGEqnHWrfWFTfGW9XjX",
            Voice::Arnold => "VR6AewLTigWG4xSOukaG",
            Voice::Adam => "pNInz6obpgDQGcFmaJgB",
            Voice::Sam => "yoZ06aMxZJJ28mfd3POQ",
        }
    }
}

impl FromStr for Voice {
    type Err = VoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Voice::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| VoiceParseError(s.to_string()))
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
