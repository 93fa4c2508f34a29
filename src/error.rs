//! Error taxonomy for the world-simulation core.
//!
//! Recoverable conditions (missing templates, missing rooms, out-of-range
//! coordinates) never reach a caller as an `Err` — they're logged via
//! [`crate::logging::Logger`] and the operation returns `None`/`()`. The
//! variants below exist for the fatal conditions that indicate caller misuse
//! (these are the ones the spec says to "throw" on) and to give tests and
//! docs a single vocabulary for either case.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    OutOfBounds(String),
    EmptyName(String),
    UnknownTemplate(String),
    UnknownRoom(String),
    InvalidTemplateTypeForSlot(String),
    MissingArchetypeLookup(String),
    SerializeCurrency(String),
    HitTypeNotFound(String),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::OutOfBounds(m) => write!(f, "out of bounds: {m}"),
            WorldError::EmptyName(m) => write!(f, "empty name: {m}"),
            WorldError::UnknownTemplate(m) => write!(f, "unknown template: {m}"),
            WorldError::UnknownRoom(m) => write!(f, "unknown room: {m}"),
            WorldError::InvalidTemplateTypeForSlot(m) => {
                write!(f, "invalid template type for slot: {m}")
            }
            WorldError::MissingArchetypeLookup(m) => {
                write!(f, "missing archetype lookup: {m}")
            }
            WorldError::SerializeCurrency(m) => write!(f, "attempted to serialize currency: {m}"),
            WorldError::HitTypeNotFound(m) => write!(f, "hit type not found: {m}"),
        }
    }
}

impl std::error::Error for WorldError {}

pub type WorldResult<T> = Result<T, WorldError>;
