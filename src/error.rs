//! Errors raised while building or running a pattern.

use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Operators that need a previous fragment to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Capture,
    Repeat,
    Optional,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Capture => "capture",
            Operation::Repeat => "repeat",
            Operation::Optional => "make optional",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `any_from`/`none_from` bounds are out of order.
    #[error("invalid character range `{from}`-`{to}`: start is after end")]
    InvalidRange { from: char, to: char },

    #[error("invalid repeat bounds: max {max} is less than min {min}")]
    InvalidRepeat { min: u32, max: u32 },

    #[error("unknown flag code `{0}`")]
    UnknownFlag(char),

    #[error("flag `{0}` cannot be used inside a character set")]
    FlagNotInSet(char),

    #[error("character set is empty")]
    EmptySet,

    #[error("raw pattern `{pattern}` cannot be used: {reason}")]
    InvalidRaw { pattern: String, reason: String },

    #[error("nothing to {0}")]
    NothingTo(Operation),

    #[error("cannot {0} twice in a row")]
    Repeated(Operation),

    #[error("`{operation}` is not available inside a {scope}")]
    Unsupported {
        operation: &'static str,
        scope: &'static str,
    },

    #[error("no nested construct is open")]
    NothingToClose,

    #[error("{0} nested construct(s) still open")]
    Unclosed(usize),

    #[error("capture name `{0}` is already in use")]
    DuplicateCapture(String),

    #[error("capture name `match` is reserved for the whole match")]
    ReservedCapture,

    #[error("unrecognized group `{0}`")]
    UnknownGroup(String),

    #[error("unrecognized macro `{0}`")]
    UnknownMacro(String),

    #[error("regex engine rejected `{pattern}`")]
    Engine {
        pattern: String,
        #[source]
        source: fancy_regex::Error,
    },
}
