use crate::error::{Error, Result};

/// Character-class shorthands, anchors and control characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Dot,
    Start,
    End,
    Digit,
    NonDigit,
    Whitespace,
    NonWhitespace,
    Word,
    NonWord,
    WordBoundary,
    NonWordBoundary,
    Tab,
    Newline,
    CarriageReturn,
    FormFeed,
    VerticalTab,
    Null,
}

impl Flag {
    pub const ALL: [Flag; 17] = [
        Flag::Dot,
        Flag::Start,
        Flag::End,
        Flag::Digit,
        Flag::NonDigit,
        Flag::Whitespace,
        Flag::NonWhitespace,
        Flag::Word,
        Flag::NonWord,
        Flag::WordBoundary,
        Flag::NonWordBoundary,
        Flag::Tab,
        Flag::Newline,
        Flag::CarriageReturn,
        Flag::FormFeed,
        Flag::VerticalTab,
        Flag::Null,
    ];

    /// Single-character code accepted by `flags("...")`.
    pub fn code(self) -> char {
        match self {
            Flag::Dot => '.',
            Flag::Start => '^',
            Flag::End => '$',
            Flag::Digit => 'd',
            Flag::NonDigit => 'D',
            Flag::Whitespace => 's',
            Flag::NonWhitespace => 'S',
            Flag::Word => 'w',
            Flag::NonWord => 'W',
            Flag::WordBoundary => 'b',
            Flag::NonWordBoundary => 'B',
            Flag::Tab => 't',
            Flag::Newline => 'n',
            Flag::CarriageReturn => 'r',
            Flag::FormFeed => 'f',
            Flag::VerticalTab => 'v',
            Flag::Null => '0',
        }
    }

    pub fn from_code(code: char) -> Result<Flag> {
        Flag::ALL
            .into_iter()
            .find(|flag| flag.code() == code)
            .ok_or(Error::UnknownFlag(code))
    }

    pub fn pattern(self) -> &'static str {
        match self {
            Flag::Dot => ".",
            Flag::Start => "^",
            Flag::End => "$",
            Flag::Digit => r"\d",
            Flag::NonDigit => r"\D",
            Flag::Whitespace => r"\s",
            Flag::NonWhitespace => r"\S",
            Flag::Word => r"\w",
            Flag::NonWord => r"\W",
            Flag::WordBoundary => r"\b",
            Flag::NonWordBoundary => r"\B",
            Flag::Tab => r"\t",
            Flag::Newline => r"\n",
            Flag::CarriageReturn => r"\r",
            Flag::FormFeed => r"\x0C",
            Flag::VerticalTab => r"\x0B",
            Flag::Null => r"\x00",
        }
    }

    /// Whether the flag means the same thing between `[` and `]`.
    pub fn allowed_in_set(self) -> bool {
        !matches!(
            self,
            Flag::Dot | Flag::Start | Flag::End | Flag::WordBoundary | Flag::NonWordBoundary
        )
    }
}

/// Parses a run of flag codes such as `"sd"`.
pub fn parse_codes(codes: &str) -> Result<Vec<Flag>> {
    codes.chars().map(Flag::from_code).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn codes_round_trip() {
        for flag in Flag::ALL {
            assert_eq!(Flag::from_code(flag.code()).unwrap(), flag);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(matches!(parse_codes("dx"), Err(Error::UnknownFlag('x'))));
        assert_eq!(parse_codes("sd").unwrap(), [Flag::Whitespace, Flag::Digit]);
    }

    #[test]
    fn every_pattern_compiles() {
        for flag in Flag::ALL {
            assert!(fancy_regex::Regex::new(flag.pattern()).is_ok(), "{flag:?}");
        }
    }
}
