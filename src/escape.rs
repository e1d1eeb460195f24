//! Escaping of characters that are special to the pattern language.

/// Metacharacters outside a character set.
pub const LITERAL_SPECIAL: &str = r"\^$.|?*+()[]{}";

/// Metacharacters inside a character set: everything above plus the range
/// dash, and `&`/`~` which form set operators (`&&`, `~~`) in the engine.
pub const SET_SPECIAL: &str = r"\^$.|?*+()[]{}-&~";

fn push_escaped(out: &mut String, ch: char, special: &str) {
    if special.contains(ch) {
        out.push('\\');
    }
    out.push(ch);
}

/// Escapes one character for a literal position.
///
/// - `a` → `a`
/// - `.` → `\.`
pub fn escape_literal(ch: char) -> String {
    let mut out = String::with_capacity(2);
    push_escaped(&mut out, ch, LITERAL_SPECIAL);
    out
}

/// Escapes one character for a position inside `[...]`.
///
/// - `-` → `\-`
pub fn escape_in_set(ch: char) -> String {
    let mut out = String::with_capacity(2);
    push_escaped(&mut out, ch, SET_SPECIAL);
    out
}

/// Escapes every character of `text` for a literal position.
pub fn escape_literals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        push_escaped(&mut out, ch, LITERAL_SPECIAL);
    }
    out
}

/// Escapes every character of `text` for a position inside `[...]`.
pub fn escape_set(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        push_escaped(&mut out, ch, SET_SPECIAL);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn plain_characters_pass_through() {
        assert_eq!(escape_literal('a'), "a");
        assert_eq!(escape_literal('-'), "-");
        assert_eq!(escape_in_set('a'), "a");
    }

    #[test]
    fn metacharacters_are_escaped() {
        assert_eq!(escape_literal('?'), r"\?");
        assert_eq!(escape_literal('\\'), r"\\");
        assert_eq!(escape_literals("a.b*"), r"a\.b\*");
    }

    #[test]
    fn dash_is_only_special_in_sets() {
        assert_eq!(escape_in_set('-'), r"\-");
        assert_eq!(escape_set("a-d"), r"a\-d");
        assert_eq!(escape_literals("a-d"), "a-d");
    }

    proptest! {
        #[test]
        fn escaped_metacharacter_matches_itself(index in 0..LITERAL_SPECIAL.len()) {
            let ch = LITERAL_SPECIAL.as_bytes()[index] as char;
            let re = fancy_regex::Regex::new(&format!("^{}$", escape_literal(ch))).unwrap();
            prop_assert!(re.is_match(&ch.to_string()).unwrap());
            prop_assert!(!re.is_match("x").unwrap());
        }

        #[test]
        fn escaped_set_member_matches_itself(index in 0..SET_SPECIAL.len()) {
            let ch = SET_SPECIAL.as_bytes()[index] as char;
            let re = fancy_regex::Regex::new(&format!("^[{}]$", escape_in_set(ch))).unwrap();
            prop_assert!(re.is_match(&ch.to_string()).unwrap());
        }

        #[test]
        fn escaped_text_matches_itself(text in "[ -~]{0,16}") {
            let re = fancy_regex::Regex::new(&format!("^{}$", escape_literals(&text))).unwrap();
            prop_assert!(re.is_match(&text).unwrap());
        }
    }
}
