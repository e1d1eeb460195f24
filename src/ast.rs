use indexmap::IndexSet;

use crate::error::{Error, Result};
use crate::escape::escape_literals;
use crate::parser::{classify, Scanner, Shape};

/// Syntactic kind of a term, kept alongside its text so wrapping decisions
/// never have to re-read rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Empty,
    /// A single atom: one character, an escape, a flag or a backreference.
    Literal,
    /// Two or more atoms in a row.
    Characters,
    /// A non-capturing group `(?:...)`.
    Group,
    /// A capturing group `(...)`.
    Capture,
    /// Branches joined by a bare `|`.
    Alternation,
    /// A quantified term.
    Repeat,
    /// A lookahead assertion.
    FollowedBy,
    /// A bracketed set.
    CharacterSet,
}

impl Kind {
    /// Whether a quantifier placed right after the term would apply to only
    /// part of it.
    pub fn needs_wrap_to_quantify(self) -> bool {
        matches!(
            self,
            Kind::Characters | Kind::Alternation | Kind::Repeat | Kind::FollowedBy
        )
    }

    fn from_raw(text: &str) -> Kind {
        if Scanner::new(text).scan().top_level_bar {
            return Kind::Alternation;
        }
        match classify(text) {
            Shape::Empty => Kind::Empty,
            Shape::SingleCharacter => Kind::Literal,
            Shape::ModifiedTerm => Kind::Repeat,
            Shape::CharacterSet => Kind::CharacterSet,
            Shape::ClosedGroup if text.starts_with("(?=") || text.starts_with("(?!") => {
                Kind::FollowedBy
            }
            Shape::ClosedGroup if text.starts_with("(?:") => Kind::Group,
            Shape::ClosedGroup | Shape::Alternation | Shape::Opaque => Kind::Characters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    Text(String),
    /// Rendered as `\N`, N being the position of the named capture at
    /// render time.
    Backref(String),
}

/// One already-wrapped piece of pattern plus its capture bookkeeping.
///
/// Terms are values: appending one to a builder, or using it in several
/// places, copies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub(crate) pieces: Vec<Piece>,
    pub(crate) kind: Kind,
    /// Capture names introduced by this term, in order of their opening
    /// parenthesis.
    pub(crate) captures: IndexSet<String>,
    /// Capture names this term refers back to.
    pub(crate) backrefs: IndexSet<String>,
}

impl Term {
    pub fn empty() -> Self {
        Self {
            pieces: Vec::new(),
            kind: Kind::Empty,
            captures: IndexSet::new(),
            backrefs: IndexSet::new(),
        }
    }

    pub(crate) fn text(text: impl Into<String>, kind: Kind) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::empty();
        }
        Self {
            pieces: vec![Piece::Text(text)],
            kind,
            ..Self::empty()
        }
    }

    /// Escaped literal text: one character is a `Literal`, more are
    /// `Characters`.
    pub(crate) fn escaped(text: &str) -> Self {
        let kind = match text.chars().count() {
            0 => Kind::Empty,
            1 => Kind::Literal,
            _ => Kind::Characters,
        };
        Self::text(escape_literals(text), kind)
    }

    /// Pre-existing pattern text, tagged by the classifier.
    pub(crate) fn raw(text: &str) -> Self {
        Self::text(text, Kind::from_raw(text))
    }

    pub(crate) fn backref(name: &str) -> Self {
        let mut backrefs = IndexSet::new();
        backrefs.insert(name.to_owned());
        Self {
            pieces: vec![Piece::Backref(name.to_owned())],
            kind: Kind::Literal,
            captures: IndexSet::new(),
            backrefs,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.kind == Kind::Empty
    }

    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.captures.iter().map(String::as_str)
    }

    pub fn backref_names(&self) -> impl Iterator<Item = &str> {
        self.backrefs.iter().map(String::as_str)
    }

    fn push_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.pieces.last_mut() {
            Some(Piece::Text(last)) => last.push_str(text),
            _ => self.pieces.push(Piece::Text(text.to_owned())),
        }
    }

    fn push_piece(&mut self, piece: Piece) {
        match piece {
            Piece::Text(text) => self.push_str(&text),
            backref => self.pieces.push(backref),
        }
    }

    /// Appends `other`'s pieces and bookkeeping without touching `kind`.
    fn extend(&mut self, other: Term) {
        for piece in other.pieces {
            self.push_piece(piece);
        }
        self.captures.extend(other.captures);
        self.backrefs.extend(other.backrefs);
    }

    /// Surrounds the term with `open` and `close`.
    pub(crate) fn wrapped(self, open: &str, close: &str, kind: Kind) -> Self {
        let mut out = Term {
            kind,
            captures: IndexSet::new(),
            backrefs: IndexSet::new(),
            pieces: Vec::new(),
        };
        out.push_str(open);
        out.extend(self);
        out.push_str(close);
        out
    }

    /// Appends a quantifier, wrapping first when it would bind to only part
    /// of the term.
    pub(crate) fn quantified(self, quantifier: &str) -> Self {
        let mut term = if self.kind.needs_wrap_to_quantify() {
            self.wrapped("(?:", ")", Kind::Group)
        } else {
            self
        };
        term.push_str(quantifier);
        term.kind = Kind::Repeat;
        term
    }

    /// Turns the term into a capturing group named `name`.
    ///
    /// A non-capturing group is converted in place (`(?:ab)` → `(ab)`)
    /// instead of gaining another level of parentheses.
    pub(crate) fn captured(mut self, name: String) -> Self {
        let converted = self.kind == Kind::Group
            && match self.pieces.first_mut() {
                Some(Piece::Text(first)) if first.starts_with("(?:") => {
                    first.replace_range(..3, "(");
                    true
                }
                _ => false,
            };
        let mut term = if converted {
            self.kind = Kind::Capture;
            self
        } else {
            self.wrapped("(", ")", Kind::Capture)
        };
        // The new group opens before every group inside it.
        let mut captures = IndexSet::with_capacity(term.captures.len() + 1);
        captures.insert(name);
        captures.extend(term.captures);
        term.captures = captures;
        term
    }

    /// Concatenates terms in order. An alternation with a neighbour on
    /// either side is wrapped in a non-capturing group.
    pub(crate) fn concat(terms: impl IntoIterator<Item = Term>) -> Self {
        let mut terms: Vec<Term> = terms.into_iter().filter(|t| !t.is_empty()).collect();
        if terms.len() <= 1 {
            return terms.pop().unwrap_or_else(Term::empty);
        }
        let mut out = Term {
            kind: Kind::Characters,
            ..Term::empty()
        };
        for term in terms {
            if term.kind == Kind::Alternation {
                out.extend(term.wrapped("(?:", ")", Kind::Group));
            } else {
                out.extend(term);
            }
        }
        out
    }

    /// Joins branches with `|`. A single branch is returned as is.
    pub(crate) fn alternate(branches: impl IntoIterator<Item = Term>) -> Self {
        let mut branches: Vec<Term> = branches.into_iter().collect();
        if branches.len() <= 1 {
            return branches.pop().unwrap_or_else(Term::empty);
        }
        let mut out = Term {
            kind: Kind::Alternation,
            ..Term::empty()
        };
        for (index, branch) in branches.into_iter().enumerate() {
            if index > 0 {
                out.push_str("|");
            }
            out.extend(branch);
        }
        out
    }

    /// Renders the term, numbering backreferences with `index_of`.
    pub(crate) fn render_with<F>(&self, index_of: F) -> Result<String>
    where
        F: Fn(&str) -> Option<usize>,
    {
        let mut out = String::new();
        let mut pieces = self.pieces.iter().peekable();
        while let Some(piece) = pieces.next() {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Backref(name) => {
                    let index = index_of(name).ok_or_else(|| Error::UnknownGroup(name.clone()))?;
                    // `\1` followed by `0` would read as `\10`.
                    let digit_follows = matches!(
                        pieces.peek(),
                        Some(Piece::Text(next)) if next.starts_with(|c: char| c.is_ascii_digit())
                    );
                    if digit_follows {
                        out.push_str(&format!(r"(?:\{index})"));
                    } else {
                        out.push_str(&format!(r"\{index}"));
                    }
                }
            }
        }
        Ok(out)
    }

    /// Renders the term on its own, numbering backreferences by its own
    /// captures.
    pub fn to_pattern(&self) -> Result<String> {
        self.render_with(|name| self.captures.get_index_of(name).map(|i| i + 1))
    }
}

/// Inline argument to `sequence`, `either`, `followed_by` and friends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Plain text, escaped as literals.
    Literals(String),
    /// A closed sub-pattern.
    Term(Term),
}

impl Arg {
    pub(crate) fn into_term(self) -> Term {
        match self {
            Arg::Literals(text) => Term::escaped(&text),
            Arg::Term(term) => term,
        }
    }
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Arg::Literals(text.to_owned())
    }
}

impl From<String> for Arg {
    fn from(text: String) -> Self {
        Arg::Literals(text)
    }
}

impl From<char> for Arg {
    fn from(ch: char) -> Self {
        Arg::Literals(ch.to_string())
    }
}

impl From<Term> for Arg {
    fn from(term: Term) -> Self {
        Arg::Term(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(term: &Term) -> String {
        term.to_pattern().unwrap()
    }

    #[test]
    fn escaped_text_kinds() {
        assert_eq!(Term::escaped("").kind(), Kind::Empty);
        assert_eq!(Term::escaped("?").kind(), Kind::Literal);
        assert_eq!(Term::escaped("ab").kind(), Kind::Characters);
        assert_eq!(render(&Term::escaped("a.b")), r"a\.b");
    }

    #[test]
    fn quantifier_wraps_multi_atom_terms() {
        assert_eq!(render(&Term::escaped("a").quantified("*")), "a*");
        assert_eq!(render(&Term::escaped("abc").quantified("*")), "(?:abc)*");
        let twice = Term::escaped("a").quantified("*").quantified("?");
        assert_eq!(render(&twice), "(?:a*)?");
    }

    #[test]
    fn concat_wraps_alternation_with_neighbours() {
        let alt = Term::alternate([Term::escaped("b"), Term::escaped("c")]);
        assert_eq!(render(&alt), "b|c");
        let seq = Term::concat([Term::escaped("a"), alt.clone(), Term::escaped("d")]);
        assert_eq!(render(&seq), "a(?:b|c)d");
        let alone = Term::concat([Term::empty(), alt]);
        assert_eq!(alone.kind(), Kind::Alternation);
    }

    #[test]
    fn capture_converts_non_capturing_group() {
        let group = Term::raw("(?:ab)");
        assert_eq!(group.kind(), Kind::Group);
        assert_eq!(render(&group.captured("g".into())), "(ab)");
        let alt = Term::alternate([Term::escaped("abc"), Term::escaped("def")]);
        assert_eq!(render(&alt.captured("g".into())), "(abc|def)");
    }

    #[test]
    fn backrefs_follow_capture_order() {
        let inner = Term::concat([
            Term::escaped("lit").captured("group".into()),
            Term::backref("group"),
        ]);
        assert_eq!(render(&inner), r"(lit)\1");
        let outer = inner.captured("outer".into());
        assert_eq!(render(&outer), r"((lit)\2)");
        assert_eq!(outer.capture_names().collect::<Vec<_>>(), ["outer", "group"]);
    }

    #[test]
    fn backref_before_digit_is_isolated() {
        let term = Term::concat([
            Term::escaped("a").captured("x".into()),
            Term::backref("x"),
            Term::escaped("0"),
        ]);
        assert_eq!(render(&term), r"(a)(?:\1)0");
    }

    #[test]
    fn raw_kinds() {
        assert_eq!(Term::raw("a|b").kind(), Kind::Alternation);
        assert_eq!(Term::raw("a|b*").kind(), Kind::Alternation);
        assert_eq!(Term::raw("[ab]").kind(), Kind::CharacterSet);
        assert_eq!(Term::raw("(?=a)").kind(), Kind::FollowedBy);
        assert_eq!(Term::raw("ab+").kind(), Kind::Repeat);
        assert_eq!(Term::raw("abc").kind(), Kind::Characters);
    }
}
