/// Coarse syntactic shape of already-rendered pattern text.
///
/// Only the outermost shape is recognized, which is enough to decide whether
/// the text must be wrapped before it is quantified, captured or concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Empty,
    /// One character or a two-character escape: `a`, `\.`, `\d`.
    SingleCharacter,
    /// Ends in an unescaped quantifier: `a*`, `(?:ab){2}`.
    ModifiedTerm,
    /// A single bracketed set spanning the whole text: `[abc]`.
    CharacterSet,
    /// A single parenthesized group spanning the whole text: `((ab){2})`.
    ClosedGroup,
    /// Contains a `|` outside every group and set: `ab|cd`.
    Alternation,
    /// Nothing above; callers must wrap defensively.
    Opaque,
}

/// Group and backreference counts found by [`Scanner::scan`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub top_level_bar: bool,
    pub capturing_groups: usize,
    pub backrefs: usize,
}

/// Walks pattern text while keeping track of escapes, sets and groups.
///
/// The scanner holds the pattern and the current position, like a parser,
/// but never builds a tree.
pub struct Scanner<'a> {
    pub pattern: &'a str,
    pub pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(pattern: &'a str) -> Self {
        Self { pattern, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn rest(&self) -> &'a str {
        &self.pattern[self.pos..]
    }

    /// Skips a character set, assuming the opening `[` was just consumed.
    ///
    /// A `]` directly after `[` or `[^` is a literal member; nested sets
    /// (`[a[bc]]`) are followed by depth.
    fn skip_set(&mut self) {
        if self.peek() == Some('^') {
            self.advance();
        }
        if self.peek() == Some(']') {
            self.advance();
        }
        let mut depth = 1;
        while let Some(ch) = self.advance() {
            match ch {
                '\\' => {
                    self.advance();
                }
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Returns the byte offset just past the group or set opened at
    /// `self.pos`, or `None` if it never closes.
    fn closing_of_first(&mut self) -> Option<usize> {
        match self.advance()? {
            '[' => {
                self.skip_set();
                Some(self.pos)
            }
            '(' => {
                let mut depth = 1;
                while let Some(ch) = self.advance() {
                    match ch {
                        '\\' => {
                            self.advance();
                        }
                        '[' => self.skip_set(),
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                return Some(self.pos);
                            }
                        }
                        _ => {}
                    }
                }
                None
            }
            _ => None,
        }
    }

    /// Scans the whole pattern for top-level alternation, capturing groups
    /// and backreferences.
    ///
    /// Examples:
    /// - `a|b`     → top-level bar
    /// - `(a|b)`   → one capturing group, no top-level bar
    /// - `\(a|b\)` → top-level bar (the parentheses are escaped)
    /// - `(a)\1`   → one capturing group, one backreference
    pub fn scan(mut self) -> Summary {
        let mut summary = Summary::default();
        let mut depth = 0usize;
        while let Some(ch) = self.advance() {
            match ch {
                '\\' => match self.advance() {
                    Some('1'..='9') => summary.backrefs += 1,
                    Some('k') if self.peek() == Some('<') => summary.backrefs += 1,
                    _ => {}
                },
                '[' => self.skip_set(),
                '(' => {
                    depth += 1;
                    let rest = self.rest();
                    let named = (rest.starts_with("?<") || rest.starts_with("?P<"))
                        && !rest.starts_with("?<=")
                        && !rest.starts_with("?<!");
                    if !rest.starts_with('?') || named {
                        summary.capturing_groups += 1;
                    }
                }
                ')' => depth = depth.saturating_sub(1),
                '|' if depth == 0 => summary.top_level_bar = true,
                _ => {}
            }
        }
        summary
    }
}

/// Checks whether `text` ends in a quantifier that is not escaped.
fn ends_in_quantifier(text: &str) -> bool {
    let Some(last) = text.chars().last() else {
        return false;
    };
    let body_end = match last {
        '*' | '+' | '?' => text.len() - 1,
        '}' => {
            let Some(open) = text.rfind('{') else {
                return false;
            };
            let bounds = &text[open + 1..text.len() - 1];
            let valid = !bounds.is_empty()
                && bounds.chars().all(|c| c.is_ascii_digit() || c == ',')
                && bounds.starts_with(|c: char| c.is_ascii_digit())
                && bounds.matches(',').count() <= 1;
            if !valid {
                return false;
            }
            open
        }
        _ => return false,
    };
    // An odd run of backslashes right before the quantifier escapes it.
    let backslashes = text[..body_end]
        .chars()
        .rev()
        .take_while(|&c| c == '\\')
        .count();
    body_end > 0 && backslashes % 2 == 0
}

/// Classifies rendered pattern text by its outermost shape.
///
/// Rules are tried in order:
/// - ``           → Empty
/// - `a`, `\d`    → SingleCharacter
/// - `a*`, `x{2}` → ModifiedTerm
/// - `[abc]`      → CharacterSet
/// - `(?:ab)`     → ClosedGroup
/// - `ab|cd`      → Alternation
/// - anything else → Opaque
pub fn classify(text: &str) -> Shape {
    if text.is_empty() {
        return Shape::Empty;
    }

    let mut chars = text.chars();
    let first = chars.next();
    let count = text.chars().count();
    if count == 1 || (count == 2 && first == Some('\\')) {
        return Shape::SingleCharacter;
    }

    if ends_in_quantifier(text) {
        return Shape::ModifiedTerm;
    }

    if matches!(first, Some('[') | Some('(')) {
        let close = Scanner::new(text).closing_of_first();
        if close == Some(text.len()) {
            return if first == Some('[') {
                Shape::CharacterSet
            } else {
                Shape::ClosedGroup
            };
        }
    }

    if Scanner::new(text).scan().top_level_bar {
        return Shape::Alternation;
    }

    Shape::Opaque
}
