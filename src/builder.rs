use std::iter;

use indexmap::{IndexMap, IndexSet};

use crate::ast::{Arg, Kind, Term};
use crate::config::Config;
use crate::error::{Error, Operation, Result};
use crate::escape::{escape_in_set, escape_set};
use crate::flags::{self, Flag};
use crate::matcher::Cache;
use crate::parser::Scanner;

/// Construct a node stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Scope {
    Root,
    Sequence,
    Either,
    Set { negated: bool },
    Lookahead { negated: bool },
    Macro { name: String },
}

impl Scope {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Scope::Root => "pattern",
            Scope::Sequence => "sequence",
            Scope::Either => "alternation",
            Scope::Set { .. } => "character set",
            Scope::Lookahead { .. } => "lookahead",
            Scope::Macro { .. } => "macro",
        }
    }
}

/// What the most recent operator did in a node. Used only to validate the
/// next operator, never to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LastOp {
    Empty,
    Literal,
    Capture,
    Repeat,
    Optional,
    FollowedBy,
    CharacterSet,
    Closed,
}

/// One level of nesting: the root, or an open sequence, alternation, set,
/// lookahead or macro body.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) scope: Scope,
    pub(crate) terms: Vec<Term>,
    pub(crate) macros: IndexMap<String, Term>,
    pub(crate) last: LastOp,
}

impl Node {
    pub(crate) fn new(scope: Scope) -> Self {
        Self {
            scope,
            terms: Vec::new(),
            macros: IndexMap::new(),
            last: LastOp::Empty,
        }
    }

    pub(crate) fn captures(&self) -> impl Iterator<Item = &String> {
        self.terms.iter().flat_map(|term| term.captures.iter())
    }

    /// Folds the node's terms into the single term its parent receives.
    /// A set must have at least one member by then.
    pub(crate) fn fold(&self) -> Result<Term> {
        let empty_set = matches!(self.scope, Scope::Set { .. })
            && self.terms.iter().all(Term::is_empty);
        if empty_set {
            return Err(Error::EmptySet);
        }
        Ok(self.assemble())
    }

    /// Renders the node as it stands, open sets included: an empty set
    /// shows as `[]`.
    pub(crate) fn assemble(&self) -> Term {
        let terms = self.terms.iter().cloned();
        match &self.scope {
            Scope::Root | Scope::Sequence | Scope::Macro { .. } => Term::concat(terms),
            Scope::Either => Term::alternate(terms),
            Scope::Set { negated } => {
                let open = if *negated { "[^" } else { "[" };
                Term::concat(terms).wrapped(open, "]", Kind::CharacterSet)
            }
            Scope::Lookahead { negated } => {
                let open = if *negated { "(?!" } else { "(?=" };
                Term::concat(terms).wrapped(open, ")", Kind::FollowedBy)
            }
        }
    }
}

/// Maps `repeat(min?, max?)` bounds onto quantifier syntax.
///
/// - `(_, _)` with no min → `*`
/// - `(0)` → `*`, `(1)` → `+`, `(n)` → `{n,}`
/// - `(n, n)` → `{n}`, `(n, m)` → `{n,m}`
pub(crate) fn quantifier(min: Option<u32>, max: Option<u32>) -> Result<String> {
    let min = min.unwrap_or(0);
    Ok(match max {
        None if min == 0 => "*".to_owned(),
        None if min == 1 => "+".to_owned(),
        None => format!("{{{min},}}"),
        Some(max) if max < min => return Err(Error::InvalidRepeat { min, max }),
        Some(max) if max == min => format!("{{{min}}}"),
        Some(max) => format!("{{{min},{max}}}"),
    })
}

/// A pattern under construction.
///
/// Operators act on the innermost open construct. `begin_*` opens a nested
/// construct and [`end`](Self::end) folds it into a single term of its
/// parent.
///
/// ```
/// # use regex_builder::create;
/// # fn main() -> regex_builder::Result<()> {
/// let mut b = create();
/// b.literal('a').begin_either()?.literal('b').literal('c').end()?;
/// assert_eq!(b.peek()?, "a(?:b|c)");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RegexBuilder {
    pub(crate) root: Node,
    /// Open nested constructs, outermost first. Each node's parent is the
    /// one before it, or the root.
    pub(crate) open: Vec<Node>,
    /// Macros registered on the factory that created this builder.
    pub(crate) globals: IndexMap<String, Term>,
    pub(crate) config: Config,
    pub(crate) cache: Cache,
}

impl Default for RegexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexBuilder {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            root: Node::new(Scope::Root),
            open: Vec::new(),
            globals: IndexMap::new(),
            config,
            cache: Cache::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of nested constructs still open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub(crate) fn top(&self) -> &Node {
        self.open.last().unwrap_or(&self.root)
    }

    pub(crate) fn top_mut(&mut self) -> &mut Node {
        self.open.last_mut().unwrap_or(&mut self.root)
    }

    /// All open nodes, root first.
    pub(crate) fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> {
        iter::once(&self.root).chain(self.open.iter())
    }

    fn in_set(&self) -> bool {
        matches!(self.top().scope, Scope::Set { .. })
    }

    pub(crate) fn require_not_in_set(&self, operation: &'static str) -> Result<()> {
        if self.in_set() {
            return Err(Error::Unsupported {
                operation,
                scope: self.top().scope.describe(),
            });
        }
        Ok(())
    }

    fn open_node(&mut self, scope: Scope, operation: &'static str) -> Result<&mut Self> {
        self.require_not_in_set(operation)?;
        self.open.push(Node::new(scope));
        Ok(self)
    }

    /// Appends a term that introduces no captures and no backreferences.
    pub(crate) fn push_plain(&mut self, term: Term, last: LastOp) -> &mut Self {
        let node = self.top_mut();
        node.terms.push(term);
        node.last = last;
        self
    }

    /// Appends a term after checking its captures and backreferences
    /// against the names in scope.
    pub(crate) fn push_checked(&mut self, term: Term, last: LastOp) -> Result<&mut Self> {
        self.admit(std::slice::from_ref(&term))?;
        Ok(self.push_plain(term, last))
    }

    /// Checks that `terms`, about to be combined and appended, introduce
    /// only fresh capture names and refer back only to names in scope.
    pub(crate) fn admit(&self, terms: &[Term]) -> Result<()> {
        let mut seen: IndexSet<&str> = self.visible_captures().collect();
        for name in terms.iter().flat_map(|term| term.captures.iter()) {
            if name.as_str() == crate::WHOLE_MATCH {
                return Err(Error::ReservedCapture);
            }
            if !seen.insert(name) {
                return Err(Error::DuplicateCapture(name.clone()));
            }
        }
        for name in terms.iter().flat_map(|term| term.backrefs.iter()) {
            if !seen.contains(name.as_str()) {
                return Err(Error::UnknownGroup(name.clone()));
            }
        }
        Ok(())
    }

    fn args_to_terms<I>(args: I) -> Vec<Term>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        args.into_iter().map(|arg| arg.into().into_term()).collect()
    }


    /// Appends one literal character.
    pub fn literal(&mut self, ch: char) -> &mut Self {
        let term = if self.in_set() {
            Term::text(escape_in_set(ch), Kind::Literal)
        } else {
            Term::escaped(ch.encode_utf8(&mut [0; 4]))
        };
        self.push_plain(term, LastOp::Literal)
    }

    /// Appends literal text as one term.
    pub fn literals(&mut self, text: &str) -> &mut Self {
        let term = if self.in_set() {
            let kind = if text.chars().count() == 1 {
                Kind::Literal
            } else {
                Kind::Characters
            };
            Term::text(escape_set(text), kind)
        } else {
            Term::escaped(text)
        };
        self.push_plain(term, LastOp::Literal)
    }

    /// Appends pre-existing pattern text.
    ///
    /// The text may not contain capturing groups or backreferences, since
    /// their numbering could not be kept in step with the rest of the
    /// pattern.
    pub fn raw(&mut self, pattern: &str) -> Result<&mut Self> {
        self.require_not_in_set("raw")?;
        let invalid = |reason: String| Error::InvalidRaw {
            pattern: pattern.to_owned(),
            reason,
        };
        let summary = Scanner::new(pattern).scan();
        if summary.capturing_groups > 0 {
            return Err(invalid("capturing groups must be added with capture()".into()));
        }
        if summary.backrefs > 0 {
            return Err(invalid("backreferences must be added with backref()".into()));
        }
        fancy_regex::Regex::new(pattern).map_err(|err| invalid(err.to_string()))?;
        Ok(self.push_plain(Term::raw(pattern), LastOp::Literal))
    }


    pub fn flag(&mut self, flag: Flag) -> Result<&mut Self> {
        if self.in_set() && !flag.allowed_in_set() {
            return Err(Error::FlagNotInSet(flag.code()));
        }
        Ok(self.push_plain(Term::text(flag.pattern(), Kind::Literal), LastOp::Literal))
    }

    /// Appends several flags, given by code, as one term: `flags("sd")`
    /// appends `\s\d`.
    pub fn flags(&mut self, codes: &str) -> Result<&mut Self> {
        let parsed = flags::parse_codes(codes)?;
        if self.in_set() {
            if let Some(flag) = parsed.iter().find(|flag| !flag.allowed_in_set()) {
                return Err(Error::FlagNotInSet(flag.code()));
            }
        }
        let kind = if parsed.len() == 1 {
            Kind::Literal
        } else {
            Kind::Characters
        };
        let text: String = parsed.iter().map(|flag| flag.pattern()).collect();
        Ok(self.push_plain(Term::text(text, kind), LastOp::Literal))
    }

    pub fn dot(&mut self) -> Result<&mut Self> {
        self.flag(Flag::Dot)
    }

    pub fn start_of_line(&mut self) -> Result<&mut Self> {
        self.flag(Flag::Start)
    }

    pub fn end_of_line(&mut self) -> Result<&mut Self> {
        self.flag(Flag::End)
    }

    pub fn digit(&mut self) -> Result<&mut Self> {
        self.flag(Flag::Digit)
    }

    pub fn non_digit(&mut self) -> Result<&mut Self> {
        self.flag(Flag::NonDigit)
    }

    pub fn whitespace(&mut self) -> Result<&mut Self> {
        self.flag(Flag::Whitespace)
    }

    pub fn non_whitespace(&mut self) -> Result<&mut Self> {
        self.flag(Flag::NonWhitespace)
    }

    pub fn word(&mut self) -> Result<&mut Self> {
        self.flag(Flag::Word)
    }

    pub fn non_word(&mut self) -> Result<&mut Self> {
        self.flag(Flag::NonWord)
    }

    pub fn word_boundary(&mut self) -> Result<&mut Self> {
        self.flag(Flag::WordBoundary)
    }

    pub fn non_word_boundary(&mut self) -> Result<&mut Self> {
        self.flag(Flag::NonWordBoundary)
    }

    pub fn tab(&mut self) -> Result<&mut Self> {
        self.flag(Flag::Tab)
    }

    pub fn newline(&mut self) -> Result<&mut Self> {
        self.flag(Flag::Newline)
    }

    pub fn carriage_return(&mut self) -> Result<&mut Self> {
        self.flag(Flag::CarriageReturn)
    }

    pub fn form_feed(&mut self) -> Result<&mut Self> {
        self.flag(Flag::FormFeed)
    }

    pub fn vertical_tab(&mut self) -> Result<&mut Self> {
        self.flag(Flag::VerticalTab)
    }

    pub fn null(&mut self) -> Result<&mut Self> {
        self.flag(Flag::Null)
    }


    fn quantify(
        &mut self,
        operation: Operation,
        quantifier: &str,
        state: LastOp,
    ) -> Result<&mut Self> {
        self.require_not_in_set(match operation {
            Operation::Optional => "optional",
            _ => "repeat",
        })?;
        let node = self.top_mut();
        if node.last == state {
            return Err(Error::Repeated(operation));
        }
        let term = match node.terms.pop() {
            Some(term) if !term.is_empty() => term,
            other => {
                node.terms.extend(other);
                return Err(Error::NothingTo(operation));
            }
        };
        node.terms.push(term.quantified(quantifier));
        node.last = state;
        Ok(self)
    }

    /// Repeats the last term zero or more times (`*`).
    pub fn repeat(&mut self) -> Result<&mut Self> {
        let quantifier = quantifier(None, None)?;
        self.quantify(Operation::Repeat, &quantifier, LastOp::Repeat)
    }

    /// `(0)` → `*`, `(1)` → `+`, `(n)` → `{n,}`.
    pub fn repeat_at_least(&mut self, min: u32) -> Result<&mut Self> {
        let quantifier = quantifier(Some(min), None)?;
        self.quantify(Operation::Repeat, &quantifier, LastOp::Repeat)
    }

    pub fn repeat_exactly(&mut self, count: u32) -> Result<&mut Self> {
        self.repeat_between(count, count)
    }

    pub fn repeat_between(&mut self, min: u32, max: u32) -> Result<&mut Self> {
        let quantifier = quantifier(Some(min), Some(max))?;
        self.quantify(Operation::Repeat, &quantifier, LastOp::Repeat)
    }

    /// Makes the last term optional (`?`).
    pub fn optional(&mut self) -> Result<&mut Self> {
        self.quantify(Operation::Optional, "?", LastOp::Optional)
    }


    /// Appends the arguments one after another as a single term.
    pub fn sequence<I>(&mut self, args: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        self.require_not_in_set("sequence")?;
        let terms = Self::args_to_terms(args);
        self.admit(&terms)?;
        Ok(self.push_plain(Term::concat(terms), LastOp::Closed))
    }

    /// Appends one alternation with each argument as a branch.
    pub fn either<I>(&mut self, args: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        self.require_not_in_set("either")?;
        let terms = Self::args_to_terms(args);
        self.admit(&terms)?;
        Ok(self.push_plain(Term::alternate(terms), LastOp::Closed))
    }

    fn lookahead<I>(&mut self, args: I, negated: bool) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        self.require_not_in_set(if negated { "not_followed_by" } else { "followed_by" })?;
        let terms = Self::args_to_terms(args);
        self.admit(&terms)?;
        let open = if negated { "(?!" } else { "(?=" };
        let term = Term::concat(terms).wrapped(open, ")", Kind::FollowedBy);
        Ok(self.push_plain(term, LastOp::FollowedBy))
    }

    /// Appends a positive lookahead `(?=...)`.
    pub fn followed_by<I>(&mut self, args: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        self.lookahead(args, false)
    }

    /// Appends a negative lookahead `(?!...)`.
    pub fn not_followed_by<I>(&mut self, args: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        self.lookahead(args, true)
    }

    pub fn begin_sequence(&mut self) -> Result<&mut Self> {
        self.open_node(Scope::Sequence, "sequence")
    }

    /// Opens an alternation; every term added until [`end`](Self::end) is
    /// one branch.
    pub fn begin_either(&mut self) -> Result<&mut Self> {
        self.open_node(Scope::Either, "either")
    }

    pub fn begin_followed_by(&mut self) -> Result<&mut Self> {
        self.open_node(Scope::Lookahead { negated: false }, "followed_by")
    }

    pub fn begin_not_followed_by(&mut self) -> Result<&mut Self> {
        self.open_node(Scope::Lookahead { negated: true }, "not_followed_by")
    }


    fn set_of(&mut self, chars: &str, negated: bool) -> Result<&mut Self> {
        self.require_not_in_set(if negated { "none" } else { "any" })?;
        if chars.is_empty() {
            return Err(Error::EmptySet);
        }
        let open = if negated { "[^" } else { "[" };
        let term = Term::text(format!("{open}{}]", escape_set(chars)), Kind::CharacterSet);
        Ok(self.push_plain(term, LastOp::CharacterSet))
    }

    fn range(from: char, to: char) -> Result<String> {
        if from > to {
            return Err(Error::InvalidRange { from, to });
        }
        Ok(format!("{}-{}", escape_in_set(from), escape_in_set(to)))
    }

    /// Appends `[chars]`.
    pub fn any(&mut self, chars: &str) -> Result<&mut Self> {
        self.set_of(chars, false)
    }

    /// Appends `[^chars]`.
    pub fn none(&mut self, chars: &str) -> Result<&mut Self> {
        self.set_of(chars, true)
    }

    /// Appends `[from-to]`, or the bare range inside an open set.
    pub fn any_from(&mut self, from: char, to: char) -> Result<&mut Self> {
        let range = Self::range(from, to)?;
        if self.in_set() {
            return Ok(self.push_plain(Term::text(range, Kind::Literal), LastOp::Literal));
        }
        let term = Term::text(format!("[{range}]"), Kind::CharacterSet);
        Ok(self.push_plain(term, LastOp::CharacterSet))
    }

    /// Appends `[^from-to]`.
    pub fn none_from(&mut self, from: char, to: char) -> Result<&mut Self> {
        self.require_not_in_set("none_from")?;
        let range = Self::range(from, to)?;
        let term = Term::text(format!("[^{range}]"), Kind::CharacterSet);
        Ok(self.push_plain(term, LastOp::CharacterSet))
    }

    /// Opens a set; literals, ranges and class flags added until
    /// [`end`](Self::end) become its members.
    pub fn begin_any(&mut self) -> Result<&mut Self> {
        self.open_node(Scope::Set { negated: false }, "any")
    }

    pub fn begin_none(&mut self) -> Result<&mut Self> {
        self.open_node(Scope::Set { negated: true }, "none")
    }


    /// Closes the innermost open construct, folding it into one term of
    /// its parent. Closing a macro body registers the macro in the parent
    /// scope instead.
    pub fn end(&mut self) -> Result<&mut Self> {
        let node = self.open.pop().ok_or(Error::NothingToClose)?;
        let term = match node.fold() {
            Ok(term) => term,
            Err(err) => {
                self.open.push(node);
                return Err(err);
            }
        };
        let last = match node.scope {
            Scope::Macro { name } => {
                self.top_mut().macros.insert(name, term);
                return Ok(self);
            }
            Scope::Set { .. } => LastOp::CharacterSet,
            Scope::Lookahead { .. } => LastOp::FollowedBy,
            Scope::Root | Scope::Sequence | Scope::Either => LastOp::Closed,
        };
        // Names inside were checked against this scope when they were added.
        Ok(self.push_plain(term, last))
    }

    /// Renders the innermost open construct without compiling it.
    ///
    /// Backreferences are numbered as they will be in the finished pattern.
    pub fn peek(&self) -> Result<String> {
        let (top, ancestors): (&Node, Vec<&Node>) = match self.open.split_last() {
            Some((top, rest)) => (top, iter::once(&self.root).chain(rest).collect()),
            None => (&self.root, Vec::new()),
        };
        let term = top.assemble();
        let order: IndexSet<&str> = ancestors
            .into_iter()
            .flat_map(Node::captures)
            .chain(term.captures.iter())
            .map(String::as_str)
            .collect();
        term.render_with(|name| order.get_index_of(name).map(|index| index + 1))
    }

    /// Folds the finished pattern into a term that can be used as an
    /// argument or macro body elsewhere.
    pub fn to_term(&self) -> Result<Term> {
        if !self.open.is_empty() {
            return Err(Error::Unclosed(self.open.len()));
        }
        self.root.fold()
    }

    /// Hands the builder to `f` and continues the chain.
    pub fn call<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        f(self);
        self
    }
}

impl Term {
    fn build<F>(f: F) -> Result<Term>
    where
        F: FnOnce(&mut RegexBuilder) -> Result<&mut RegexBuilder>,
    {
        let mut builder = RegexBuilder::new();
        f(&mut builder)?;
        builder.to_term()
    }

    pub fn literals(text: &str) -> Term {
        Term::escaped(text)
    }

    pub fn sequence<I>(args: I) -> Result<Term>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        Term::build(|b| b.sequence(args))
    }

    pub fn either<I>(args: I) -> Result<Term>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        Term::build(|b| b.either(args))
    }

    pub fn followed_by<I>(args: I) -> Result<Term>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        Term::build(|b| b.followed_by(args))
    }

    pub fn not_followed_by<I>(args: I) -> Result<Term>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        Term::build(|b| b.not_followed_by(args))
    }

    pub fn any(chars: &str) -> Result<Term> {
        Term::build(|b| b.any(chars))
    }

    pub fn none(chars: &str) -> Result<Term> {
        Term::build(|b| b.none(chars))
    }

    pub fn any_from(from: char, to: char) -> Result<Term> {
        Term::build(|b| b.any_from(from, to))
    }

    pub fn none_from(from: char, to: char) -> Result<Term> {
        Term::build(|b| b.none_from(from, to))
    }
}
