use crate::ast::Term;
use crate::builder::{LastOp, RegexBuilder};
use crate::error::{Error, Operation, Result};
use crate::WHOLE_MATCH;

impl RegexBuilder {
    /// Capture names reachable from the innermost construct, in the order
    /// their groups open in the finished pattern.
    pub(crate) fn visible_captures(&self) -> impl Iterator<Item = &str> {
        self.nodes()
            .flat_map(|node| node.captures())
            .map(String::as_str)
    }

    /// Captures introduced in the innermost open construct.
    pub fn ordered_captures(&self) -> Vec<&str> {
        self.top().captures().map(String::as_str).collect()
    }

    /// Every capture in scope, outermost construct first.
    pub fn ordered_captures_with_ancestors(&self) -> Vec<&str> {
        self.visible_captures().collect()
    }

    /// Wraps the last term in a capturing group called `name`.
    pub fn capture(&mut self, name: &str) -> Result<&mut Self> {
        self.capture_as(Some(name))
    }

    /// Wraps the last term in a capturing group named after its position,
    /// `"1"` for the first group of the pattern.
    pub fn capture_auto(&mut self) -> Result<&mut Self> {
        self.capture_as(None)
    }

    fn capture_as(&mut self, name: Option<&str>) -> Result<&mut Self> {
        self.require_not_in_set("capture")?;
        if self.top().last == LastOp::Capture {
            return Err(Error::Repeated(Operation::Capture));
        }
        if !self.top().terms.last().is_some_and(|term| !term.is_empty()) {
            return Err(Error::NothingTo(Operation::Capture));
        }
        let name = match name {
            Some(WHOLE_MATCH) => return Err(Error::ReservedCapture),
            Some(name) if self.visible_captures().any(|seen| seen == name) => {
                return Err(Error::DuplicateCapture(name.to_owned()));
            }
            Some(name) => name.to_owned(),
            None => self.positional_name(),
        };

        let node = self.top_mut();
        if let Some(term) = node.terms.pop() {
            node.terms.push(term.captured(name));
        }
        node.last = LastOp::Capture;
        Ok(self)
    }

    /// The 1-based position the group about to wrap the last term will
    /// have, moved past any name already taken.
    fn positional_name(&self) -> String {
        let wrapped = self.top().terms.last().map_or(0, |term| term.captures.len());
        let mut position = self.visible_captures().count() - wrapped + 1;
        loop {
            let name = position.to_string();
            if !self.visible_captures().any(|seen| seen == name) {
                return name;
            }
            position += 1;
        }
    }

    /// Matches the text last captured by the group `name`.
    pub fn backref(&mut self, name: &str) -> Result<&mut Self> {
        self.require_not_in_set("backref")?;
        if !self.visible_captures().any(|seen| seen == name) {
            return Err(Error::UnknownGroup(name.to_owned()));
        }
        Ok(self.push_plain(Term::backref(name), LastOp::Literal))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{Error, Operation};
    use crate::{create, Term};
    use pretty_assertions::assert_eq;

    #[test]
    fn capture_wraps_last_term() {
        let mut b = create();
        b.literals("aaa").capture("first").unwrap();
        assert_eq!(b.peek().unwrap(), "(aaa)");
        assert_eq!(b.ordered_captures(), ["first"]);
    }

    #[test]
    fn capture_twice_fails() {
        let mut b = create();
        b.literals("aaa").capture("first").unwrap();
        assert!(matches!(b.capture("second"), Err(Error::Repeated(Operation::Capture))));
    }

    #[test]
    fn capture_needs_a_term() {
        let mut b = create();
        assert!(matches!(b.capture("x"), Err(Error::NothingTo(Operation::Capture))));
    }

    #[test]
    fn reserved_and_duplicate_names() {
        let mut b = create();
        b.literal('a');
        assert!(matches!(b.capture("match"), Err(Error::ReservedCapture)));
        b.capture("x").unwrap().literal('b');
        assert!(matches!(b.capture("x"), Err(Error::DuplicateCapture(name)) if name == "x"));
    }

    #[test]
    fn duplicate_names_across_arguments() {
        let x = || {
            let mut b = create();
            b.literal('a').capture("x").unwrap();
            b.to_term().unwrap()
        };
        let mut b = create();
        assert!(matches!(b.sequence([x(), x()]), Err(Error::DuplicateCapture(_))));
        assert_eq!(b.peek().unwrap(), "");
    }

    #[test]
    fn capture_after_repeat() {
        let mut b = create();
        b.literals("aa").repeat().unwrap().capture("g").unwrap();
        assert_eq!(b.peek().unwrap(), "((?:aa)*)");
    }

    #[test]
    fn positional_names() {
        let mut b = create();
        b.literal('a').capture_auto().unwrap().literal('b').capture_auto().unwrap();
        assert_eq!(b.ordered_captures(), ["1", "2"]);
        b.backref("1").unwrap();
        assert_eq!(b.peek().unwrap(), r"(a)(b)\1");
    }

    #[test]
    fn positional_name_skips_taken_names() {
        let mut b = create();
        b.literal('a').capture("2").unwrap().literal('b').capture_auto().unwrap();
        assert_eq!(b.ordered_captures(), ["2", "3"]);
    }

    #[test]
    fn backrefs_match_captured_text() {
        let mut b = create();
        b.literal('a').capture("g1").unwrap();
        b.literal('b').capture("g2").unwrap();
        b.backref("g2").unwrap();
        assert_eq!(b.peek().unwrap(), r"(a)(b)\2");
        assert!(b.test("abb").unwrap());
        assert!(!b.test("aba").unwrap());
        assert!(!b.test("ab").unwrap());
    }

    #[test]
    fn backref_to_unknown_group() {
        let mut b = create();
        assert!(matches!(b.backref("nope"), Err(Error::UnknownGroup(_))));
    }

    #[test]
    fn nested_capture_renumbers_backref() {
        let mut b = create();
        b.begin_sequence().unwrap();
        b.literals("lit").capture("group").unwrap().backref("group").unwrap();
        assert_eq!(b.peek().unwrap(), r"(lit)\1");
        b.end().unwrap().capture("outer").unwrap();
        assert_eq!(b.peek().unwrap(), r"((lit)\2)");
        assert_eq!(b.ordered_captures(), ["outer", "group"]);

        let captures = b.exec("litlit").unwrap().unwrap();
        assert_eq!(captures.get("outer"), Some("litlit"));
        assert_eq!(captures.get("group"), Some("lit"));
    }

    #[test]
    fn peek_numbers_against_ancestors() {
        let mut b = create();
        b.literal('x').capture("x").unwrap();
        b.begin_sequence().unwrap().literal('y').capture("y").unwrap().backref("x").unwrap();
        assert_eq!(b.peek().unwrap(), r"(y)\1");
        assert_eq!(b.ordered_captures(), ["y"]);
        assert_eq!(b.ordered_captures_with_ancestors(), ["x", "y"]);
        b.end().unwrap();
        assert_eq!(b.peek().unwrap(), r"(x)(y)\1");
    }

    #[test]
    fn terms_carry_their_captures() {
        let mut inner = create();
        inner.literals("ab").capture("pair").unwrap();
        let term: Term = inner.to_term().unwrap();
        assert_eq!(term.capture_names().collect::<Vec<_>>(), ["pair"]);

        let mut b = create();
        b.literal('<').sequence([term]).unwrap().backref("pair").unwrap();
        assert_eq!(b.peek().unwrap(), r"<(ab)\1");
    }
}
