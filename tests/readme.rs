use pretty_assertions::assert_eq;
use regex_builder::{create, Factory, Term};

#[test]
fn simple_usage() -> anyhow::Result<()> {
    let mut b = create();
    b.literals("abc");
    assert_eq!(b.peek()?, "abc");
    Ok(())
}

#[test]
fn chaining_through_call() -> anyhow::Result<()> {
    let mut calls = Vec::new();
    let mut b = create();
    b.literals("abc")
        .call(|b| calls.push(b.peek().unwrap_or_default()))
        .literals("def")
        .call(|b| calls.push(b.peek().unwrap_or_default()));
    assert_eq!(calls, ["abc", "abcdef"]);
    Ok(())
}

#[test]
fn special_flags() -> anyhow::Result<()> {
    let mut b = create();
    b.digit()?.whitespace()?;
    assert_eq!(b.peek()?, r"\d\s");
    Ok(())
}

#[test]
fn capture_and_repeat() -> anyhow::Result<()> {
    let mut b = create();
    b.literals("aaa").capture_auto()?;
    assert_eq!(b.peek()?, "(aaa)");

    let mut b = create();
    b.literals("aaa").repeat_between(1, 3)?;
    assert_eq!(b.peek()?, "(?:aaa){1,3}");
    Ok(())
}

#[test]
fn simple_grouping() -> anyhow::Result<()> {
    let mut b = create();
    b.begin_sequence()?
        .literals("aaa")
        .digit()?
        .literals("bbb")
        .end()?
        .repeat()?;
    assert_eq!(b.peek()?, r"(?:aaa\dbbb)*");
    Ok(())
}

#[test]
fn character_sets() -> anyhow::Result<()> {
    let mut b = create();
    b.any("abcdefg")?;
    assert_eq!(b.peek()?, "[abcdefg]");

    let mut b = create();
    b.begin_any()?.literals("abc").digit()?.end()?;
    assert_eq!(b.peek()?, r"[abc\d]");

    let mut b = create();
    b.begin_none()?.literals("abc").whitespace()?.end()?;
    assert_eq!(b.peek()?, r"[^abc\s]");
    Ok(())
}

#[test]
fn alternation() -> anyhow::Result<()> {
    let mut b = create();
    b.begin_either()?.literals("abc").literals("def").end()?;
    assert_eq!(b.peek()?, "abc|def");
    Ok(())
}

#[test]
fn global_and_local_macros() -> anyhow::Result<()> {
    let mut factory = Factory::new();
    factory.define_macro("any-quote", |b| b.any("'\""))?;

    let mut b = factory.create();
    b.use_macro("any-quote")?.dot()?.repeat()?.use_macro("any-quote")?;
    assert_eq!(b.peek()?, r#"['"].*['"]"#);
    assert!(b.test(r#"say "hi" or 'bye'"#)?);

    let mut b = factory.create();
    b.begin_macro("any-quote")?.literal('"').end()?;
    b.use_macro("any-quote")?.dot()?.repeat()?.use_macro("any-quote")?;
    assert_eq!(b.peek()?, r#"".*""#);
    assert!(!b.test("'single'")?);
    Ok(())
}

#[test]
fn lookahead() -> anyhow::Result<()> {
    let mut b = create();
    b.literals("aaa").followed_by(["bbb"])?;
    assert_eq!(b.peek()?, "aaa(?=bbb)");
    assert!(b.test("aaabbb")?);
    assert!(!b.test("aaaccc")?);

    let mut b = create();
    b.literals("ccc").not_followed_by(["ddd"])?;
    assert_eq!(b.peek()?, "ccc(?!ddd)");
    assert!(b.test("cccx")?);
    assert!(!b.test("cccddd")?);
    Ok(())
}

#[test]
fn backreference_in_negative_lookahead() -> anyhow::Result<()> {
    let dept = || Term::either(["SH", "AB", "DHS"]);
    let mut b = create();
    b.sequence([dept()?])?.capture("from")?;
    b.literals("->");
    b.begin_not_followed_by()?.backref("from")?.end()?;
    b.sequence([dept()?])?.capture("to")?;

    assert_eq!(b.peek()?, r"(SH|AB|DHS)->(?!\1)(SH|AB|DHS)");
    assert!(b.test("SH->AB")?);
    assert!(!b.test("SH->SH")?);

    let captures = b.exec("DHS->SH")?.expect("different departments");
    assert_eq!(captures.get("from"), Some("DHS"));
    assert_eq!(captures.get("to"), Some("SH"));
    Ok(())
}

#[test]
fn escaped_literals_match_themselves() -> anyhow::Result<()> {
    let mut b = create();
    b.literals("1+1=2? (yes) [really] {ok} ^$|*.");
    assert!(b.test("so 1+1=2? (yes) [really] {ok} ^$|*. indeed")?);
    assert!(!b.test("11=2")?);
    Ok(())
}
