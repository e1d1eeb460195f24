//! Build regular expressions one operator at a time.
//!
//! Literal text is escaped for you, groups are added only where a
//! quantifier or alternation needs them, and named captures are numbered
//! for you, including backreferences to them.
//!
//! ```
//! # fn main() -> regex_builder::Result<()> {
//! let mut b = regex_builder::create();
//! b.literal('a').capture("theA")?;
//! b.literal('b').capture("theB")?;
//!
//! let captures = b.exec("xxabxx")?.expect("matches");
//! assert_eq!(captures.get("match"), Some("ab"));
//! assert_eq!(captures.get("theB"), Some("b"));
//! # Ok(())
//! # }
//! ```

pub mod ast;
pub mod builder;
mod capture;
pub mod config;
pub mod error;
pub mod escape;
pub mod flags;
mod macros;
pub mod matcher;
pub mod parser;

pub use ast::{Arg, Kind, Term};
pub use builder::RegexBuilder;
pub use config::Config;
pub use error::{Error, Operation, Result};
pub use flags::Flag;
pub use macros::Factory;
pub use matcher::Captures;

/// Capture name that always refers to the whole match.
pub const WHOLE_MATCH: &str = "match";

/// A builder with no global macros and the default [`Config`].
pub fn create() -> RegexBuilder {
    RegexBuilder::new()
}
