use indexmap::IndexMap;

use crate::ast::{Arg, Term};
use crate::builder::{LastOp, Node, RegexBuilder, Scope};
use crate::config::Config;
use crate::error::{Error, Result};

/// Creates builders that share a table of global macros and a [`Config`].
///
/// Each builder gets a copy of the table as it stands when
/// [`create`](Self::create) is called; later changes to the factory do not
/// reach builders that already exist.
#[derive(Debug, Clone, Default)]
pub struct Factory {
    config: Config,
    macros: IndexMap<String, Term>,
}

impl Factory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            macros: IndexMap::new(),
        }
    }

    pub fn create(&self) -> RegexBuilder {
        let mut builder = RegexBuilder::with_config(self.config);
        builder.globals = self.macros.clone();
        builder
    }

    /// Registers the concatenation of `args` as a global macro, replacing
    /// any earlier definition.
    pub fn add_macro<I>(&mut self, name: &str, args: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        self.define_macro(name, |b| b.sequence(args))
    }

    /// Registers whatever `body` builds as a global macro. Earlier global
    /// macros can be used inside the body.
    pub fn define_macro<F>(&mut self, name: &str, body: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut RegexBuilder) -> Result<&mut RegexBuilder>,
    {
        let mut builder = self.create();
        body(&mut builder)?;
        let term = builder.to_term()?;
        self.macros.insert(name.to_owned(), term);
        Ok(self)
    }

    pub fn has_macro(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }
}

impl RegexBuilder {
    /// Registers a macro visible to this construct and everything nested in
    /// it, shadowing any outer macro of the same name.
    pub fn add_macro<I>(&mut self, name: &str, args: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        self.require_not_in_set("add_macro")?;
        let terms: Vec<Term> = args.into_iter().map(|arg| arg.into().into_term()).collect();
        self.admit(&terms)?;
        self.top_mut()
            .macros
            .insert(name.to_owned(), Term::concat(terms));
        Ok(self)
    }

    /// Opens a macro body. [`end`](Self::end) registers it in the enclosing
    /// construct instead of appending it.
    pub fn begin_macro(&mut self, name: &str) -> Result<&mut Self> {
        self.require_not_in_set("begin_macro")?;
        self.open.push(Node::new(Scope::Macro {
            name: name.to_owned(),
        }));
        Ok(self)
    }

    /// Appends a copy of the macro `name`, looked up from the innermost
    /// construct outwards and then among the factory's macros.
    pub fn use_macro(&mut self, name: &str) -> Result<&mut Self> {
        self.require_not_in_set("use_macro")?;
        let term = self
            .lookup_macro(name)
            .cloned()
            .ok_or_else(|| Error::UnknownMacro(name.to_owned()))?;
        self.push_checked(term, LastOp::Closed)
    }

    pub fn has_macro(&self, name: &str) -> bool {
        self.lookup_macro(name).is_some()
    }

    fn lookup_macro(&self, name: &str) -> Option<&Term> {
        self.nodes()
            .rev()
            .find_map(|node| node.macros.get(name))
            .or_else(|| self.globals.get(name))
    }
}
