use std::collections::HashMap;
use std::sync::Arc;

use fancy_regex::Regex;
use indexmap::IndexMap;

use crate::builder::RegexBuilder;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::WHOLE_MATCH;

/// Compiled patterns keyed by the exact text handed to the engine.
#[derive(Debug, Clone, Default)]
pub(crate) struct Cache {
    compiled: HashMap<String, Arc<Regex>>,
}

impl Cache {
    fn get_or_compile(&mut self, pattern: &str, config: &Config) -> Result<Arc<Regex>> {
        if let Some(regex) = self.compiled.get(pattern) {
            return Ok(Arc::clone(regex));
        }
        let mut builder = fancy_regex::RegexBuilder::new(pattern);
        if let Some(limit) = config.backtrack_limit {
            builder.backtrack_limit(limit);
        }
        let regex = builder.build().map_err(|source| Error::Engine {
            pattern: pattern.to_owned(),
            source,
        })?;
        let regex = Arc::new(regex);
        self.compiled.insert(pattern.to_owned(), Arc::clone(&regex));
        Ok(regex)
    }
}

/// Groups captured by one match, by name.
///
/// `"match"` always names the whole match. A group that took no part in the
/// match is present with no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures<'t> {
    whole: &'t str,
    groups: IndexMap<String, Option<&'t str>>,
}

impl<'t> Captures<'t> {
    /// `group(i)` yields the text of group `i`, 0 being the whole match.
    fn collect<F>(names: &[String], group: F) -> Self
    where
        F: Fn(usize) -> Option<&'t str>,
    {
        Self {
            whole: group(0).unwrap_or_default(),
            groups: names
                .iter()
                .enumerate()
                .map(|(index, name)| (name.clone(), group(index + 1)))
                .collect(),
        }
    }

    pub fn whole(&self) -> &'t str {
        self.whole
    }

    pub fn get(&self, name: &str) -> Option<&'t str> {
        if name == WHOLE_MATCH {
            return Some(self.whole);
        }
        self.groups.get(name).copied().flatten()
    }

    /// Named groups in pattern order, without the whole match.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&'t str>)> + '_ {
        self.groups.iter().map(|(name, text)| (name.as_str(), *text))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl RegexBuilder {
    /// Renders the finished pattern, compiles it once and returns it with
    /// its capture names in group order.
    fn compiled(&mut self) -> Result<(Arc<Regex>, Vec<String>)> {
        let term = self.to_term()?;
        let names: Vec<String> = term.captures.iter().cloned().collect();
        let pattern = term.render_with(|name| names.iter().position(|n| n == name).map(|i| i + 1))?;
        let key = format!("{}{pattern}", self.config.flag_prefix());
        let regex = self.cache.get_or_compile(&key, &self.config)?;
        Ok((regex, names))
    }

    /// The text that will be handed to the engine, mode prefix included.
    pub fn to_pattern(&self) -> Result<String> {
        let term = self.to_term()?;
        Ok(format!("{}{}", self.config.flag_prefix(), term.to_pattern()?))
    }

    /// Whether the pattern matches anywhere in `text`.
    pub fn test(&mut self, text: &str) -> Result<bool> {
        let (regex, _) = self.compiled()?;
        regex.is_match(text).map_err(|source| Error::Engine {
            pattern: regex.as_str().to_owned(),
            source,
        })
    }

    /// First match in `text`, with every named group.
    pub fn exec<'t>(&mut self, text: &'t str) -> Result<Option<Captures<'t>>> {
        let (regex, names) = self.compiled()?;
        let found = regex.captures(text).map_err(|source| Error::Engine {
            pattern: regex.as_str().to_owned(),
            source,
        })?;
        Ok(found.map(|caps| Captures::collect(&names, |i| caps.get(i).map(|m| m.as_str()))))
    }

    /// Replaces every non-overlapping match with what `replacer` returns
    /// for it.
    pub fn replace<F>(&mut self, text: &str, mut replacer: F) -> Result<String>
    where
        F: FnMut(&Captures<'_>) -> String,
    {
        let (regex, names) = self.compiled()?;
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in regex.captures_iter(text) {
            let caps = caps.map_err(|source| Error::Engine {
                pattern: regex.as_str().to_owned(),
                source,
            })?;
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            let captures = Captures::collect(&names, |i| caps.get(i).map(|m| m.as_str()));
            out.push_str(&replacer(&captures));
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }

    /// Number of compiled patterns held by this builder.
    pub fn cache_len(&self) -> usize {
        self.cache.compiled.len()
    }

    /// Drops every compiled pattern.
    pub fn reset(&mut self) {
        self.cache.compiled.clear();
    }
}
