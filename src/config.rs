use bon::Builder;

/// Options handed to the regex engine when a pattern is compiled.
///
/// None of these change the rendered pattern returned by `peek()`; the mode
/// flags are prepended as an inline group (`(?is)`) at compile time, which
/// does not shift capture numbering.
#[derive(Builder, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    #[builder(default)]
    pub case_insensitive: bool,
    /// `^` and `$` match at line breaks.
    #[builder(default)]
    pub multi_line: bool,
    /// `.` also matches `\n`.
    #[builder(default)]
    pub dot_matches_new_line: bool,
    /// Upper bound on backtracking steps; the engine default when unset.
    pub backtrack_limit: Option<usize>,
}

impl Config {
    pub(crate) fn flag_prefix(&self) -> String {
        let mut flags = String::new();
        if self.case_insensitive {
            flags.push('i');
        }
        if self.multi_line {
            flags.push('m');
        }
        if self.dot_matches_new_line {
            flags.push('s');
        }
        if flags.is_empty() {
            flags
        } else {
            format!("(?{flags})")
        }
    }
}
