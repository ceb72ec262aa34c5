use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::compile::{self, GlobOptions, Inst};
use crate::engine;
use crate::error::Error;

/// A compiled ignore-style glob pattern.
///
/// Compilation happens once, in [`GlobMatcher::new`] or
/// [`GlobBuilder::build`]; every subsequent [`is_match`] call interprets the
/// compiled program without touching the pattern text again. A matcher is
/// immutable after construction and can be shared freely across threads.
///
/// A default-constructed matcher matches only the empty string.
///
/// # Example
///
/// ```
/// use ignore_glob::GlobMatcher;
///
/// let matcher = GlobMatcher::new("*.rs")?;
/// assert!(matcher.is_match("main.rs"));
/// assert!(!matcher.is_match("src/main.rs"));
/// # Ok::<(), ignore_glob::Error>(())
/// ```
///
/// [`is_match`]: GlobMatcher::is_match
#[derive(Clone, Debug, Default)]
pub struct GlobMatcher {
    pattern: String,
    program: Vec<Inst>,
    case_insensitive: bool,
}

impl GlobMatcher {
    /// Compile `pattern` with default options: case-sensitive, dot files
    /// matchable.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid (dangling escape,
    /// unterminated bracket expression, unknown named class, or a `**`
    /// that is not a whole path component).
    pub fn new(pattern: &str) -> Result<Self, Error> {
        GlobBuilder::new(pattern).build()
    }

    /// Return the original pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Test whether `text` matches this pattern.
    ///
    /// The entire text must match; a matching substring is not a match.
    /// `text` must be a normalized, `/`-separated, repository-relative
    /// path.
    pub fn is_match(&self, text: impl AsRef<str>) -> bool {
        self.is_match_bytes(text.as_ref().as_bytes())
    }

    /// Byte-level variant of [`GlobMatcher::is_match`].
    ///
    /// Matching is byte-oriented throughout, so candidates that are not
    /// valid UTF-8 are fine here.
    pub fn is_match_bytes(&self, text: &[u8]) -> bool {
        engine::matches(&self.program, self.case_insensitive, text)
    }
}

impl fmt::Display for GlobMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

/// A builder for configuring pattern options before compiling.
///
/// # Example
///
/// ```
/// use ignore_glob::GlobBuilder;
///
/// let matcher = GlobBuilder::new("*.log").ignore_dotfiles(true).build()?;
/// assert!(matcher.is_match("build.log"));
/// assert!(!matcher.is_match(".log"));
/// # Ok::<(), ignore_glob::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct GlobBuilder {
    pattern: String,
    case_insensitive: bool,
    ignore_dotfiles: bool,
}

impl GlobBuilder {
    /// Create a new builder from the given pattern.
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: String::from(pattern),
            case_insensitive: false,
            ignore_dotfiles: false,
        }
    }

    /// Toggle ASCII-only case-insensitive matching.
    ///
    /// Bracket expressions and ranges are case-duplicated at compile time;
    /// literal runs are compared case-folded at match time. Bytes outside
    /// the ASCII range never fold.
    pub fn case_insensitive(&mut self, yes: bool) -> &mut Self {
        self.case_insensitive = yes;
        self
    }

    /// Toggle the POSIX leading-dot rule.
    ///
    /// When enabled, a wildcard refuses to match a `.` at the start of a
    /// path component unless the pattern spells the dot out (or the
    /// wildcard extends a component that is already underway, as in
    /// `My*.c`).
    pub fn ignore_dotfiles(&mut self, yes: bool) -> &mut Self {
        self.ignore_dotfiles = yes;
        self
    }

    /// Compile the pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid; see
    /// [`ErrorKind`](crate::ErrorKind) for the possible reasons.
    pub fn build(&self) -> Result<GlobMatcher, Error> {
        let options = GlobOptions {
            case_insensitive: self.case_insensitive,
            ignore_dotfiles: self.ignore_dotfiles,
        };
        let program = compile::compile(&self.pattern, options)?;
        Ok(GlobMatcher {
            pattern: self.pattern.clone(),
            program,
            case_insensitive: self.case_insensitive,
        })
    }
}
