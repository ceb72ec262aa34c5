use alloc::string::String;
use core::fmt;

/// An error that occurs when compiling a glob pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    /// The original glob pattern that caused this error.
    glob: Option<String>,
    /// The kind of error.
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self { glob: None, kind }
    }

    pub(crate) fn with_glob(mut self, glob: &str) -> Self {
        self.glob = Some(String::from(glob));
        self
    }

    /// Return the glob pattern that caused this error, if available.
    pub fn glob(&self) -> Option<&str> {
        self.glob.as_deref()
    }

    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.glob {
            Some(glob) => write!(f, "error compiling glob '{}': {}", glob, self.kind),
            None => write!(f, "error compiling glob: {}", self.kind),
        }
    }
}

impl core::error::Error for Error {}

/// The kind of error that can occur when compiling a glob pattern.
///
/// Every error is detected at compile time; matching never fails.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A dangling escape, e.g., a pattern ending with `\`.
    DanglingEscape,
    /// An unterminated bracket expression, e.g., `[a-z`.
    UnclosedClass,
    /// A dangling escape inside a bracket expression, e.g., `[a-\`.
    DanglingClassEscape,
    /// An unrecognized POSIX named class, e.g., `[[:alphq:]]`.
    UnknownNamedClass(String),
    /// A `**` that is not a whole path component, e.g., `a**b`.
    InvalidGlobstar,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingEscape => write!(f, "dangling escape '\\' at end of pattern"),
            Self::UnclosedClass => write!(f, "unterminated bracket expression"),
            Self::DanglingClassEscape => {
                write!(f, "dangling escape '\\' inside bracket expression")
            }
            Self::UnknownNamedClass(name) => {
                write!(f, "unknown character class \"{name}\"")
            }
            Self::InvalidGlobstar => write!(
                f,
                "\"**\" must form a whole path component (\"**/\", \"/**\", or \"/**/\")"
            ),
        }
    }
}
