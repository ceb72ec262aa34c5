#![doc = include_str!("../README.md")]
#![no_std]
extern crate alloc;

mod compile;
mod engine;
mod error;
mod glob;
mod intervals;

pub use crate::error::{Error, ErrorKind};
pub use crate::glob::{GlobBuilder, GlobMatcher};

use alloc::string::String;

/// Escape all glob metacharacters in the given string.
///
/// The returned string, when compiled as a pattern, matches the input
/// string literally.
pub fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '*' | '?' | '[' | ']' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
