//! The matching engine: a backtracking interpreter over compiled programs.
//!
//! One recursive entry point, [`Interp::try_match_at`], walks the
//! instruction list against the candidate bytes. `/` is strictly a path
//! separator: only literal runs and the `**` instructions ever consume one.
//! Matching never fails — a candidate either matches or it does not.

use memchr::{memchr, memmem};

use crate::compile::Inst;

/// Run `insts` against `text`. The whole text must match; a matching
/// substring is not a match.
pub(crate) fn matches(insts: &[Inst], case_insensitive: bool, text: &[u8]) -> bool {
    Interp {
        insts,
        case_insensitive,
    }
    .try_match_at(text, 0, 0)
}

struct Interp<'a> {
    insts: &'a [Inst],
    case_insensitive: bool,
}

impl Interp<'_> {
    /// Match the instructions from `inst_idx` against the text from
    /// `text_idx`.
    ///
    /// Recursion depth is bounded by the instruction count: every recursive
    /// call resumes strictly past the current instruction, so the depth a
    /// pattern can reach is fixed at compile time and independent of the
    /// candidate text.
    fn try_match_at(&self, text: &[u8], mut text_idx: usize, mut inst_idx: usize) -> bool {
        while let Some(inst) = self.insts.get(inst_idx) {
            match inst {
                Inst::Literal(literal) => {
                    if inst_idx + 1 == self.insts.len() {
                        // Final instruction: the lengths must agree exactly,
                        // which is cheaper to refute than the comparison.
                        return text.len() - text_idx == literal.len()
                            && self.bytes_eq(&text[text_idx..], literal);
                    }
                    if text.len() - text_idx < literal.len()
                        || !self.bytes_eq(&text[text_idx..text_idx + literal.len()], literal)
                    {
                        return false;
                    }
                    text_idx += literal.len();
                }
                Inst::AnyByte | Inst::Class { .. } => {
                    let Some(&byte) = text.get(text_idx) else {
                        return false;
                    };
                    // A separator never satisfies a one-byte wildcard.
                    if byte == b'/' {
                        return false;
                    }
                    if let Inst::Class {
                        negated,
                        chars,
                        ranges,
                    } = inst
                    {
                        if class_match(byte, chars, ranges) == *negated {
                            return false;
                        }
                    }
                    text_idx += 1;
                }
                Inst::Star { dot_ok } => {
                    return self.match_star(text, text_idx, inst_idx + 1, *dot_ok);
                }
                Inst::EndsWith { dot_ok, literal } => {
                    return self.match_ends_with(text, text_idx, *dot_ok, literal);
                }
                Inst::StarStarEnd { dot_ok } => {
                    return match_star_star_end(text, text_idx, *dot_ok);
                }
                Inst::StarStarSlash { dot_ok } => {
                    return self.match_star_star_slash(text, text_idx, inst_idx + 1, *dot_ok);
                }
            }
            inst_idx += 1;
        }
        text_idx == text.len()
    }

    /// `*`, with `next` pointing at the instruction after it.
    fn match_star(&self, text: &[u8], mut text_idx: usize, next: usize, dot_ok: bool) -> bool {
        // Every alternative the star could take starts right here, so an
        // illegal leading dot rules them all out at once.
        if !dot_ok && text.get(text_idx) == Some(&b'.') {
            return false;
        }

        let Some(inst) = self.insts.get(next) else {
            // Trailing `*`: everything left must be one path component.
            return memchr(b'/', &text[text_idx..]).is_none();
        };

        if let Inst::Literal(literal) = inst {
            // Hop between occurrences of the literal instead of re-trying
            // at every byte. The star itself may not cross the next `/`.
            let next_slash = memchr(b'/', &text[text_idx..]).map(|i| text_idx + i);
            loop {
                let Some(found) = self.find_literal(&text[text_idx..], literal) else {
                    return false;
                };
                let literal_idx = text_idx + found;
                if next_slash.is_some_and(|slash| slash < literal_idx) {
                    return false;
                }
                if self.try_match_at(text, literal_idx + literal.len(), next + 1) {
                    return true;
                }
                // This occurrence did not work out; try the next one.
                text_idx = literal_idx + 1;
            }
        }

        // `*` directly before `?` or a bracket expression: step forward one
        // byte at a time. Rare in real ignore files.
        while text_idx < text.len() {
            if self.try_match_at(text, text_idx, next) {
                return true;
            }
            if text[text_idx] == b'/' {
                return false;
            }
            text_idx += 1;
        }
        false
    }

    /// The fused trailing `*` + literal.
    fn match_ends_with(&self, text: &[u8], text_idx: usize, dot_ok: bool, literal: &[u8]) -> bool {
        // The POSIX fnmatch() leading-dot rule: `*.c` must not match `.c`,
        // even though the star would only cover the empty string.
        if !dot_ok && text.get(text_idx) == Some(&b'.') {
            return false;
        }
        if text.len() - text_idx < literal.len() {
            return false;
        }
        let tail_start = text.len() - literal.len();
        if !self.bytes_eq(&text[tail_start..], literal) {
            return false;
        }
        // The span the implicit star covers may not cross a separator.
        memchr(b'/', &text[text_idx..tail_start]).is_none()
    }

    /// `**/`, with `next` pointing at the instruction after it.
    fn match_star_star_slash(
        &self,
        text: &[u8],
        mut text_idx: usize,
        next: usize,
        dot_ok: bool,
    ) -> bool {
        // First try to match nothing at all, then swallow one whole path
        // component per retry.
        loop {
            if self.try_match_at(text, text_idx, next) {
                return true;
            }
            let component = text_idx;
            let search_from = component + 1;
            if search_from > text.len() {
                return false;
            }
            let Some(found) = memchr(b'/', &text[search_from..]) else {
                return false;
            };
            if !dot_ok && text[component] == b'.' {
                return false;
            }
            text_idx = search_from + found + 1;
        }
    }

    fn bytes_eq(&self, left: &[u8], right: &[u8]) -> bool {
        if self.case_insensitive {
            left.eq_ignore_ascii_case(right)
        } else {
            left == right
        }
    }

    /// Find the first occurrence of `needle` in `haystack`, honoring the
    /// case mode.
    fn find_literal(&self, haystack: &[u8], needle: &[u8]) -> Option<usize> {
        if self.case_insensitive {
            // memmem has no fold-aware searcher; scan candidate windows.
            let len = needle.len();
            if haystack.len() < len {
                return None;
            }
            (0..=haystack.len() - len).find(|&i| haystack[i..i + len].eq_ignore_ascii_case(needle))
        } else {
            memmem::find(haystack, needle)
        }
    }
}

/// Trailing `/**`.
fn match_star_star_end(text: &[u8], text_idx: usize, dot_ok: bool) -> bool {
    if dot_ok {
        return true;
    }
    // The compiler guarantees a `/` literal right before this instruction,
    // so backing up one byte re-covers that separator and a single scan for
    // `/.` vets every remaining path component.
    let from = text_idx.saturating_sub(1);
    memmem::find(&text[from..], b"/.").is_none()
}

fn class_match(byte: u8, chars: &[u8], ranges: &[(u8, u8)]) -> bool {
    chars.contains(&byte) || ranges.iter().any(|&(lo, hi)| lo <= byte && byte <= hi)
}
