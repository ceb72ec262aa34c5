//! The pattern compiler: glob text in, instruction program out.
//!
//! A pattern is scanned once, left to right, and lowered into a `Vec` of
//! [`Inst`]s that the matching engine interprets. All syntax errors are
//! caught here; the engine itself can never fail.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{Error, ErrorKind};
use crate::intervals::CharIntervalSet;

/// One instruction of a compiled pattern.
///
/// The program is immutable once built. Every variant is self-contained, so
/// the engine can walk the list without any length or terminator
/// bookkeeping.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Inst {
    /// Match these exact bytes (case-folded under the insensitive mode).
    Literal(Vec<u8>),
    /// `?` — any single byte except `/`.
    AnyByte,
    /// `*` — zero or more bytes, none of them `/`. When `dot_ok` is false
    /// the match may not begin with a `.`.
    Star { dot_ok: bool },
    /// Fused trailing `*` + literal: the literal must end the text, and the
    /// span covered by the star must contain no `/`.
    EndsWith { dot_ok: bool, literal: Vec<u8> },
    /// Trailing `/**`: all remaining text. When `dot_ok` is false, no
    /// remaining path component may start with a `.`.
    StarStarEnd { dot_ok: bool },
    /// `**/`: zero bytes, or whole path components one at a time. When
    /// `dot_ok` is false, no skipped component may start with a `.`.
    StarStarSlash { dot_ok: bool },
    /// `[...]` or `[!...]`: exactly one byte, never `/`. The chars and
    /// ranges are disjoint and sorted.
    Class {
        negated: bool,
        chars: Vec<u8>,
        ranges: Vec<(u8, u8)>,
    },
}

/// Compile-time options. Both default to off.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct GlobOptions {
    pub(crate) case_insensitive: bool,
    pub(crate) ignore_dotfiles: bool,
}

/// Compile `pattern` into an instruction program.
pub(crate) fn compile(pattern: &str, options: GlobOptions) -> Result<Vec<Inst>, Error> {
    let glob = pattern.as_bytes();
    let include_dotfiles = !options.ignore_dotfiles;
    let mut insts = Vec::new();

    let mut idx = 0;
    while idx < glob.len() {
        match glob[idx] {
            b'\\' => {
                // A backslash-escaped byte is a literal, whatever it is.
                idx += 1;
                if idx >= glob.len() {
                    return Err(Error::new(ErrorKind::DanglingEscape).with_glob(pattern));
                }
                push_literal_byte(&mut insts, glob[idx]);
            }
            b'?' => insts.push(Inst::AnyByte),
            b'*' if glob.get(idx + 1) == Some(&b'*') => {
                idx += 1;
                globstar(glob, &mut idx, include_dotfiles, &mut insts)
                    .map_err(|kind| Error::new(kind).with_glob(pattern))?;
            }
            b'*' => {
                // `*.c` must not match `.bak.c`, but `My*.c` must match
                // `My.foo.c`: only a star at the start of a path component
                // is subject to the leading-dot rule.
                let dot_ok = include_dotfiles || (idx != 0 && glob[idx - 1] != b'/');
                insts.push(Inst::Star { dot_ok });
            }
            b'[' => {
                idx = parse_bracket(glob, idx, options, &mut insts)
                    .map_err(|kind| Error::new(kind).with_glob(pattern))?;
            }
            byte => push_literal_byte(&mut insts, byte),
        }
        idx += 1;
    }

    fuse_trailing_star(&mut insts);
    Ok(insts)
}

/// Append one literal byte, extending the current literal run if the last
/// instruction is one.
fn push_literal_byte(insts: &mut Vec<Inst>, byte: u8) {
    if let Some(Inst::Literal(run)) = insts.last_mut() {
        run.push(byte);
    } else {
        insts.push(Inst::Literal(alloc::vec![byte]));
    }
}

/// Lower a `**` whose second star sits at `glob[*idx]`.
///
/// `**` is only valid as a whole path component: `**/` at the start of the
/// pattern, `/**` at its end, or `/**/` in the middle. Anything else
/// rejects the pattern, matching git's wildmatch behavior.
fn globstar(
    glob: &[u8],
    idx: &mut usize,
    include_dotfiles: bool,
    insts: &mut Vec<Inst>,
) -> Result<(), ErrorKind> {
    let i = *idx;
    if i + 1 >= glob.len() {
        // Pattern ends with `**`; the byte before the stars must be `/`
        // (it stays part of the preceding literal).
        if i < 2 || glob[i - 2] != b'/' {
            return Err(ErrorKind::InvalidGlobstar);
        }
        insts.push(Inst::StarStarEnd {
            dot_ok: include_dotfiles,
        });
    } else if glob[i + 1] == b'/' {
        if i >= 2 && glob[i - 2] != b'/' {
            return Err(ErrorKind::InvalidGlobstar);
        }
        *idx = i + 1;
        insts.push(Inst::StarStarSlash {
            dot_ok: include_dotfiles,
        });
    } else {
        return Err(ErrorKind::InvalidGlobstar);
    }
    Ok(())
}

/// If the program ends in `Star` + `Literal`, fuse the pair into a single
/// `EndsWith`. Patterns like `*.txt` are the most common wildcard form in
/// real ignore files, and the fused instruction answers them with one tail
/// comparison instead of a backtracking search. Purely a performance
/// rewrite; an engine without it must answer identically.
fn fuse_trailing_star(insts: &mut Vec<Inst>) {
    if let [.., Inst::Star { dot_ok }, Inst::Literal(run)] = insts.as_mut_slice() {
        let dot_ok = *dot_ok;
        let literal = core::mem::take(run);
        insts.truncate(insts.len() - 2);
        insts.push(Inst::EndsWith { dot_ok, literal });
    }
}

/// Parse a bracket expression whose `[` sits at `glob[open]`, pushing one
/// `Class` instruction. Returns the index of the terminating `]`.
fn parse_bracket(
    glob: &[u8],
    open: usize,
    options: GlobOptions,
    insts: &mut Vec<Inst>,
) -> Result<usize, ErrorKind> {
    debug_assert_eq!(glob[open], b'[');
    let mut idx = open;
    if idx + 1 >= glob.len() {
        return Err(ErrorKind::UnclosedClass);
    }
    let negated = matches!(glob[idx + 1], b'!' | b'^');
    if negated {
        idx += 1;
    }

    let mut set = CharIntervalSet::new();
    // A byte that has been seen but not yet committed: it may still turn
    // out to be the low bound of a range.
    let mut prev: Option<u8> = None;
    let start = idx;

    loop {
        idx += 1;
        if idx >= glob.len() {
            return Err(ErrorKind::UnclosedClass);
        }
        match glob[idx] {
            b'\\' => {
                idx += 1;
                if idx >= glob.len() {
                    return Err(ErrorKind::DanglingClassEscape);
                }
                if let Some(p) = prev.take() {
                    add_single(&mut set, p, options.case_insensitive);
                }
                prev = Some(glob[idx]);
            }
            b']' => {
                // `]` right after the opening `[` (or after `[!`) is a
                // literal `]`, not the terminator.
                if idx == start + 1 {
                    prev = Some(b']');
                } else {
                    break;
                }
            }
            b'-' => match prev.take() {
                None => prev = Some(b'-'),
                Some(lo) => {
                    let (new_idx, new_prev) = parse_range(glob, idx, lo, &mut set, options)?;
                    idx = new_idx;
                    prev = new_prev;
                }
            },
            b'[' => match named_class(glob, idx, options.case_insensitive)? {
                Some((end, ranges)) => {
                    for &(lo, hi) in ranges {
                        set.insert(lo, hi);
                    }
                    idx = end;
                }
                None => {
                    // Not a `[:name:]` construct; a plain literal `[`.
                    if let Some(p) = prev.take() {
                        add_single(&mut set, p, options.case_insensitive);
                    }
                    prev = Some(b'[');
                }
            },
            byte => {
                if let Some(p) = prev.take() {
                    add_single(&mut set, p, options.case_insensitive);
                }
                prev = Some(byte);
            }
        }
    }

    if let Some(p) = prev {
        add_single(&mut set, p, options.case_insensitive);
    }

    let mut chars = Vec::new();
    let mut ranges = Vec::new();
    for (lo, hi) in set.into_merged() {
        if lo == hi {
            chars.push(lo);
        } else {
            ranges.push((lo, hi));
        }
    }
    insts.push(Inst::Class {
        negated,
        chars,
        ranges,
    });
    Ok(idx)
}

/// Parse the tail of a range whose low bound `lo` is already pending and
/// whose `-` sits at `glob[idx]`. Returns the index of the last consumed
/// byte plus the new pending byte, if any.
fn parse_range(
    glob: &[u8],
    idx: usize,
    lo: u8,
    set: &mut CharIntervalSet,
    options: GlobOptions,
) -> Result<(usize, Option<u8>), ErrorKind> {
    if idx + 1 >= glob.len() {
        return Err(ErrorKind::UnclosedClass);
    }
    if glob[idx + 1] == b']' {
        // `-` right before the terminator is a literal `-`, not a range.
        add_single(set, lo, options.case_insensitive);
        return Ok((idx, Some(b'-')));
    }
    let mut idx = idx + 1;
    let mut hi = glob[idx];
    if hi == b'\\' {
        idx += 1;
        if idx >= glob.len() {
            return Err(ErrorKind::DanglingClassEscape);
        }
        hi = glob[idx];
    }
    // An inverted range can never match anything. Drop it rather than
    // rejecting the whole pattern.
    if lo <= hi {
        add_range(set, lo, hi, options.case_insensitive);
    }
    Ok((idx, None))
}

/// Record a single byte, plus its opposite-case twin under the insensitive
/// mode.
fn add_single(set: &mut CharIntervalSet, byte: u8, case_insensitive: bool) {
    set.insert(byte, byte);
    if case_insensitive {
        if byte.is_ascii_lowercase() {
            let upper = byte.to_ascii_uppercase();
            set.insert(upper, upper);
        } else if byte.is_ascii_uppercase() {
            let lower = byte.to_ascii_lowercase();
            set.insert(lower, lower);
        }
    }
}

/// Record an explicit range. Under the insensitive mode, the part of the
/// range that crosses either alphabetic band is duplicated into the other
/// case, so `[0-D]` also covers `a-d`.
fn add_range(set: &mut CharIntervalSet, lo: u8, hi: u8, case_insensitive: bool) {
    set.insert(lo, hi);
    if case_insensitive {
        if lo <= b'Z' && hi >= b'A' {
            set.insert(
                lo.max(b'A').to_ascii_lowercase(),
                hi.min(b'Z').to_ascii_lowercase(),
            );
        }
        if lo <= b'z' && hi >= b'a' {
            set.insert(
                lo.max(b'a').to_ascii_uppercase(),
                hi.min(b'z').to_ascii_uppercase(),
            );
        }
    }
}

/// Recognize a `[:name:]` construct whose inner `[` sits at `glob[idx]`.
///
/// Returns the index of the `]` closing the construct together with the
/// class's intervals, `None` if this is not a named class at all (the `[`
/// is then an ordinary literal), or an error for a well-formed construct
/// naming an unknown class.
fn named_class(
    glob: &[u8],
    idx: usize,
    case_insensitive: bool,
) -> Result<Option<(usize, &'static [(u8, u8)])>, ErrorKind> {
    if idx + 3 >= glob.len() || glob[idx + 1] != b':' {
        return Ok(None);
    }
    let name_start = idx + 2;
    let mut end = name_start;
    while end + 1 < glob.len() {
        if glob[end] == b':' && glob[end + 1] == b']' {
            let name = &glob[name_start..end];
            return match class_ranges(name, case_insensitive) {
                Some(ranges) => Ok(Some((end + 1, ranges))),
                None => Err(ErrorKind::UnknownNamedClass(
                    String::from_utf8_lossy(name).into_owned(),
                )),
            };
        }
        end += 1;
    }
    Ok(None)
}

const ALPHA: &[(u8, u8)] = &[(b'a', b'z'), (b'A', b'Z')];

/// The POSIX Standard Locale class definitions (ISO/IEC 9945-2).
///
/// Under the insensitive mode, `upper` and `lower` are indistinguishable
/// from `alpha`.
fn class_ranges(name: &[u8], case_insensitive: bool) -> Option<&'static [(u8, u8)]> {
    match name {
        b"alnum" => Some(&[(b'a', b'z'), (b'A', b'Z'), (b'0', b'9')]),
        b"alpha" => Some(ALPHA),
        b"blank" => Some(&[(b'\t', b'\t'), (b' ', b' ')]),
        b"cntrl" => Some(&[(0x00, 0x1f), (0x7f, 0x7f)]),
        b"digit" => Some(&[(b'0', b'9')]),
        b"graph" => Some(&[(0x21, 0x7e)]),
        b"lower" if case_insensitive => Some(ALPHA),
        b"lower" => Some(&[(b'a', b'z')]),
        b"print" => Some(&[(0x20, 0x7e)]),
        b"punct" => Some(&[(0x21, 0x2f), (0x3a, 0x40), (0x5b, 0x60), (0x7b, 0x7e)]),
        // \t \n \v \f \r plus the space character.
        b"space" => Some(&[(0x09, 0x0d), (b' ', b' ')]),
        b"upper" if case_insensitive => Some(ALPHA),
        b"upper" => Some(&[(b'A', b'Z')]),
        b"xdigit" => Some(&[(b'0', b'9'), (b'a', b'f'), (b'A', b'F')]),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use alloc::vec;

    fn compiled(pattern: &str) -> Vec<Inst> {
        compile(pattern, GlobOptions::default()).unwrap()
    }

    fn compile_err(pattern: &str) -> ErrorKind {
        compile(pattern, GlobOptions::default())
            .unwrap_err()
            .kind()
            .clone()
    }

    #[test]
    fn literal_runs_coalesce() {
        assert_eq!(compiled("foo"), vec![Inst::Literal(b"foo".to_vec())]);
        // Escaped bytes extend the surrounding run.
        assert_eq!(compiled("a\\*b"), vec![Inst::Literal(b"a*b".to_vec())]);
        assert_eq!(compiled("\\a\\b\\c"), vec![Inst::Literal(b"abc".to_vec())]);
    }

    #[test]
    fn qmark_and_star() {
        assert_eq!(
            compiled("a?c"),
            vec![
                Inst::Literal(b"a".to_vec()),
                Inst::AnyByte,
                Inst::Literal(b"c".to_vec()),
            ]
        );
        assert_eq!(
            compiled("*?"),
            vec![Inst::Star { dot_ok: true }, Inst::AnyByte]
        );
    }

    #[test]
    fn trailing_star_literal_fuses() {
        assert_eq!(
            compiled("*.txt"),
            vec![Inst::EndsWith {
                dot_ok: true,
                literal: b".txt".to_vec(),
            }]
        );
        assert_eq!(
            compiled("src/*.rs"),
            vec![
                Inst::Literal(b"src/".to_vec()),
                Inst::EndsWith {
                    dot_ok: true,
                    literal: b".rs".to_vec(),
                },
            ]
        );
    }

    #[test]
    fn fusion_needs_trailing_position() {
        // The star+literal pair sits mid-pattern; no fusion.
        assert_eq!(
            compiled("*a?"),
            vec![
                Inst::Star { dot_ok: true },
                Inst::Literal(b"a".to_vec()),
                Inst::AnyByte,
            ]
        );
    }

    #[test]
    fn star_dot_flag_follows_component_position() {
        let opts = GlobOptions {
            ignore_dotfiles: true,
            ..GlobOptions::default()
        };
        // Star at pattern start: dot-restricted.
        assert_eq!(
            compile("*.c", opts).unwrap(),
            vec![Inst::EndsWith {
                dot_ok: false,
                literal: b".c".to_vec(),
            }]
        );
        // Star after a literal in the same component: free.
        assert_eq!(
            compile("My*.c", opts).unwrap(),
            vec![
                Inst::Literal(b"My".to_vec()),
                Inst::EndsWith {
                    dot_ok: true,
                    literal: b".c".to_vec(),
                },
            ]
        );
        // Star right after a slash: dot-restricted again.
        assert_eq!(
            compile("src/*.c", opts).unwrap(),
            vec![
                Inst::Literal(b"src/".to_vec()),
                Inst::EndsWith {
                    dot_ok: false,
                    literal: b".c".to_vec(),
                },
            ]
        );
    }

    #[test]
    fn globstar_forms() {
        assert_eq!(
            compiled("**/foo"),
            vec![
                Inst::StarStarSlash { dot_ok: true },
                Inst::Literal(b"foo".to_vec()),
            ]
        );
        assert_eq!(
            compiled("foo/**"),
            vec![
                Inst::Literal(b"foo/".to_vec()),
                Inst::StarStarEnd { dot_ok: true },
            ]
        );
        assert_eq!(
            compiled("a/**/b"),
            vec![
                Inst::Literal(b"a/".to_vec()),
                Inst::StarStarSlash { dot_ok: true },
                Inst::Literal(b"b".to_vec()),
            ]
        );
    }

    #[test]
    fn globstar_rejects_partial_components() {
        assert_eq!(compile_err("**"), ErrorKind::InvalidGlobstar);
        assert_eq!(compile_err("a**"), ErrorKind::InvalidGlobstar);
        assert_eq!(compile_err("**a"), ErrorKind::InvalidGlobstar);
        assert_eq!(compile_err("a**b"), ErrorKind::InvalidGlobstar);
        assert_eq!(compile_err("foo**/"), ErrorKind::InvalidGlobstar);
        assert_eq!(compile_err("**/bar**"), ErrorKind::InvalidGlobstar);
        assert_eq!(compile_err("**[!te]"), ErrorKind::InvalidGlobstar);
    }

    #[test]
    fn dangling_escape() {
        assert_eq!(compile_err("\\"), ErrorKind::DanglingEscape);
        assert_eq!(compile_err("a\\"), ErrorKind::DanglingEscape);
        assert_eq!(compile_err("*/\\"), ErrorKind::DanglingEscape);
    }

    #[test]
    fn unterminated_brackets() {
        assert_eq!(compile_err("[abc"), ErrorKind::UnclosedClass);
        assert_eq!(compile_err("ab["), ErrorKind::UnclosedClass);
        assert_eq!(compile_err("[!"), ErrorKind::UnclosedClass);
        assert_eq!(compile_err("[-"), ErrorKind::UnclosedClass);
        assert_eq!(compile_err("[a-"), ErrorKind::UnclosedClass);
        assert_eq!(compile_err("[!a-"), ErrorKind::UnclosedClass);
        // The escape consumed the only possible terminator.
        assert_eq!(compile_err("[\\]"), ErrorKind::UnclosedClass);
        assert_eq!(compile_err("[a\\"), ErrorKind::DanglingClassEscape);
    }

    #[test]
    fn unknown_named_class() {
        assert_eq!(
            compile_err("[[:spaci:]]"),
            ErrorKind::UnknownNamedClass("spaci".into())
        );
        assert_eq!(
            compile_err("[[::]ab]"),
            ErrorKind::UnknownNamedClass(String::new())
        );
    }

    #[test]
    fn class_singles_and_ranges() {
        assert_eq!(
            compiled("[abc]"),
            vec![Inst::Class {
                negated: false,
                chars: vec![b'a', b'b', b'c'],
                ranges: vec![],
            }]
        );
        assert_eq!(
            compiled("[a-cx]"),
            vec![Inst::Class {
                negated: false,
                chars: vec![b'x'],
                ranges: vec![(b'a', b'c')],
            }]
        );
        assert_eq!(
            compiled("[!a-c]"),
            vec![Inst::Class {
                negated: true,
                chars: vec![],
                ranges: vec![(b'a', b'c')],
            }]
        );
    }

    #[test]
    fn class_overlapping_ranges_merge() {
        assert_eq!(
            compiled("[a-ca-c]"),
            vec![Inst::Class {
                negated: false,
                chars: vec![],
                ranges: vec![(b'a', b'c')],
            }]
        );
        assert_eq!(
            compiled("[a-db-e]"),
            vec![Inst::Class {
                negated: false,
                chars: vec![],
                ranges: vec![(b'a', b'e')],
            }]
        );
    }

    #[test]
    fn class_leading_bracket_rules() {
        // `]` first is a literal; `-` last is a literal.
        assert_eq!(
            compiled("[]-]"),
            vec![Inst::Class {
                negated: false,
                chars: vec![b'-', b']'],
                ranges: vec![],
            }]
        );
    }

    #[test]
    fn named_class_emits_ranges() {
        assert_eq!(
            compiled("[[:digit:]]"),
            vec![Inst::Class {
                negated: false,
                chars: vec![],
                ranges: vec![(b'0', b'9')],
            }]
        );
        // Named class mixed with explicit ranges, all merged together.
        assert_eq!(
            compiled("[a-c[:digit:]x-z]"),
            vec![Inst::Class {
                negated: false,
                chars: vec![],
                ranges: vec![(b'0', b'9'), (b'a', b'c'), (b'x', b'z')],
            }]
        );
    }

    #[test]
    fn case_insensitive_duplicates_at_compile_time() {
        let opts = GlobOptions {
            case_insensitive: true,
            ..GlobOptions::default()
        };
        assert_eq!(
            compile("[a-c]", opts).unwrap(),
            vec![Inst::Class {
                negated: false,
                chars: vec![],
                ranges: vec![(b'A', b'C'), (b'a', b'c')],
            }]
        );
        assert_eq!(
            compile("[x]", opts).unwrap(),
            vec![Inst::Class {
                negated: false,
                chars: vec![b'X', b'x'],
                ranges: vec![],
            }]
        );
        // `upper` degenerates to `alpha` when case is folded.
        assert_eq!(
            compile("[[:upper:]]", opts).unwrap(),
            compile("[[:alpha:]]", opts).unwrap()
        );
    }

    #[test]
    fn inverted_range_is_dropped() {
        assert_eq!(
            compiled("[z-a]"),
            vec![Inst::Class {
                negated: false,
                chars: vec![],
                ranges: vec![],
            }]
        );
    }
}
