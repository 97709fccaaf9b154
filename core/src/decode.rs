//! String interior decoding.
//!
//! A single walker serves both classification (measuring a string's
//! decoded length without emitting) and chunk delivery (decoding into the
//! decode buffer). Escape handling is tolerant: an unknown escape letter
//! yields the literal following character, `\u` consumes up to four hex
//! digits, and unpaired surrogates decode to U+FFFD. A high/low surrogate
//! escape pair recombines into the supplementary-plane scalar, since Rust
//! strings cannot hold unpaired code units.
//!
//! An escape that would straddle the end of the available input is
//! deferred: the walk stops with the unread `\` first in the remainder, so
//! the scanner can refill and restart the escape whole.

/// Result of walking a string interior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WalkOutcome {
    /// Bytes consumed from the input, including the closing quote when
    /// `ended` is set by one.
    pub consumed: usize,
    /// Decoded characters produced (or counted, in measurement mode).
    pub chars: usize,
    /// True once the closing quote was consumed.
    pub ended: bool,
    pub has_escapes: bool,
}

/// Walks string-interior text starting just past an opening quote (or
/// mid-interior), decoding into `dst` when given, until the closing quote,
/// the end of `src`, or `char_limit` produced characters.
///
/// `done` means no input exists beyond `src`; it disables escape deferral
/// and lets truncated escapes decode tolerantly.
pub(crate) fn walk_interior(
    src: &str,
    mut dst: Option<&mut String>,
    char_limit: usize,
    done: bool,
) -> WalkOutcome {
    let bytes = src.as_bytes();
    let mut out = WalkOutcome {
        consumed: 0,
        chars: 0,
        ended: false,
        has_escapes: false,
    };

    let mut emit = |c: char, dst: &mut Option<&mut String>, out: &mut WalkOutcome| {
        if let Some(s) = dst.as_deref_mut() {
            s.push(c);
        }
        out.chars += 1;
    };

    while out.consumed < bytes.len() {
        if out.chars >= char_limit {
            return out;
        }
        let b = bytes[out.consumed];
        match b {
            b'"' => {
                out.consumed += 1;
                out.ended = true;
                return out;
            }
            b'\\' => {
                out.has_escapes = true;
                match scan_escape(&src[out.consumed..], done) {
                    EscapeScan::Decoded { consumed, c } => {
                        emit(c, &mut dst, &mut out);
                        out.consumed += consumed;
                    }
                    EscapeScan::Empty { consumed } => {
                        out.consumed += consumed;
                    }
                    EscapeScan::Defer => return out,
                }
            }
            _ => {
                // Plain character; multi-byte sequences pass through whole.
                let c = src[out.consumed..].chars().next().unwrap_or('\u{FFFD}');
                emit(c, &mut dst, &mut out);
                out.consumed += c.len_utf8();
            }
        }
    }
    out
}

enum EscapeScan {
    /// The escape decoded to one character.
    Decoded { consumed: usize, c: char },
    /// The escape consumed input but produced nothing (truncated at EOF).
    Empty { consumed: usize },
    /// Not enough input to decode the escape whole; retry after a refill.
    Defer,
}

/// Scans one escape sequence at the start of `src` (which begins with
/// `\`). Recombines surrogate escape pairs, so it may consume two
/// sequences at once.
fn scan_escape(src: &str, done: bool) -> EscapeScan {
    let bytes = src.as_bytes();
    let Some(&letter) = bytes.get(1) else {
        // Lone backslash at the end of input.
        return if done { EscapeScan::Empty { consumed: 1 } } else { EscapeScan::Defer };
    };
    let simple = |c: char| EscapeScan::Decoded { consumed: 2, c };
    match letter {
        b'"' => simple('"'),
        b'\\' => simple('\\'),
        b'/' => simple('/'),
        b'b' => simple('\u{0008}'),
        b'f' => simple('\u{000C}'),
        b'r' => simple('\r'),
        b'n' => simple('\n'),
        b't' => simple('\t'),
        b'u' => scan_unicode_escape(src, done),
        _ => {
            // Unknown escape letter: the following character stands for
            // itself, multi-byte included.
            let c = src[1..].chars().next().unwrap_or('\u{FFFD}');
            EscapeScan::Decoded {
                consumed: 1 + c.len_utf8(),
                c,
            }
        }
    }
}

fn scan_unicode_escape(src: &str, done: bool) -> EscapeScan {
    let (code, consumed) = match scan_hex(src, done) {
        Some(pair) => pair,
        None => return EscapeScan::Defer,
    };
    match code {
        0xD800..=0xDBFF => {
            // High surrogate: recombine with a following low-surrogate
            // escape when one is present.
            let rest = &src[consumed..];
            if rest.len() < 2 && !done {
                return EscapeScan::Defer;
            }
            if rest.as_bytes().first() == Some(&b'\\') && rest.as_bytes().get(1) == Some(&b'u') {
                let (low, low_consumed) = match scan_hex(rest, done) {
                    Some(pair) => pair,
                    None => return EscapeScan::Defer,
                };
                if (0xDC00..=0xDFFF).contains(&low) {
                    let scalar =
                        0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    return EscapeScan::Decoded {
                        consumed: consumed + low_consumed,
                        c: char::from_u32(scalar).unwrap_or('\u{FFFD}'),
                    };
                }
                // The next escape is not a partner; leave it unconsumed.
            }
            EscapeScan::Decoded { consumed, c: '\u{FFFD}' }
        }
        0xDC00..=0xDFFF => EscapeScan::Decoded { consumed, c: '\u{FFFD}' },
        _ => EscapeScan::Decoded {
            consumed,
            c: char::from_u32(code).unwrap_or('\u{FFFD}'),
        },
    }
}

/// Parses the `\uXXXX` at the start of `src`: up to four hex digits, fewer
/// when the input ends first (tolerant) or a non-hex character appears.
/// Returns `None` when more digits could still arrive.
fn scan_hex(src: &str, done: bool) -> Option<(u32, usize)> {
    let bytes = src.as_bytes();
    let mut code: u32 = 0;
    let mut used = 2; // the `\u`
    while used < bytes.len() && used < 6 {
        match (bytes[used] as char).to_digit(16) {
            Some(d) => {
                code = code * 16 + d;
                used += 1;
            }
            None => return Some((code, used)),
        }
    }
    if used < 6 && !done {
        // The remaining digits may still be on their way.
        return None;
    }
    Some((code, used))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(src: &str) -> (String, WalkOutcome) {
        let mut out = String::new();
        let outcome = walk_interior(src, Some(&mut out), usize::MAX, true);
        (out, outcome)
    }

    #[test]
    fn plain_text_until_quote() {
        let (s, outcome) = decode_all("hello\" tail");
        assert_eq!(s, "hello");
        assert!(outcome.ended);
        assert_eq!(outcome.consumed, 6);
        assert!(!outcome.has_escapes);
    }

    #[test]
    fn simple_escapes() {
        let (s, outcome) = decode_all(r#"a\nb\t\"c\\\/"#);
        assert_eq!(s, "a\nb\t\"c\\/");
        assert!(outcome.has_escapes);
        assert!(!outcome.ended);
    }

    #[test]
    fn unknown_escape_is_literal() {
        let (s, _) = decode_all(r"a\qb");
        assert_eq!(s, "aqb");
    }

    #[test]
    fn unicode_escape() {
        let (s, _) = decode_all("\\u0041\\u00e9");
        assert_eq!(s, "Aé");
    }

    #[test]
    fn short_hex_at_eof_is_tolerated() {
        let (s, _) = decode_all(r"\u41");
        assert_eq!(s, "A");
    }

    #[test]
    fn surrogate_pair_recombines() {
        let (s, _) = decode_all("\\uD83D\\uDE00");
        assert_eq!(s, "\u{1F600}");
    }

    #[test]
    fn lone_surrogates_are_replaced() {
        let (s, _) = decode_all(r"\uD800x");
        assert_eq!(s, "\u{FFFD}x");
        let (s, _) = decode_all(r"\uDC00x");
        assert_eq!(s, "\u{FFFD}x");
        // High surrogate followed by a non-partner escape: both survive.
        let (s, _) = decode_all(r"\uD800A");
        assert_eq!(s, "\u{FFFD}A");
    }

    #[test]
    fn incomplete_escape_defers_mid_stream() {
        let mut out = String::new();
        let outcome = walk_interior(r"ab\u00", Some(&mut out), usize::MAX, false);
        assert_eq!(out, "ab");
        assert_eq!(outcome.consumed, 2);
        assert!(!outcome.ended);
    }

    #[test]
    fn high_surrogate_waits_for_partner() {
        let mut out = String::new();
        let outcome = walk_interior(r"x\uD83D", Some(&mut out), usize::MAX, false);
        assert_eq!(out, "x");
        assert_eq!(outcome.consumed, 1);
    }

    #[test]
    fn char_limit_stops_cleanly() {
        let mut out = String::new();
        let outcome = walk_interior("abcdef", Some(&mut out), 3, false);
        assert_eq!(out, "abc");
        assert_eq!(outcome.consumed, 3);
    }

    #[test]
    fn measurement_mode_counts() {
        let outcome = walk_interior(r#"aA\n""#, None, usize::MAX, true);
        assert_eq!(outcome.chars, 3);
        assert!(outcome.ended);
        assert!(outcome.has_escapes);
    }

    #[test]
    fn trailing_backslash_at_eof() {
        let (s, outcome) = decode_all("ab\\");
        assert_eq!(s, "ab");
        assert_eq!(outcome.consumed, 3);
    }
}
