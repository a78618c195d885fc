//! ANSI escape handling for device log lines.
//!
//! ESP-IDF colours every log line, e.g. `"\x1b[0;32mI (1234) wifi: got ip\x1b[0m"`. The dashboard
//! drops that framing with a fixed-width trim; [`strip_ansi`] removes escapes wherever they are.

const ESC: char = '\x1b';
const BEL: char = '\x07';

/// Characters dropped from the front of a framed log line.
pub const FRAME_PREFIX_LEN: usize = 9;
/// Characters dropped from the end of a framed log line.
pub const FRAME_SUFFIX_LEN: usize = 5;

/// Drop the first 9 and last 5 characters of a log frame.
///
/// Counts characters, not bytes. Input shorter than the frame yields an empty string.
pub fn trim_log_frame(value: &str) -> String {
    let len = value.chars().count();
    if len <= FRAME_PREFIX_LEN + FRAME_SUFFIX_LEN {
        return String::new();
    }
    value
        .chars()
        .skip(FRAME_PREFIX_LEN)
        .take(len - FRAME_PREFIX_LEN - FRAME_SUFFIX_LEN)
        .collect()
}

/// Remove ANSI escape sequences, keeping every other character (newlines and tabs included).
///
/// ```
/// assert_eq!(axe_ansi::strip_ansi("\x1b[0;33mW (9) temp\x1b[0m"), "W (9) temp");
/// ```
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != ESC {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            // CSI: parameters and intermediates, then a final byte in 0x40..=0x7e
            Some('[') => {
                chars.next();
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        break;
                    }
                }
            }
            // OSC: terminated by BEL or ST (ESC \)
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == BEL {
                        break;
                    }
                    if c == ESC && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            Some(next) if next.is_ascii() => {
                chars.next();
            }
            // lone ESC, or ESC before a multibyte char
            _ => {}
        }
    }
    out
}

/// Strip escapes and trailing whitespace (including CR/LF) from one log line.
pub fn clean_log_line(line: &str) -> String {
    let mut s = strip_ansi(line);
    let keep = s.trim_end().len();
    s.truncate(keep);
    s
}
