use std::borrow::Cow;

fn is_stripped(c: char) -> bool {
    c == '\u{7f}' || (c.is_control() && c != '\t' && c != '\n' && c != '\r')
}

/// Strips control characters and ANSI escape sequences from a string.
///
/// CSI sequences (`ESC [` … final byte) and OSC sequences (`ESC ]` … BEL/ST)
/// are removed whole; other C0 controls and DEL are dropped individually,
/// while tab, newline and carriage return survive. Category names come from
/// API metadata and assistant output, neither of which should be able to
/// smuggle escape sequences into a terminal.
///
/// Returns `Cow::Borrowed` when the input is already clean.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            match chars.peek() {
                // CSI: parameter/intermediate bytes until a final byte in 0x40–0x7e.
                Some('[') => {
                    chars.next();
                    for d in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&d) {
                            break;
                        }
                    }
                }
                // OSC: everything until BEL or ST (ESC \).
                Some(']') => {
                    chars.next();
                    while let Some(d) = chars.next() {
                        if d == '\u{07}' {
                            break;
                        }
                        if d == '\u{1b}' {
                            if chars.peek() == Some(&'\\') {
                                chars.next();
                            }
                            break;
                        }
                    }
                }
                // Bare ESC: dropped.
                _ => {}
            }
        } else if !is_stripped(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}
