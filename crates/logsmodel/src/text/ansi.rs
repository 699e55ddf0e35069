/// ANSI escape code detection and stripping
///
/// Log lines frequently carry ANSI color codes from applications writing
/// colored terminal output. The displayed entry is the stripped text while
/// the raw line keeps the original bytes.

use std::borrow::Cow;

const ESC: u8 = 0x1b;

/// True if the text contains at least one CSI, OSC, or Fe escape sequence.
pub fn has_ansi_codes(input: &str) -> bool {
    let bytes = input.as_bytes();
    if !bytes.contains(&ESC) {
        return false;
    }

    bytes.windows(2).any(|w| {
        w[0] == ESC && (w[1] == b'[' || w[1] == b']' || (0x40..=0x5F).contains(&w[1]))
    })
}

/// Strip ANSI escape codes from text
///
/// Handles:
/// - CSI sequences: `\x1b[...m`
/// - OSC sequences: `\x1b]...` (terminated by BEL or `ESC \`)
/// - Simple Fe sequences (`ESC` + one byte in 0x40-0x5F)
///
/// Returns Cow::Borrowed if no codes were found (zero allocation),
/// or Cow::Owned if stripping occurred.
pub fn strip_ansi_codes(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    if !bytes.contains(&ESC) {
        return Cow::Borrowed(input);
    }

    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == ESC && i + 1 >= bytes.len() {
            // Lone trailing ESC
            i += 1;
            continue;
        }
        if bytes[i] == ESC {
            // CSI: ESC [ ... final byte 0x40-0x7E
            if bytes[i + 1] == b'[' {
                i += 2;
                while i < bytes.len() {
                    let b = bytes[i];
                    i += 1;
                    if (0x40..=0x7E).contains(&b) {
                        break;
                    }
                }
                continue;
            }

            // OSC: ESC ] ... BEL | ESC \
            if bytes[i + 1] == b']' {
                i += 2;
                while i < bytes.len() {
                    if bytes[i] == 0x07 {
                        i += 1;
                        break;
                    }
                    if bytes[i] == ESC && i + 1 < bytes.len() && bytes[i + 1] == b'\\' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
                continue;
            }

            if (0x40..=0x5F).contains(&bytes[i + 1]) {
                i += 2;
                continue;
            }
        }

        output.push(bytes[i]);
        i += 1;
    }

    // Only ASCII bytes are ever skipped, so multi-byte characters stay intact.
    match String::from_utf8(output) {
        Ok(s) => Cow::Owned(s),
        Err(e) => Cow::Owned(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}
