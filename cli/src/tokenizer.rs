use std::ffi::OsString;
use std::mem;
use std::os::unix::ffi::OsStringExt;

/// Split an operator line on ASCII whitespace. A double-quoted substring is
/// kept as one token with the quotes removed; an unterminated quote runs to the
/// end of the line. Bytes outside ASCII are kept as they are.
pub fn tokenize(line: &[u8]) -> Vec<OsString> {
    let mut tokens = Vec::new();
    let mut current = Vec::new();
    let mut in_token = false;
    let mut quoted = false;

    for &byte in line {
        match byte {
            b'"' => {
                quoted = !quoted;
                in_token = true;
            }
            b if b.is_ascii_whitespace() && !quoted => {
                if in_token {
                    tokens.push(OsString::from_vec(mem::take(&mut current)));
                    in_token = false;
                }
            }
            b => {
                current.push(b);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(OsString::from_vec(current));
    }
    tokens
}
