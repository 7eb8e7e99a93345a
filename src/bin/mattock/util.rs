use mattock::consts::{FIELD_MARK, SUBVALUE_MARK, VALUE_MARK};

/// Printable form of a key or value: delimiter marks shown as `^`, `]`, `\`,
/// everything else decoded lossily as UTF-8.
pub fn display_text(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.split_inclusive(|b| matches!(*b, FIELD_MARK | VALUE_MARK | SUBVALUE_MARK)) {
        let (body, mark) = match chunk.last() {
            Some(&FIELD_MARK) => (&chunk[..chunk.len() - 1], Some('^')),
            Some(&VALUE_MARK) => (&chunk[..chunk.len() - 1], Some(']')),
            Some(&SUBVALUE_MARK) => (&chunk[..chunk.len() - 1], Some('\\')),
            _ => (chunk, None),
        };
        out.push_str(&String::from_utf8_lossy(body));
        if let Some(m) = mark {
            out.push(m);
        }
    }
    out
}

pub fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}
