//! Fixed-width, zero-padded UTF-8 string encoding used throughout the wire
//! protocol (§6: 16/32/48/64/256-byte fields).

/// Writes `value` into `out` as a zero-padded field of exactly `width` bytes,
/// truncating to `width` bytes if the UTF-8 encoding is longer.
pub fn write_fixed(out: &mut Vec<u8>, value: &str, width: usize) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(width);
    out.extend_from_slice(&bytes[..len]);
    out.resize(out.len() + (width - len), 0);
}

/// Reads a zero-padded fixed-width field, trimming at the first NUL and
/// lossily decoding whatever remains as UTF-8.
pub fn read_fixed(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Formats a News greeting block: a 64-byte title followed by a 512-byte
/// body, as required by §4.3's 0x2008 handler.
pub fn write_greeting(title: &str, text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(64 + 512);
    write_fixed(&mut out, title, 64);
    write_fixed(&mut out, text, 512);
    out
}
