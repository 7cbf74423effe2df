//! Coordinate conversions.
//!
//! Two notations are supported:
//! - Human coordinates such as `"D4"`: columns A-Z skipping `I`, rows
//!   counted from the bottom edge.
//! - SGF point letters such as `"dd"`: column then row, both from the
//!   top-left corner.

use crate::board::Vertex;

/// Parse a human coordinate (e.g. `"D4"`) on a board of `size`.
///
/// Returns `None` for passes, malformed input or points off the board.
pub fn parse_coord(s: &str, size: usize) -> Option<Vertex> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("pass") {
        return None;
    }

    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return None;
    }

    let col_char = bytes[0].to_ascii_uppercase();
    if !col_char.is_ascii_uppercase() || col_char == b'I' {
        return None;
    }
    let mut col = (col_char - b'A') as usize;
    // Skip 'I' column (Go convention to avoid confusion with 'J')
    if col_char > b'I' {
        col -= 1;
    }

    let row: usize = s[1..].parse().ok()?;
    if col >= size || row == 0 || row > size {
        return None;
    }
    Some(Vertex::new(col, size - row))
}

/// Convert a vertex to a human coordinate (e.g. `"D4"`).
pub fn str_coord(v: Vertex, size: usize) -> String {
    let mut c = b'A' + v.x as u8;
    if c >= b'I' {
        c += 1;
    }
    format!("{}{}", c as char, size - v.y)
}

/// Parse an SGF point (`"dd"`). An empty value or `"tt"` on boards up to
/// 19x19 is a pass and yields `Ok(None)`.
pub fn parse_sgf_point(s: &str, size: usize) -> Result<Option<Vertex>, String> {
    if s.is_empty() || (s == "tt" && size <= 19) {
        return Ok(None);
    }
    let bytes = s.as_bytes();
    if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_lowercase) {
        return Err(s.to_string());
    }
    let v = Vertex::new((bytes[0] - b'a') as usize, (bytes[1] - b'a') as usize);
    if v.x >= size || v.y >= size {
        return Err(s.to_string());
    }
    Ok(Some(v))
}
