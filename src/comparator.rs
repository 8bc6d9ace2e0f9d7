//! Line-oriented trimmed equality of two byte streams (§4.1).

use std::io::BufRead;

use thiserror::Error;

/// Maximum length of a single buffered line, large enough that a pathological
/// test case with one very long line cannot OOM the judge process nor be
/// silently truncated into a false mismatch.
const MAX_LINE_LEN: usize = 1024 * 1024 * 1024;

/// Number of characters of a mismatching line kept in the error message
/// before truncating with `...`.
const TRUNCATE_AT: usize = 256;

/// The two streams differ, or the actual stream has trailing garbage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompareError {
  #[error("outputs differ in line {line}: expected: '{expected}', actual: '{actual}'")]
  LineMismatch {
    line: usize,
    expected: String,
    actual: String,
  },

  #[error("contains additional non-empty lines")]
  TrailingContent,
}

/// Compares `expected` against `actual` as sequences of lines, ignoring
/// trailing `\n\r\t` and space on each line. Lines are read lazily so
/// neither stream need fit in memory.
pub fn compare<E: std::io::Read, A: std::io::Read>(
  expected: E,
  actual: A,
) -> Result<(), CompareError> {
  let mut expected = LineReader::new(expected);
  let mut actual = LineReader::new(actual);

  let mut line_no = 0usize;
  loop {
    let e = expected.next_line();
    let a = actual.next_line();
    match e {
      Some(e) => {
        let a = a.unwrap_or_default();
        let e_trimmed = trim_line(&e);
        let a_trimmed = trim_line(&a);
        if e_trimmed != a_trimmed {
          return Err(CompareError::LineMismatch {
            line: line_no,
            expected: truncate(e_trimmed),
            actual: truncate(a_trimmed),
          });
        }
        line_no += 1;
      }
      None => {
        if let Some(a) = a {
          if !trim_line(&a).is_empty() {
            return Err(CompareError::TrailingContent);
          }
        }
        return Ok(());
      }
    }
  }
}

fn trim_line(s: &str) -> &str {
  s.trim_end_matches(['\n', '\r', '\t', ' '])
}

fn truncate(s: &str) -> String {
  if s.chars().count() > TRUNCATE_AT {
    let mut out: String = s.chars().take(TRUNCATE_AT).collect();
    out.push_str("...");
    out
  } else {
    s.to_string()
  }
}

/// Reads lines lazily from an arbitrary `Read`, bounding how much a single
/// line can grow so a pathological stream cannot exhaust memory.
struct LineReader<R: std::io::Read> {
  inner: std::io::BufReader<R>,
}

impl<R: std::io::Read> LineReader<R> {
  fn new(inner: R) -> Self {
    Self {
      inner: std::io::BufReader::with_capacity(16 * 1024, inner),
    }
  }

  fn next_line(&mut self) -> Option<String> {
    let mut buf = Vec::new();
    let mut total = 0usize;
    loop {
      let available = match self.inner.fill_buf() {
        Ok(b) => b,
        Err(_) => return if buf.is_empty() { None } else { Some(bytes_to_string(buf)) },
      };
      if available.is_empty() {
        return if buf.is_empty() { None } else { Some(bytes_to_string(buf)) };
      }
      if let Some(pos) = available.iter().position(|&b| b == b'\n') {
        buf.extend_from_slice(&available[..=pos]);
        self.inner.consume(pos + 1);
        return Some(bytes_to_string(buf));
      }
      total += available.len();
      buf.extend_from_slice(available);
      let consumed = available.len();
      self.inner.consume(consumed);
      if total >= MAX_LINE_LEN {
        return Some(bytes_to_string(buf));
      }
    }
  }
}

fn bytes_to_string(buf: Vec<u8>) -> String {
  String::from_utf8_lossy(&buf).into_owned()
}
