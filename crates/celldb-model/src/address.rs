use core::fmt;

use serde::{Deserialize, Serialize};

/// Highest column count an A1 reference may name (`XFD`).
pub const MAX_COLS: u32 = 16_384;
/// Highest 1-based row an A1 reference may name.
pub const MAX_ROWS: u32 = 1_048_576;

/// A single cell position, 0-indexed on both axes: `A1` is `(row 0, col 0)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Render in A1 notation, e.g. `D4` or `AA10`.
    pub fn to_a1(self) -> String {
        format!("{}{}", col_to_name(self.col), self.row + 1)
    }

    /// Parse A1 notation. `$` anchors are accepted and ignored, and column
    /// letters are case-insensitive.
    pub fn from_a1(a1: &str) -> Result<Self, A1ParseError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(A1ParseError::Empty);
        }

        let s = s.strip_prefix('$').unwrap_or(s);
        let letters_end = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(s.len());
        let (letters, rest) = s.split_at(letters_end);
        if letters.is_empty() {
            return Err(A1ParseError::MissingColumn);
        }

        let digits = rest.strip_prefix('$').unwrap_or(rest);
        if digits.is_empty() {
            return Err(A1ParseError::MissingRow);
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(A1ParseError::TrailingCharacters);
        }

        let col = name_to_col(letters)?;
        if col >= MAX_COLS {
            return Err(A1ParseError::InvalidColumn);
        }
        let row: u32 = digits.parse().map_err(|_| A1ParseError::InvalidRow)?;
        if row == 0 || row > MAX_ROWS {
            return Err(A1ParseError::InvalidRow);
        }
        Ok(Self::new(row - 1, col))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// An inclusive rectangle of cells, kept normalized so that `start` is the
/// top-left corner and `end` the bottom-right one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: CellRef,
    pub end: CellRef,
}

impl Range {
    /// Build a range from any two corners.
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    #[inline]
    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    #[inline]
    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    /// Parse `B2:D4`, or a bare cell like `C3` as a one-cell range.
    pub fn from_a1(a1: &str) -> Result<Self, RangeParseError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(RangeParseError::Empty);
        }
        match s.split_once(':') {
            Some((a, b)) => Ok(Range::new(
                CellRef::from_a1(a).map_err(RangeParseError::Cell)?,
                CellRef::from_a1(b).map_err(RangeParseError::Cell)?,
            )),
            None => {
                let cell = CellRef::from_a1(s).map_err(RangeParseError::Cell)?;
                Ok(Range::new(cell, cell))
            }
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

/// Why an A1 cell reference failed to parse.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum A1ParseError {
    Empty,
    MissingColumn,
    MissingRow,
    InvalidColumn,
    InvalidRow,
    TrailingCharacters,
}

impl fmt::Display for A1ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            A1ParseError::Empty => "empty A1 reference",
            A1ParseError::MissingColumn => "A1 reference has no column letters",
            A1ParseError::MissingRow => "A1 reference has no row number",
            A1ParseError::InvalidColumn => "column is out of range",
            A1ParseError::InvalidRow => "row is out of range",
            A1ParseError::TrailingCharacters => "unexpected characters after the row number",
        })
    }
}

impl std::error::Error for A1ParseError {}

/// Why an A1 range failed to parse.
#[derive(Debug)]
pub enum RangeParseError {
    Empty,
    Cell(A1ParseError),
}

impl fmt::Display for RangeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeParseError::Empty => f.write_str("empty A1 range"),
            RangeParseError::Cell(e) => write!(f, "bad cell reference in range: {e}"),
        }
    }
}

impl std::error::Error for RangeParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RangeParseError::Empty => None,
            RangeParseError::Cell(e) => Some(e),
        }
    }
}

/// 0-based column index to letters: `0 -> A`, `25 -> Z`, `26 -> AA`.
///
/// This is bijective base-26: there is no zero digit, so `Z` carries into
/// `AA` rather than `A0`.
pub fn col_to_name(col: u32) -> String {
    let mut n = col + 1;
    let mut out = String::new();
    while n > 0 {
        n -= 1;
        out.insert(0, char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    out
}

/// Letters back to the 0-based column index. Exact inverse of
/// [`col_to_name`]; rejects empty input, non-letters and overflow.
pub fn name_to_col(letters: &str) -> Result<u32, A1ParseError> {
    if letters.is_empty() {
        return Err(A1ParseError::InvalidColumn);
    }
    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(A1ParseError::InvalidColumn);
        }
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        col = col
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or(A1ParseError::InvalidColumn)?;
    }
    Ok(col - 1)
}
