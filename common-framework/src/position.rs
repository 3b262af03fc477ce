use std::fmt;

/// A unit of input consumed one at a time by the engine.
///
/// The trait only tells [`Position`] how far a token moves the cursor. Token
/// types that carry no layout information can rely on the defaults: every
/// token is one unit wide and none of them start a new line.
pub trait Token {
    /// Returns true if this token ends a line.
    fn is_newline(&self) -> bool {
        false
    }

    /// Returns the number of offset units this token occupies.
    fn width(&self) -> usize {
        1
    }
}

impl Token for char {
    fn is_newline(&self) -> bool {
        *self == '\n'
    }

    fn width(&self) -> usize {
        self.len_utf8()
    }
}

impl Token for u8 {
    fn is_newline(&self) -> bool {
        *self == b'\n'
    }
}

/// Represents a token boundary in the input.
///
/// `index` counts the tokens consumed so far and is the part the engine keys
/// its memo tables on. `line`, `column` and `offset` are diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Number of tokens consumed before this position
    pub index: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Offset from the start of the input, in token width units
    pub offset: usize,
}

impl Position {
    /// Creates a new position at the start of the input.
    pub fn new() -> Self {
        Self {
            index: 0,
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Creates a position with the given values and no tokens consumed.
    pub fn at(line: usize, column: usize, offset: usize) -> Self {
        Self {
            index: 0,
            line,
            column,
            offset,
        }
    }

    /// Returns the position after consuming `token`.
    pub fn next<T: Token + ?Sized>(&self, token: &T) -> Self {
        let (line, column) = if token.is_newline() {
            (self.line + 1, 1)
        } else {
            (self.line, self.column + 1)
        };
        Self {
            index: self.index + 1,
            line,
            column,
            offset: self.offset + token.width(),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Word;

    impl Token for Word {}

    #[test]
    fn test_position_new() {
        let pos = Position::new();
        assert_eq!(pos.index, 0);
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.offset, 0);
    }

    #[test]
    fn test_position_at() {
        let pos = Position::at(5, 10, 100);
        assert_eq!(pos.index, 0);
        assert_eq!(pos.line, 5);
        assert_eq!(pos.column, 10);
        assert_eq!(pos.offset, 100);
    }

    #[test]
    fn test_position_default() {
        assert_eq!(Position::default(), Position::new());
    }

    #[test]
    fn test_next_char_tracks_lines() {
        let pos = Position::new().next(&'a').next(&'\n').next(&'é');
        assert_eq!(pos.index, 3);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 2);
        assert_eq!(pos.offset, 4);
    }

    #[test]
    fn test_next_does_not_mutate() {
        let start = Position::new();
        let after = start.next(&b'x');
        assert_eq!(start, Position::new());
        assert_eq!(after.index, 1);
        assert_eq!(after.offset, 1);
    }

    #[test]
    fn test_default_token_width() {
        let pos = Position::new().next(&Word).next(&Word);
        assert_eq!(pos.index, 2);
        assert_eq!(pos.column, 3);
        assert_eq!(pos.offset, 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::at(3, 7, 20).to_string(), "3:7");
    }
}
