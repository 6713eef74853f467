use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte range within a source file, used to position issues in reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: u32,
    pub end: u32,
}

impl SourceSpan {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Convert the start offset to a 1-indexed `(line, column)` pair.
    pub fn to_line_col(&self, source: &str) -> (usize, usize) {
        let upto = &source.as_bytes()[..(self.start as usize).min(source.len())];
        let line = upto.iter().filter(|b| **b == b'\n').count() + 1;
        let col = match upto.iter().rposition(|b| *b == b'\n') {
            Some(pos) => upto.len() - pos,
            None => upto.len() + 1,
        };
        (line, col)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_of_offsets() {
        let src = "const a = 1;\nconst b = 2;\n";
        assert_eq!(SourceSpan::new(0, 5).to_line_col(src), (1, 1));
        assert_eq!(SourceSpan::new(13, 18).to_line_col(src), (2, 1));
        assert_eq!(SourceSpan::new(19, 20).to_line_col(src), (2, 7));
    }
}
