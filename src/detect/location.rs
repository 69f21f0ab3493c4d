/// A utility struct to convert byte offsets to line and column numbers.
///
/// The regex engine works with byte offsets, but findings are reported
/// with 1-based line and column coordinates.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Stores the byte index of the start of each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Creates a new `LineIndex` by scanning the source for newlines.
    /// Byte iteration is enough: '\n' is always a single byte in UTF-8.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.as_bytes().iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Converts a byte offset to a 1-indexed line number.
    #[must_use]
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }

    /// Byte index at which the given 1-indexed line begins.
    #[must_use]
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts[line.saturating_sub(1).min(self.line_starts.len() - 1)]
    }

    /// Converts a byte offset to a 1-indexed column within its line.
    #[must_use]
    pub fn column_of(&self, offset: usize) -> usize {
        offset - self.line_start(self.line_of(offset)) + 1
    }
}
