//! Input Feed
//!
//! Sequential cursor over the input lines supplied with a request, consumed
//! by simulated `input()` calls.

/// Returned by [`InputFeed::next`] once every supplied line has been consumed.
pub const INPUT_MISSING: &str = "input_missing";

/// Read-only view over the supplied lines plus a private cursor.
///
/// The runner gets its own copy of the same lines on stdin; the two are not
/// consumed in lockstep.
#[derive(Debug, Clone)]
pub struct InputFeed<'a> {
    inputs: &'a [String],
    cursor: usize,
}

impl<'a> InputFeed<'a> {
    pub fn new(inputs: &'a [String]) -> Self {
        Self { inputs, cursor: 0 }
    }

    /// Next unconsumed line, or [`INPUT_MISSING`] forever once exhausted.
    pub fn next(&mut self) -> String {
        match self.inputs.get(self.cursor) {
            Some(line) => {
                self.cursor += 1;
                line.clone()
            }
            None => INPUT_MISSING.to_string(),
        }
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.inputs.len()
    }
}
