use std::fmt;

/// A LimitTracker enforces a particular limit within the parser. It keeps
/// track of utilization so that we can report how close to a limit we
/// approached over the lifetime of the tracker.
///
/// ```rust
/// use eql_parser::Parser;
///
/// let query = "get Author where name = 'Mike' and ranking > 3";
/// let parser = Parser::new("test", query).recursion_limit(8);
/// assert!(parser.parse().is_ok());
/// ```
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct LimitTracker {
    current: usize,
    /// High water mark for this limit.
    pub high: usize,
    /// Limit.
    pub limit: usize,
}

impl Default for LimitTracker {
    fn default() -> Self {
        Self {
            current: 0,
            high: 0,
            limit: usize::MAX,
        }
    }
}

impl LimitTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            current: 0,
            high: 0,
            limit,
        }
    }

    pub fn limited(&self) -> bool {
        self.current > self.limit
    }

    pub fn consume(&mut self) {
        self.current += 1;
        if self.current > self.high {
            self.high = self.current;
        }
    }

    /// Undo one `consume`, for depth-style limits.
    pub fn release(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

impl fmt::Debug for LimitTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "limit: {}, high: {}", self.limit, self.high)
    }
}
