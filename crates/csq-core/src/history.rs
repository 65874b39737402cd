//! Location history: the terminal stand-in for the browser address bar
//!
//! Every distinct search location is pushed as one entry. Writing the
//! location that is already current is a no-op, and pushing after going
//! back discards the forward entries, as a browser does.

/// Linear history of location strings with a cursor.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
}

impl History {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            cursor: 0,
        }
    }

    /// The location currently shown.
    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Record a new location. Returns false if it equals the current one.
    pub fn push(&mut self, location: impl Into<String>) -> bool {
        let location = location.into();
        if self.current() == Some(location.as_str()) {
            return false;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(location);
        self.cursor = self.entries.len() - 1;
        true
    }

    pub fn back(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_ignores_same_location() {
        let mut history = History::new("/search");
        assert!(history.push("/search?q=heap"));
        assert!(!history.push("/search?q=heap"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_back_and_forward() {
        let mut history = History::new("/search");
        history.push("/search?q=a");
        history.push("/search?q=b");

        assert_eq!(history.back(), Some("/search?q=a"));
        assert_eq!(history.back(), Some("/search"));
        assert_eq!(history.back(), None);
        assert_eq!(history.forward(), Some("/search?q=a"));
        assert_eq!(history.forward(), Some("/search?q=b"));
        assert_eq!(history.forward(), None);
    }

    #[test]
    fn test_push_after_back_drops_forward_entries() {
        let mut history = History::new("/search");
        history.push("/search?q=a");
        history.push("/search?q=b");
        history.back();

        history.push("/search?q=c");
        assert_eq!(history.len(), 3);
        assert_eq!(history.forward(), None);
        assert_eq!(history.back(), Some("/search?q=a"));
    }

    #[test]
    fn test_empty_history_push() {
        let mut history = History::default();
        assert!(history.is_empty());
        assert!(history.push("/search?q=x"));
        assert_eq!(history.current(), Some("/search?q=x"));
    }
}
