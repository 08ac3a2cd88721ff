//! Cell clipboard. Every copy replaces the whole buffer.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    entries: Vec<String>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `entries`, in order.
    pub fn replace(&mut self, entries: impl IntoIterator<Item = String>) {
        self.entries = entries.into_iter().collect();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
