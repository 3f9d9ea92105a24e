//! Names known to the view and the name being typed.

use crate::names::{Name, StoreError};

#[derive(Debug, Default)]
pub struct NameBoard {
    names: Vec<Name>,
    pending: String,
    loaded: bool,
}

impl NameBoard {
    pub fn names(&self) -> &[Name] {
        &self.names
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Whether the initial fetch has resolved, successfully or not.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn set_pending(&mut self, text: impl Into<String>) {
        self.pending = text.into();
    }

    pub fn push_str(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    pub fn pop_char(&mut self) -> Option<char> {
        self.pending.pop()
    }

    /// Take the pending text as a new name.
    ///
    /// Empty input is a no-op. Anything else, whitespace included, is appended
    /// to the local list, the input is cleared and the name is returned for the
    /// caller to store remotely.
    pub fn submit(&mut self) -> Option<Name> {
        if self.pending.is_empty() {
            return None;
        }
        let name = Name::new(std::mem::take(&mut self.pending));
        self.names.push(name.clone());
        Some(name)
    }

    /// Replace the local list with the fetched one.
    ///
    /// A failed fetch is logged and leaves the list empty.
    pub fn apply_loaded(&mut self, fetched: Result<Vec<Name>, StoreError>) {
        match fetched {
            Ok(names) => {
                log::info!("loaded {} name(s)", names.len());
                self.names = names;
            }
            Err(e) => {
                log::error!("could not fetch names: {e}");
                self.names.clear();
            }
        }
        self.loaded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_appends_and_clears() {
        let mut board = NameBoard::default();
        board.set_pending("Ana");

        assert_eq!(board.submit(), Some(Name::from("Ana")));
        assert_eq!(board.names(), &[Name::from("Ana")]);
        assert_eq!(board.pending(), "");
    }

    #[test]
    fn empty_submit_is_a_no_op() {
        let mut board = NameBoard::default();
        assert_eq!(board.submit(), None);
        assert!(board.names().is_empty());
    }

    #[test]
    fn whitespace_is_a_name() {
        let mut board = NameBoard::default();
        board.set_pending("  ");
        assert_eq!(board.submit(), Some(Name::from("  ")));
    }

    #[test]
    fn typing_edits_pending_text() {
        let mut board = NameBoard::default();
        board.push_str("Lu");
        board.push_str("z");
        assert_eq!(board.pop_char(), Some('z'));
        assert_eq!(board.pending(), "Lu");
    }

    #[test]
    fn fetch_replaces_local_names() {
        let mut board = NameBoard::default();
        board.set_pending("early");
        board.submit();

        board.apply_loaded(Ok(vec![Name::from("A"), Name::from("B")]));

        assert!(board.is_loaded());
        assert_eq!(board.names(), &[Name::from("A"), Name::from("B")]);
    }

    #[test]
    fn failed_fetch_leaves_an_empty_list() {
        let mut board = NameBoard::default();
        board.apply_loaded(Err(StoreError::NotConfigured));

        assert!(board.is_loaded());
        assert!(board.names().is_empty());
    }
}
