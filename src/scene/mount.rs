//! The slot scene sessions attach to.
//!
//! In the browser this is the canvas, natively the window. Only the session
//! attached here may draw or receive resize events.

use std::fmt;

/// Identifies one lifecycle run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(run: u64) -> Self {
        Self(run)
    }

    /// The id of the run after this one.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session #{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct Mount {
    children: Vec<SessionId>,
}

impl Mount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detach everything. Returns the sessions that were attached.
    pub fn clear(&mut self) -> Vec<SessionId> {
        std::mem::take(&mut self.children)
    }

    pub fn attach(&mut self, id: SessionId) {
        self.children.push(id);
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_attached(&self, id: SessionId) -> bool {
        self.children.contains(&id)
    }
}
