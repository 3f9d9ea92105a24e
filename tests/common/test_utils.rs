use std::{cell::RefCell, rc::Rc};

use name_tree::{
    names::{Name, NameStore, StoreError, StoreFuture},
    scene::RandomSource,
};

/// An in-memory name table that records every call.
#[derive(Clone, Default)]
pub(crate) struct FakeStore {
    rows: Rc<RefCell<Vec<Name>>>,
    calls: Rc<RefCell<Calls>>,
    failing: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Calls {
    pub list: u32,
    pub add: u32,
}

impl FakeStore {
    pub fn with_rows(rows: &[&str]) -> Self {
        let store = Self::default();
        store.rows.borrow_mut().extend(rows.iter().copied().map(Name::from));
        store
    }

    /// A store whose every call fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Calls {
        *self.calls.borrow()
    }

    pub fn rows(&self) -> Vec<Name> {
        self.rows.borrow().clone()
    }
}

impl NameStore for FakeStore {
    fn list_names(&self) -> StoreFuture<Vec<Name>> {
        self.calls.borrow_mut().list += 1;
        let result = if self.failing {
            Err(StoreError::NotConfigured)
        } else {
            Ok(self.rows())
        };
        Box::pin(async move { result })
    }

    fn add_name(&self, name: Name) -> StoreFuture<()> {
        self.calls.borrow_mut().add += 1;
        let result = if self.failing {
            Err(StoreError::Status {
                status: 500,
                body: "insert failed".to_string(),
            })
        } else {
            self.rows.borrow_mut().push(name);
            Ok(())
        };
        Box::pin(async move { result })
    }
}

/// Replays a fixed list of samples, wrapping around.
pub(crate) struct SequenceRng {
    samples: Vec<f32>,
    next: usize,
}

impl SequenceRng {
    pub fn new(samples: &[f32]) -> Self {
        Self {
            samples: samples.to_vec(),
            next: 0,
        }
    }
}

impl RandomSource for SequenceRng {
    fn next_unit(&mut self) -> f32 {
        let sample = self.samples[self.next % self.samples.len()];
        self.next += 1;
        sample
    }
}

pub(crate) fn names(names: &[&str]) -> Vec<Name> {
    names.iter().copied().map(Name::from).collect()
}
