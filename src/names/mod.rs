//! Visitor names and where they are stored.

use std::{fmt, pin::Pin};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod remote;

pub use remote::RemoteNameStore;

/// Text a visitor submitted. Not validated: any string is a name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("name store is not configured (set NAME_TREE_STORE_URL and NAME_TREE_STORE_KEY)")]
    NotConfigured,
    #[error("invalid store url: {0}")]
    InvalidUrl(String),
    #[error("upstream http: {0}")]
    Request(#[from] reqwest::Error),
    #[error("store answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A store round trip. Not `Send`: in the browser it runs on the main thread.
pub type StoreFuture<T> = Pin<Box<dyn Future<Output = Result<T, StoreError>>>>;

/// The remote table of names.
///
/// Every call is an independent round trip; nothing is cached. The returned
/// futures own what they need so they can outlive the store.
pub trait NameStore {
    /// All stored names in the order the store returns them.
    fn list_names(&self) -> StoreFuture<Vec<Name>>;

    /// Append one name.
    fn add_name(&self, name: Name) -> StoreFuture<()>;
}
