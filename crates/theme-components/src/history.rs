//! Session history seam.

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};
use theme_core::SearchParams;

/// State object pushed with every filter/sort change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    #[serde(rename = "searchParams")]
    pub search_params: String,
}

impl HistoryState {
    pub fn new(params: &SearchParams) -> Self {
        Self {
            search_params: params.to_query_string(),
        }
    }

    pub fn params(&self) -> SearchParams {
        SearchParams::parse(&self.search_params)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The browser's session history.
pub trait BrowserHistory {
    /// Push a new entry; forward entries are discarded.
    fn push_state(&self, state: HistoryState, url: &str);

    /// URL of the current entry (path plus query).
    fn current_url(&self) -> String;
}

#[derive(Debug, Clone)]
struct Entry {
    state: Option<HistoryState>,
    url: String,
}

/// In-memory history stack. `back` and `forward` return the state that a
/// `popstate` event would carry.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: RefCell<Vec<Entry>>,
    index: Cell<usize>,
    pushes: Cell<usize>,
}

impl MemoryHistory {
    /// Start with a single entry for `url` and no state.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            entries: RefCell::new(vec![Entry {
                state: None,
                url: url.into(),
            }]),
            index: Cell::new(0),
            pushes: Cell::new(0),
        }
    }

    /// Step back. None when already at the first entry.
    pub fn back(&self) -> Option<Option<HistoryState>> {
        let index = self.index.get().checked_sub(1)?;
        self.index.set(index);
        Some(self.entries.borrow()[index].state.clone())
    }

    /// Step forward. None when already at the last entry.
    pub fn forward(&self) -> Option<Option<HistoryState>> {
        let index = self.index.get() + 1;
        let entries = self.entries.borrow();
        let entry = entries.get(index)?;
        self.index.set(index);
        Some(entry.state.clone())
    }

    /// Number of `push_state` calls so far.
    pub fn push_count(&self) -> usize {
        self.pushes.get()
    }

    /// Number of entries in the stack.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// State of the current entry.
    pub fn current_state(&self) -> Option<HistoryState> {
        self.entries.borrow()[self.index.get()].state.clone()
    }
}

impl BrowserHistory for MemoryHistory {
    fn push_state(&self, state: HistoryState, url: &str) {
        let mut entries = self.entries.borrow_mut();
        entries.truncate(self.index.get() + 1);
        entries.push(Entry {
            state: Some(state),
            url: url.to_string(),
        });
        self.index.set(entries.len() - 1);
        self.pushes.set(self.pushes.get() + 1);
    }

    fn current_url(&self) -> String {
        self.entries.borrow()[self.index.get()].url.clone()
    }
}
