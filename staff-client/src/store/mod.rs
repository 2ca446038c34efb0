//! Resource stores
//!
//! Each store caches the last server-confirmed list of one resource type
//! together with loading/error flags. Writes always go to the server first;
//! the cached list is patched from the server's answer.
//!
//! Search results never overwrite the canonical list. They live in a
//! separate view that `reset_search` (or a blank search) drops again.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use shared::models::{Department, Employee};
use tokio::sync::watch;

use crate::ClientResult;

pub mod department;
pub mod employee;

pub use department::{DepartmentStatistics, DepartmentStore, DepartmentView};
pub use employee::{EmployeeStatistics, EmployeeStore};

/// Entities addressed by a numeric id
pub trait Keyed {
    fn key(&self) -> i64;
}

impl Keyed for Employee {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for Department {
    fn key(&self) -> i64 {
        self.id
    }
}

/// Snapshot of a store
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    /// Last server-confirmed list
    pub items: Vec<T>,
    /// Transient search view, `None` when no search is active
    pub search_results: Option<Vec<T>>,
    pub loading: bool,
    pub error: Option<String>,
    pending: usize,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            search_results: None,
            loading: false,
            error: None,
            pending: 0,
        }
    }
}

impl<T: Keyed> ResourceState<T> {
    /// What a list view should display
    pub fn visible(&self) -> &[T] {
        self.search_results.as_deref().unwrap_or(&self.items)
    }

    pub fn is_searching(&self) -> bool {
        self.search_results.is_some()
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|item| item.key() == id)
    }

    fn begin(&mut self) {
        self.pending += 1;
        self.loading = true;
        self.error = None;
    }

    fn finish(&mut self) {
        self.pending = self.pending.saturating_sub(1);
        self.loading = self.pending > 0;
    }

    pub(crate) fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.search_results = None;
    }

    /// Add a newly created entity; an id already present is replaced instead
    pub(crate) fn insert(&mut self, item: T) {
        match self.items.iter_mut().find(|e| e.key() == item.key()) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Replace the entry with the same id in place, in both views
    pub(crate) fn replace(&mut self, item: T)
    where
        T: Clone,
    {
        let id = item.key();
        if let Some(results) = self.search_results.as_mut()
            && let Some(existing) = results.iter_mut().find(|e| e.key() == id)
        {
            *existing = item.clone();
        }
        if let Some(existing) = self.items.iter_mut().find(|e| e.key() == id) {
            *existing = item;
        }
    }

    /// Drop the entry with this id from both views
    pub(crate) fn remove(&mut self, id: i64) {
        self.items.retain(|e| e.key() != id);
        if let Some(results) = self.search_results.as_mut() {
            results.retain(|e| e.key() != id);
        }
    }
}

/// Independent streams of list-replacing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lane {
    /// Full list fetches
    List,
    /// Search views
    Search,
}

/// Shared state cell behind every store
///
/// Holds the state in a `watch` channel so views can subscribe, plus one
/// generation counter per [`Lane`]: an operation only applies its result
/// if no newer operation on the same lane started in the meantime.
#[derive(Debug)]
pub(crate) struct ResourceCell<T> {
    state: watch::Sender<ResourceState<T>>,
    generations: [AtomicU64; 2],
}

impl<T: Keyed + Clone> ResourceCell<T> {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            state,
            generations: [AtomicU64::new(0), AtomicU64::new(0)],
        }
    }

    pub(crate) fn snapshot(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.subscribe()
    }

    pub(crate) fn modify(&self, f: impl FnOnce(&mut ResourceState<T>)) {
        self.state.send_modify(f);
    }

    fn counter(&self, lane: Lane) -> &AtomicU64 {
        match lane {
            Lane::List => &self.generations[0],
            Lane::Search => &self.generations[1],
        }
    }

    /// Start an operation on `lane`, superseding earlier ones there
    pub(crate) fn next_generation(&self, lane: Lane) -> u64 {
        self.counter(lane).fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, lane: Lane, ticket: u64) -> bool {
        self.counter(lane).load(Ordering::SeqCst) == ticket
    }

    /// Run one operation with loading/error bookkeeping
    ///
    /// `apply` runs in the same state update that clears the loading flag.
    pub(crate) async fn track<R, F>(
        &self,
        fallback: &str,
        operation: F,
        apply: impl FnOnce(&mut ResourceState<T>, &R),
    ) -> ClientResult<R>
    where
        F: Future<Output = ClientResult<R>>,
    {
        self.modify(ResourceState::begin);
        let result = operation.await;
        self.modify(|state| {
            state.finish();
            match &result {
                Ok(value) => apply(state, value),
                Err(e) => {
                    let message = e.message_or(fallback);
                    tracing::warn!(error = %message, "Store operation failed");
                    state.error = Some(message);
                }
            }
        });
        result
    }

    /// Like [`track`](Self::track), but results of superseded operations are dropped
    pub(crate) async fn track_latest<R, F>(
        &self,
        lane: Lane,
        fallback: &str,
        operation: F,
        apply: impl FnOnce(&mut ResourceState<T>, &R),
    ) -> ClientResult<R>
    where
        F: Future<Output = ClientResult<R>>,
    {
        let ticket = self.next_generation(lane);
        self.modify(ResourceState::begin);
        let result = operation.await;
        let latest = self.is_latest(lane, ticket);
        self.modify(|state| {
            state.finish();
            if !latest {
                tracing::debug!(?lane, ticket, "Dropping stale response");
                return;
            }
            match &result {
                Ok(value) => apply(state, value),
                Err(e) => state.error = Some(e.message_or(fallback)),
            }
        });
        result
    }
}
