//! Route table: lookup and runtime mutation.
//!
//! # Responsibilities
//! - Store the ordered route list
//! - Resolve a path to the most specific enabled route
//! - Add, edit, toggle and remove routes while traffic flows
//!
//! # Design Decisions
//! - Readers load an `Arc` snapshot without locking
//! - Writers are serialized and publish a fresh snapshot (copy-on-write)
//! - O(n log n) resolve (acceptable for typical route counts)

use std::cmp::Reverse;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::matcher;
use super::route::{generate_id, validate, Route};
use crate::error::ControlError;

/// Ordered, concurrently readable collection of routes.
pub struct RouteTable {
    routes: ArcSwap<Vec<Route>>,
    writer: Mutex<()>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            routes: ArcSwap::from_pointee(routes),
            writer: Mutex::new(()),
        }
    }

    /// Current routes in insertion order.
    pub fn snapshot(&self) -> Arc<Vec<Route>> {
        self.routes.load_full()
    }

    pub fn len(&self) -> usize {
        self.routes.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.load().is_empty()
    }

    /// Find the enabled route with the longest match prefix for `path`.
    ///
    /// Ties on prefix length go to the route added first.
    pub fn resolve(&self, path: &str) -> Option<Route> {
        let routes = self.routes.load();
        let mut candidates: Vec<&Route> = routes.iter().filter(|r| r.enabled).collect();
        // Stable sort keeps insertion order among equal lengths.
        candidates.sort_by_key(|r| Reverse(r.match_prefix().len()));

        candidates
            .into_iter()
            .find(|r| matcher::matches(r, path))
            .cloned()
    }

    /// Append a new enabled route.
    pub fn add(&self, path_prefix: &str, target_base_url: &str) -> Result<Route, ControlError> {
        let _guard = self.writer.lock();
        let current = self.routes.load_full();

        let mut id = generate_id();
        while current.iter().any(|r| r.id == id) {
            id = generate_id();
        }
        let route = Route::new(id, path_prefix, target_base_url)?;

        let mut next = current.as_ref().clone();
        next.push(route.clone());
        self.routes.store(Arc::new(next));
        Ok(route)
    }

    /// Remove a route by id.
    pub fn remove(&self, route_id: &str) -> Result<Route, ControlError> {
        let _guard = self.writer.lock();
        let mut next = self.routes.load_full().as_ref().clone();
        let idx = next
            .iter()
            .position(|r| r.id == route_id)
            .ok_or(ControlError::RouteNotFound)?;
        let removed = next.remove(idx);
        self.routes.store(Arc::new(next));
        Ok(removed)
    }

    /// Replace prefix and target of an existing route, keeping id and enabled flag.
    pub fn edit(
        &self,
        route_id: &str,
        path_prefix: &str,
        target_base_url: &str,
    ) -> Result<Route, ControlError> {
        let _guard = self.writer.lock();
        let mut next = self.routes.load_full().as_ref().clone();
        let route = next
            .iter_mut()
            .find(|r| r.id == route_id)
            .ok_or(ControlError::RouteNotFound)?;
        validate(path_prefix, target_base_url)?;

        route.path_prefix = path_prefix.to_string();
        route.target_base_url = target_base_url.to_string();
        let edited = route.clone();
        self.routes.store(Arc::new(next));
        Ok(edited)
    }

    /// Flip the enabled flag, returning the new value.
    pub fn toggle(&self, route_id: &str) -> Result<bool, ControlError> {
        let _guard = self.writer.lock();
        let mut next = self.routes.load_full().as_ref().clone();
        let route = next
            .iter_mut()
            .find(|r| r.id == route_id)
            .ok_or(ControlError::RouteNotFound)?;
        route.enabled = !route.enabled;
        let enabled = route.enabled;
        self.routes.store(Arc::new(next));
        Ok(enabled)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
