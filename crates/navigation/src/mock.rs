//! Scripted platform fakes for tests and the CLI.

use std::cell::RefCell;
use std::collections::VecDeque;

use foundation::Position;

use crate::geolocation::{
    Geolocation, GeolocationError, LocalBoxFuture, PositionOptions, WatchId,
};
use crate::orientation::{EventFamily, OrientationSource};

/// Geolocation fake answering one-shot requests from a queue.
///
/// An empty queue answers with a timeout, like a device that never gets a fix.
#[derive(Debug, Default)]
pub struct MockGeolocation {
    unavailable: bool,
    responses: RefCell<VecDeque<Result<Position, GeolocationError>>>,
    requests: RefCell<Vec<PositionOptions>>,
    watches: Vec<(WatchId, PositionOptions)>,
    next_watch: u32,
}

impl MockGeolocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn push_fix(&self, position: Position) {
        self.responses.borrow_mut().push_back(Ok(position));
    }

    pub fn push_error(&self, error: GeolocationError) {
        self.responses.borrow_mut().push_back(Err(error));
    }

    /// Options of every one-shot request so far, oldest first.
    pub fn requests(&self) -> Vec<PositionOptions> {
        self.requests.borrow().clone()
    }

    pub fn active_watches(&self) -> Vec<(WatchId, PositionOptions)> {
        self.watches.clone()
    }
}

impl Geolocation for MockGeolocation {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn current_position<'a>(
        &'a self,
        options: PositionOptions,
    ) -> LocalBoxFuture<'a, Result<Position, GeolocationError>> {
        self.requests.borrow_mut().push(options);
        let result = if self.unavailable {
            Err(GeolocationError::Unavailable)
        } else {
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(GeolocationError::Timeout("Timeout expired".to_string())))
        };
        Box::pin(std::future::ready(result))
    }

    fn watch_position(&mut self, options: PositionOptions) -> Result<WatchId, GeolocationError> {
        if self.unavailable {
            return Err(GeolocationError::Unavailable);
        }
        self.next_watch += 1;
        let id = WatchId(self.next_watch);
        self.watches.push((id, options));
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        self.watches.retain(|(w, _)| *w != id);
    }
}

/// Orientation source that only records listener registration.
#[derive(Debug, Default)]
pub struct MockOrientationSource {
    listeners: Vec<EventFamily>,
    pub added: usize,
    pub removed: usize,
}

impl MockOrientationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listeners(&self) -> &[EventFamily] {
        &self.listeners
    }
}

impl OrientationSource for MockOrientationSource {
    fn add_listener(&mut self, family: EventFamily) {
        self.added += 1;
        if !self.listeners.contains(&family) {
            self.listeners.push(family);
        }
    }

    fn remove_listener(&mut self, family: EventFamily) {
        self.removed += 1;
        self.listeners.retain(|f| *f != family);
    }
}
