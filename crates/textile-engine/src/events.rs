//! Synchronous parse notifications for extensions (tables of contents, link
//! collectors and the like).
//!
//! Event names fired during a render:
//!
//! - `doc:initials`: the raw input
//! - `block:<tag>`: a block's content before its handler runs
//! - `span:<name>`: the source text of a matched span
//! - `graf:fnref`: the number of a footnote reference
//! - `doc:linebreaks`: a finished block before line breaks are tidied
//! - `doc:finals`: the final output
//!
//! Listeners registered for `*` see every event, after the specific listeners.

use std::fmt;
use std::sync::Arc;

use crate::error::TextileError;

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseEvent<'a> {
    pub name: &'a str,
    pub payload: &'a str,
}

pub type Listener = Arc<dyn Fn(&ParseEvent<'_>) + Send + Sync>;

#[derive(Default, Clone)]
pub struct EventBus {
    listeners: Vec<(String, Listener)>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.listeners.iter().map(|(name, _)| name))
            .finish()
    }
}

impl EventBus {
    pub fn add_listener<F>(&mut self, event: &str, listener: F) -> Result<(), TextileError>
    where
        F: Fn(&ParseEvent<'_>) + Send + Sync + 'static,
    {
        if event.is_empty() {
            return Err(TextileError::InvalidEvent);
        }
        self.listeners.push((event.to_string(), Arc::new(listener)));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn fire(&self, name: &str, payload: &str) {
        if self.listeners.is_empty() {
            return;
        }
        let event = ParseEvent { name, payload };
        let specific = self.listeners.iter().filter(|(event, _)| event == name);
        let wildcard = self
            .listeners
            .iter()
            .filter(|(event, _)| event == WILDCARD && name != WILDCARD);
        for (_, listener) in specific.chain(wildcard) {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[test]
    fn empty_event_names_are_rejected() {
        let mut bus = EventBus::default();
        let result = bus.add_listener("", |_| {});
        assert!(matches!(result, Err(TextileError::InvalidEvent)));
    }

    #[test]
    fn specific_listeners_run_before_wildcards_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::default();
        for (event, label) in [("*", "any"), ("block:h1", "first"), ("block:h1", "second")] {
            let seen = Arc::clone(&seen);
            bus.add_listener(event, move |e| {
                seen.lock().unwrap().push(format!("{label}:{}:{}", e.name, e.payload));
            })
            .unwrap();
        }

        bus.fire("block:h1", "Title");
        bus.fire("doc:finals", "out");

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "first:block:h1:Title",
                "second:block:h1:Title",
                "any:block:h1:Title",
                "any:doc:finals:out",
            ]
        );
    }
}
