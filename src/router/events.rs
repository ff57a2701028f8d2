//! Navigation lifecycle events and their subscribers.

use std::fmt;
use std::rc::Rc;

use crate::error::RouterError;

/// Published by the router around every navigation.
#[derive(Debug, Clone)]
pub enum RouterEvent {
    NavigationStart { id: u64, instruction: String },
    /// Committed. `url` is the router URL afterwards.
    NavigationEnd { id: u64, instruction: String, url: String },
    /// A guard blocked the navigation.
    NavigationCancel { id: u64, instruction: String },
    NavigationError { id: u64, instruction: String, error: RouterError },
}

impl RouterEvent {
    /// Transition id.
    pub fn id(&self) -> u64 {
        match self {
            Self::NavigationStart { id, .. }
            | Self::NavigationEnd { id, .. }
            | Self::NavigationCancel { id, .. }
            | Self::NavigationError { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NavigationStart { .. } => "navigation-start",
            Self::NavigationEnd { .. } => "navigation-end",
            Self::NavigationCancel { .. } => "navigation-cancel",
            Self::NavigationError { .. } => "navigation-error",
        }
    }
}

impl fmt::Display for RouterEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.name(), self.id())
    }
}

pub type SubscriptionId = u64;

type Listener = Rc<dyn Fn(&RouterEvent)>;

/// Event listeners in subscription order.
#[derive(Clone, Default)]
pub struct Subscribers {
    next_id: SubscriptionId,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Subscribers {
    pub fn subscribe(&mut self, listener: impl Fn(&RouterEvent) + 'static) -> SubscriptionId {
        self.next_id += 1;
        self.listeners.push((self.next_id, Rc::new(listener)));
        self.next_id
    }

    /// Returns `false` if nothing was subscribed under `id`.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// The current listeners, detached from `self` so that they may
    /// (un)subscribe while being called.
    pub fn listeners(&self) -> Vec<Rc<dyn Fn(&RouterEvent)>> {
        self.listeners.iter().map(|(_, l)| Rc::clone(l)).collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn subscribe_call_unsubscribe() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut subscribers = Subscribers::default();
        let sink = Rc::clone(&seen);
        let id = subscribers.subscribe(move |e| sink.borrow_mut().push(e.to_string()));

        let event = RouterEvent::NavigationStart {
            id: 4,
            instruction: "a".into(),
        };
        for listener in subscribers.listeners() {
            listener(&event);
        }
        assert_eq!(*seen.borrow(), vec!["navigation-start #4"]);

        assert!(subscribers.unsubscribe(id));
        assert!(subscribers.is_empty());
        assert!(!subscribers.unsubscribe(id));
    }
}
