use std::fmt;
use std::sync::mpsc;

type Listener<E> = Box<dyn Fn(&E) + Send>;

/// One-to-many event fan-out.
///
/// Listeners run synchronously on the notifying thread, in the order they
/// subscribed. The component that owns the notifier decides when events
/// fire; listeners never see the notifier itself, so neither side depends
/// on the other's types.
pub struct Notifier<E> {
    listeners: Vec<Listener<E>>,
}

impl<E> Notifier<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a callback.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&E) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Deliver `event` to every listener.
    pub fn notify(&self, event: &E) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E: Clone + Send + 'static> Notifier<E> {
    /// Register a listener that forwards each event into a channel.
    ///
    /// Once the receiver is dropped the listener does nothing.
    pub fn subscribe_channel(&mut self) -> mpsc::Receiver<E> {
        let (tx, rx) = mpsc::channel();
        self.subscribe(move |event: &E| {
            let _ = tx.send(event.clone());
        });
        rx
    }
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
