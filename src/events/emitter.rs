use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// Anything that can be published on an [`EventEmitter`].
pub trait EventName {
    /// Name the event is dispatched under.
    fn event_name(&self) -> &str;
}

/// Listener bound to a single event name.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Listener receiving every event together with its name.
pub type GlobalListener<E> = Arc<dyn Fn(&str, &E) + Send + Sync>;

/// Synchronous publish/subscribe registry.
///
/// - Global listeners run before event specific ones, each group in
///   registration order.
/// - The same listener may be registered several times; every registration
///   is invoked, and [`EventEmitter::off`] removes one registration per call.
/// - Listeners are identified by their `Arc` allocation, so keep a clone of
///   the `Arc` you registered to remove it later.
/// - Dispatch works on a snapshot taken at emit time: listeners may call
///   `on`/`off` re-entrantly, and the change is seen by the next emit.
/// - There is no isolation. A panicking listener unwinds through `emit` and
///   the remaining listeners are skipped.
pub struct EventEmitter<E> {
    listeners: RwLock<HashMap<String, Vec<Listener<E>>>>,
    global_listeners: RwLock<Vec<GlobalListener<E>>>,
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            global_listeners: RwLock::new(Vec::new()),
        }
    }
}

impl<E: EventName> EventEmitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches `event` under its own name.
    pub fn emit(&self, event: &E) {
        self.dispatch(event.event_name(), event);
    }

    /// Dispatches `event` under an arbitrary `name`, skipping the check that
    /// the name belongs to the event.
    pub fn emit_unsafe(&self, name: &str, event: &E) {
        self.dispatch(name, event);
    }

    fn dispatch(&self, name: &str, event: &E) {
        let global: Vec<GlobalListener<E>> = self
            .global_listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &global {
            listener(name, event);
        }

        let specific: Vec<Listener<E>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .unwrap_or_default();
        for listener in &specific {
            listener(event);
        }
    }

    pub fn on(&self, name: impl Into<String>, listener: Listener<E>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.into())
            .or_default()
            .push(listener);
    }

    /// Removes the first registration of `listener` for `name`.
    ///
    /// Returns `false` when it was not registered.
    pub fn off(&self, name: &str, listener: &Listener<E>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(bound) = listeners.get_mut(name) else {
            return false;
        };
        let removed = remove_first(bound, listener);
        if bound.is_empty() {
            listeners.remove(name);
        }
        removed
    }

    pub fn subscribe(&self, listener: GlobalListener<E>) {
        self.global_listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Removes the first registration of a global listener.
    pub fn unsubscribe(&self, listener: &GlobalListener<E>) -> bool {
        let mut global = self
            .global_listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        remove_first(&mut global, listener)
    }

    /// Number of registrations for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, Vec::len)
    }
}

fn remove_first<T: ?Sized>(list: &mut Vec<Arc<T>>, target: &Arc<T>) -> bool {
    match list.iter().position(|l| Arc::ptr_eq(l, target)) {
        Some(idx) => {
            list.remove(idx);
            true
        }
        None => false,
    }
}
