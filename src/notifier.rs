//! Change notifier - runs one notification cycle per committed state change
//!
//! A cycle hands the registry to every registered observer in registration
//! order. There is no debouncing or batching: each committed inbound message
//! produces exactly one cycle.

use tracing::trace;

use crate::state::Registry;

/// Something that derives output from the registry after each change
pub trait StateObserver: Send {
    /// Observer name for logs
    fn name(&self) -> &str;

    /// Called once per notification cycle
    fn on_state_changed(&mut self, registry: &Registry);
}

/// Adapter turning a closure into an observer
pub struct FnObserver<F> {
    name: String,
    callback: F,
}

impl<F> FnObserver<F>
where
    F: FnMut(&Registry) + Send,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> StateObserver for FnObserver<F>
where
    F: FnMut(&Registry) + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_state_changed(&mut self, registry: &Registry) {
        (self.callback)(registry)
    }
}

/// Fans a committed change out to all observers
#[derive(Default)]
pub struct ChangeNotifier {
    observers: Vec<Box<dyn StateObserver>>,
    cycles: u64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; it runs after those registered before it
    pub fn subscribe(&mut self, observer: Box<dyn StateObserver>) {
        self.observers.push(observer);
    }

    /// Register a closure observer
    pub fn subscribe_fn<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: FnMut(&Registry) + Send + 'static,
    {
        self.subscribe(Box::new(FnObserver::new(name, callback)));
    }

    /// Run one notification cycle
    pub fn notify(&mut self, registry: &Registry) {
        self.cycles += 1;
        for observer in self.observers.iter_mut() {
            trace!(observer = observer.name(), cycle = self.cycles, "Notifying observer");
            observer.on_state_changed(registry);
        }
    }

    /// Number of cycles run so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}
