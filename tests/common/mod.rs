//! Shared in-memory transport double for end-to-end session tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bleota::client::{Characteristic, GattEvent, GattTransport};

#[derive(Default)]
struct State {
    writes: Vec<(Characteristic, Vec<u8>)>,
    events: VecDeque<GattEvent>,
    profile_ready: bool,
    subscriptions: Vec<Characteristic>,
}

type WriteHook = Box<dyn FnMut(Characteristic, &[u8]) + Send>;

#[derive(Clone)]
pub struct InMemoryTransport {
    state: Arc<Mutex<State>>,
    hook: Arc<Mutex<Option<WriteHook>>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        let mut state = State::default();
        state.profile_ready = true;
        Self { state: Arc::new(Mutex::new(state)), hook: Arc::new(Mutex::new(None)) }
    }

    pub fn push_event(&self, event: GattEvent) {
        self.state.lock().unwrap().events.push_back(event);
    }

    pub fn writes(&self) -> Vec<(Characteristic, Vec<u8>)> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn subscriptions(&self) -> Vec<Characteristic> {
        self.state.lock().unwrap().subscriptions.clone()
    }

    /// Install a callback invoked with every `write()`, after it's recorded.
    /// Lets a test stand in for the device side without reimplementing
    /// `GattTransport` from scratch.
    pub fn set_write_hook(&self, hook: impl FnMut(Characteristic, &[u8]) + Send + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }
}

impl GattTransport for InMemoryTransport {
    type Error = ();

    fn profile_ready(&self) -> bool {
        self.state.lock().unwrap().profile_ready
    }

    async fn write(&mut self, characteristic: Characteristic, data: &[u8]) -> Result<(), ()> {
        self.state.lock().unwrap().writes.push((characteristic, data.to_vec()));
        if let Some(hook) = self.hook.lock().unwrap().as_mut() {
            hook(characteristic, data);
        }
        Ok(())
    }

    async fn subscribe(&mut self, characteristic: Characteristic) -> Result<(), ()> {
        self.state.lock().unwrap().subscriptions.push(characteristic);
        Ok(())
    }

    async fn unsubscribe_all(&mut self) {
        self.state.lock().unwrap().subscriptions.clear();
    }

    async fn next_event(&mut self) -> GattEvent {
        loop {
            if let Some(event) = self.state.lock().unwrap().events.pop_front() {
                return event;
            }
            async_io_mini::Timer::after(Duration::from_millis(1)).await;
        }
    }
}
