//! Debug messenger → owning instance registry.
//!
//! Messenger calls carry no instance, so the loader remembers which instance
//! created each messenger and routes through that instance's dispatch table.
//! Guarded by its own mutex, never held together with the dispatch cache lock.

use std::collections::HashMap;

use parking_lot::Mutex;
use xrl_abi::{DebugUtilsMessenger, Instance};

#[derive(Default)]
pub struct MessengerRegistry {
    owners: Mutex<HashMap<DebugUtilsMessenger, Instance>>,
}

impl MessengerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or overwrite) the owner of `messenger`.
    pub fn track(&self, instance: Instance, messenger: DebugUtilsMessenger) {
        self.owners.lock().insert(messenger, instance);
    }

    /// Forget `messenger`. Null handles and unknown messengers are ignored.
    pub fn forget(&self, messenger: DebugUtilsMessenger) {
        if messenger.is_null() {
            return;
        }
        self.owners.lock().remove(&messenger);
    }

    /// Owning instance, or `Instance::NULL` if the messenger is not tracked.
    pub fn owner(&self, messenger: DebugUtilsMessenger) -> Instance {
        self.owners
            .lock()
            .get(&messenger)
            .copied()
            .unwrap_or(Instance::NULL)
    }

    /// Drop every messenger owned by `instance`. Returns how many were removed.
    pub fn forget_instance(&self, instance: Instance) -> usize {
        let mut owners = self.owners.lock();
        let before = owners.len();
        owners.retain(|_, owner| *owner != instance);
        before - owners.len()
    }

    pub fn len(&self) -> usize {
        self.owners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
