//! Loom tests for the loader's shared state.
//!
//! The dispatch cache, the messenger registry and the session slot are
//! mirrored here over loom's primitives (parking_lot is opaque to loom) and
//! checked under all interleavings.
//!
//! Run with:
//! ```sh
//! RUSTFLAGS="--cfg loom" cargo test -p xrl-loom-tests --release
//! ```
//!
//! For faster iteration with bounded preemptions:
//! ```sh
//! LOOM_MAX_PREEMPTIONS=2 RUSTFLAGS="--cfg loom" cargo test -p xrl-loom-tests --release
//! ```

#[cfg(loom)]
mod tests {
    use loom::sync::atomic::{AtomicUsize, Ordering};
    use loom::sync::{Arc, Mutex};
    use loom::thread;
    use std::collections::HashMap;

    type Instance = u64;
    type Messenger = u64;
    const NULL: Instance = 0;

    /// Stand-in for a dispatch table: remembers which instance it belongs to.
    #[derive(Debug)]
    struct Table(Instance);

    // =========================================================================
    // Mirrors of DispatchCache / MessengerRegistry
    // =========================================================================

    #[derive(Default)]
    struct Cache(Mutex<HashMap<Instance, Arc<Table>>>);

    impl Cache {
        fn insert(&self, instance: Instance) {
            self.0.lock().unwrap().insert(instance, Arc::new(Table(instance)));
        }

        fn get(&self, instance: Instance) -> Option<Arc<Table>> {
            self.0.lock().unwrap().get(&instance).cloned()
        }

        fn remove(&self, instance: Instance) -> Option<Arc<Table>> {
            self.0.lock().unwrap().remove(&instance)
        }

        fn clear(&self) -> usize {
            let drained: Vec<_> = self.0.lock().unwrap().drain().collect();
            drained.len()
        }
    }

    #[derive(Default)]
    struct Registry(Mutex<HashMap<Messenger, Instance>>);

    impl Registry {
        fn track(&self, instance: Instance, messenger: Messenger) {
            self.0.lock().unwrap().insert(messenger, instance);
        }

        fn owner(&self, messenger: Messenger) -> Instance {
            self.0.lock().unwrap().get(&messenger).copied().unwrap_or(NULL)
        }

        fn forget_instance(&self, instance: Instance) {
            self.0.lock().unwrap().retain(|_, owner| *owner != instance);
        }
    }

    #[derive(Default)]
    struct Session {
        cache: Cache,
        messengers: Registry,
    }

    impl Session {
        fn destroy_instance(&self, instance: Instance) -> bool {
            let removed = self.cache.remove(instance).is_some();
            self.messengers.forget_instance(instance);
            removed
        }

        fn messenger_table(&self, messenger: Messenger) -> Option<Arc<Table>> {
            let owner = self.messengers.owner(messenger);
            if owner == NULL {
                return None;
            }
            self.cache.get(owner)
        }
    }

    // =========================================================================
    // Cache consistency
    // =========================================================================

    #[test]
    fn create_and_destroy_distinct_instances() {
        loom::model(|| {
            let session = Arc::new(Session::default());

            let handles: Vec<_> = [1u64, 2]
                .into_iter()
                .map(|instance| {
                    let session = session.clone();
                    thread::spawn(move || {
                        session.cache.insert(instance);
                        assert_eq!(session.cache.get(instance).map(|t| t.0), Some(instance));
                        assert!(session.destroy_instance(instance));
                        assert!(session.cache.get(instance).is_none());
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            assert_eq!(session.cache.clear(), 0);
        });
    }

    #[test]
    fn concurrent_double_destroy_removes_once() {
        loom::model(|| {
            let session = Arc::new(Session::default());
            session.cache.insert(7);
            let removed = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let session = session.clone();
                    let removed = removed.clone();
                    thread::spawn(move || {
                        if session.destroy_instance(7) {
                            removed.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            assert_eq!(removed.load(Ordering::SeqCst), 1);
            assert!(session.cache.get(7).is_none());
        });
    }

    // =========================================================================
    // Messenger routing vs. instance destruction
    // =========================================================================

    #[test]
    fn messenger_lookup_races_instance_destroy() {
        loom::model(|| {
            let session = Arc::new(Session::default());
            session.cache.insert(1);
            session.messengers.track(1, 100);

            let lookup = {
                let session = session.clone();
                thread::spawn(move || session.messenger_table(100).map(|t| t.0))
            };
            let destroy = {
                let session = session.clone();
                thread::spawn(move || session.destroy_instance(1))
            };

            // Either the owner's table or nothing; never another instance's.
            let seen = lookup.join().unwrap();
            assert!(seen.is_none() || seen == Some(1));
            assert!(destroy.join().unwrap());
            assert!(session.messenger_table(100).is_none());
        });
    }

    #[test]
    fn handed_out_table_survives_teardown() {
        loom::model(|| {
            let session = Arc::new(Session::default());
            session.cache.insert(3);

            let reader = {
                let session = session.clone();
                thread::spawn(move || {
                    if let Some(table) = session.cache.get(3) {
                        assert_eq!(table.0, 3);
                    }
                })
            };
            session.cache.clear();
            reader.join().unwrap();
            assert!(session.cache.get(3).is_none());
        });
    }

    // =========================================================================
    // Session slot: serialized load
    // =========================================================================

    #[test]
    fn concurrent_loads_bind_once() {
        loom::model(|| {
            let slot: Arc<Mutex<Option<Arc<Session>>>> = Arc::new(Mutex::new(None));
            let scans = Arc::new(AtomicUsize::new(0));

            let load = |slot: Arc<Mutex<Option<Arc<Session>>>>, scans: Arc<AtomicUsize>| {
                let mut guard = slot.lock().unwrap();
                if let Some(session) = guard.as_ref() {
                    return session.clone();
                }
                scans.fetch_add(1, Ordering::SeqCst);
                let session = Arc::new(Session::default());
                *guard = Some(session.clone());
                session
            };

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let slot = slot.clone();
                    let scans = scans.clone();
                    thread::spawn(move || load(slot, scans))
                })
                .collect();
            let sessions: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            assert_eq!(scans.load(Ordering::SeqCst), 1);
            assert!(Arc::ptr_eq(&sessions[0], &sessions[1]));
        });
    }
}
