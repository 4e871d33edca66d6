//! Single-asset cache with a one-fetch-at-a-time guard.
//!
//! The store lives on the UI thread. [`AssetStore::ensure_loaded`] starts at
//! most one background fetch; its result comes back through
//! [`AssetStore::poll`], so the cached model and the loading flag are only
//! ever touched by the owner.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, TryRecvError};

use crate::{error::LoadError, model::Model, source::ModelSource};

/// Wake-up hook run on the loader thread once a result is ready.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

type Outcome = Result<Model, LoadError>;

/// Answer to [`AssetStore::ensure_loaded`].
#[derive(Clone, Debug)]
pub enum Ensure {
    /// Cached; present it right away.
    Ready(Arc<Model>),
    /// A fetch was started; the result arrives via `poll`.
    Started,
    /// A fetch is already outstanding. Nothing new was started.
    Busy,
}

enum State {
    NotLoaded,
    Loading(Receiver<Outcome>),
    Loaded(Arc<Model>),
}

pub struct AssetStore {
    source: Arc<dyn ModelSource>,
    state: State,
    notify: Option<Notify>,
    fetches: u64,
}

impl AssetStore {
    pub fn new(source: impl ModelSource) -> Self {
        Self {
            source: Arc::new(source),
            state: State::NotLoaded,
            notify: None,
            fetches: 0,
        }
    }

    pub fn with_notifier(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.notify = Some(Arc::new(notify));
        self
    }

    pub fn cached(&self) -> Option<&Arc<Model>> {
        match &self.state {
            State::Loaded(model) => Some(model),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, State::Loading(_))
    }

    /// Number of fetches started over the store's lifetime.
    pub fn fetches_started(&self) -> u64 {
        self.fetches
    }

    pub fn ensure_loaded(&mut self) -> Result<Ensure, LoadError> {
        match &self.state {
            State::Loaded(model) => return Ok(Ensure::Ready(Arc::clone(model))),
            State::Loading(_) => return Ok(Ensure::Busy),
            State::NotLoaded => {}
        }

        let (tx, rx) = crossbeam_channel::bounded::<Outcome>(1);
        let source = Arc::clone(&self.source);
        let notify = self.notify.clone();

        thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                log::info!("Fetching model from {}", source.describe());
                let outcome = source.fetch();
                // The store may have been dropped meanwhile; nobody is waiting then.
                if tx.send(outcome).is_ok() {
                    if let Some(notify) = notify {
                        notify();
                    }
                }
            })
            .map_err(LoadError::Spawn)?;

        self.fetches += 1;
        self.state = State::Loading(rx);
        Ok(Ensure::Started)
    }

    /// Non-blocking. `Some` exactly once per started fetch.
    pub fn poll(&mut self) -> Option<Result<Arc<Model>, LoadError>> {
        let State::Loading(rx) = &self.state else {
            return None;
        };
        let received = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(LoadError::WorkerLost),
        };
        Some(self.settle(received))
    }

    /// Block until the outstanding fetch finishes. `None` if nothing is loading.
    pub fn wait(&mut self) -> Option<Result<Arc<Model>, LoadError>> {
        let State::Loading(rx) = &self.state else {
            return None;
        };
        let received = rx.recv().unwrap_or(Err(LoadError::WorkerLost));
        Some(self.settle(received))
    }

    fn settle(&mut self, outcome: Outcome) -> Result<Arc<Model>, LoadError> {
        match outcome {
            Ok(model) => {
                log::info!(
                    "Model '{}' loaded: {} parts, {} materials, {} triangles",
                    model.name,
                    model.parts.len(),
                    model.materials.len(),
                    model.triangle_count()
                );
                let model = Arc::new(model);
                self.state = State::Loaded(Arc::clone(&model));
                Ok(model)
            }
            Err(err) => {
                self.state = State::NotLoaded;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::load_obj_from_str;
    use crossbeam_channel::{Sender, bounded};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn triangle() -> Model {
        let obj = load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").expect("parse obj");
        Model::assemble("triangle", obj, Vec::new())
    }

    enum Step {
        Succeed,
        Fail,
        Panic,
    }

    /// Each fetch blocks until the test releases it with a [`Step`].
    struct GatedSource {
        fetches: Arc<AtomicUsize>,
        gate: Receiver<Step>,
    }

    impl ModelSource for GatedSource {
        fn describe(&self) -> String {
            "gated".into()
        }

        fn fetch(&self) -> Result<Model, LoadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.gate.recv() {
                Ok(Step::Succeed) => Ok(triangle()),
                Ok(Step::Fail) | Err(_) => Err(LoadError::Parse {
                    path: "cat.obj".into(),
                    source: anyhow::anyhow!("simulated failure"),
                }),
                Ok(Step::Panic) => panic!("simulated loader crash"),
            }
        }
    }

    fn gated_store() -> (AssetStore, Sender<Step>, Arc<AtomicUsize>) {
        let (tx, rx) = bounded(8);
        let fetches = Arc::new(AtomicUsize::new(0));
        let store = AssetStore::new(GatedSource {
            fetches: Arc::clone(&fetches),
            gate: rx,
        });
        (store, tx, fetches)
    }

    #[test]
    fn overlapping_requests_start_one_fetch() {
        let (mut store, gate, fetches) = gated_store();

        assert!(matches!(store.ensure_loaded(), Ok(Ensure::Started)));
        for _ in 0..5 {
            assert!(matches!(store.ensure_loaded(), Ok(Ensure::Busy)));
        }
        assert!(store.is_loading());
        assert!(store.poll().is_none());

        gate.send(Step::Succeed).unwrap();
        let model = store.wait().expect("pending").expect("loaded");
        assert_eq!(model.name, "triangle");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.fetches_started(), 1);
    }

    #[test]
    fn cached_model_is_served_without_refetching() {
        let (mut store, gate, fetches) = gated_store();
        store.ensure_loaded().unwrap();
        gate.send(Step::Succeed).unwrap();
        let first = store.wait().unwrap().unwrap();

        for _ in 0..3 {
            match store.ensure_loaded() {
                Ok(Ensure::Ready(model)) => assert!(Arc::ptr_eq(&model, &first)),
                other => panic!("expected cached model, got {other:?}"),
            }
        }
        assert!(store.poll().is_none());
        assert!(store.wait().is_none());
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_clears_the_guard_for_one_retry() {
        let (mut store, gate, fetches) = gated_store();
        store.ensure_loaded().unwrap();
        gate.send(Step::Fail).unwrap();
        assert!(store.wait().unwrap().is_err());
        assert!(!store.is_loading());
        assert!(store.cached().is_none());

        assert!(matches!(store.ensure_loaded(), Ok(Ensure::Started)));
        assert!(matches!(store.ensure_loaded(), Ok(Ensure::Busy)));
        gate.send(Step::Succeed).unwrap();
        assert!(store.wait().unwrap().is_ok());
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn crashed_loader_reports_worker_lost() {
        let (mut store, gate, _) = gated_store();
        store.ensure_loaded().unwrap();
        gate.send(Step::Panic).unwrap();
        assert!(matches!(store.wait(), Some(Err(LoadError::WorkerLost))));
        assert!(!store.is_loading());
    }

    #[test]
    fn notifier_runs_after_result_is_posted() {
        let (tx, rx) = bounded(1);
        let (gate_tx, gate_rx) = bounded(1);
        let mut store = AssetStore::new(GatedSource {
            fetches: Arc::new(AtomicUsize::new(0)),
            gate: gate_rx,
        })
        .with_notifier(move || {
            let _ = tx.try_send(());
        });

        store.ensure_loaded().unwrap();
        gate_tx.send(Step::Succeed).unwrap();
        rx.recv().expect("notified");
        // The result is already queued once the notifier fires.
        assert!(matches!(store.poll(), Some(Ok(_))));
    }
}
