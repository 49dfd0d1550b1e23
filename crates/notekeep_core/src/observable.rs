//! Push-based observable values.
//!
//! # Responsibility
//! - Hold a current value and push it to subscribers on change.
//! - Deliver callbacks through a [`Dispatcher`] so producers on worker threads
//!   never call into presentation code directly.
//! - Report active (first subscriber) and inactive (last subscriber gone)
//!   transitions to an optional [`ObservableLifecycle`].
//!
//! # Invariants
//! - Every `set_value` bumps the version; a subscriber never receives the same
//!   version twice and always receives the latest value at delivery time.
//! - A new subscriber receives the current value, if any, on the next delivery.
//! - Callbacks run without any internal lock held.
//! - Subscribing and unsubscribing are expected to happen on the delivery
//!   context; lifecycle hooks run on the caller thread.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Unit of work queued on a delivery context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Delivery context for observer callbacks.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, task: Task);
}

/// Runs tasks inline on the calling thread.
///
/// Suitable for single-threaded callers; with concurrent producers the
/// callback order across threads is unspecified.
#[derive(Debug, Default, Clone, Copy)]
pub struct Immediate;

impl Dispatcher for Immediate {
    fn dispatch(&self, task: Task) {
        task();
    }
}

/// Task queue drained by the thread that owns the presentation.
#[derive(Clone)]
pub struct MainLoop {
    sender: Sender<Task>,
    receiver: Arc<Mutex<Receiver<Task>>>,
}

struct MainLoopDispatcher {
    sender: Sender<Task>,
}

impl Dispatcher for MainLoopDispatcher {
    fn dispatch(&self, task: Task) {
        // The loop owner went away; there is nobody left to notify.
        let _ = self.sender.send(task);
    }
}

impl MainLoop {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Dispatcher that posts onto this loop.
    pub fn dispatcher(&self) -> Arc<dyn Dispatcher> {
        Arc::new(MainLoopDispatcher {
            sender: self.sender.clone(),
        })
    }

    /// Runs queued tasks, including tasks they enqueue, until the queue is
    /// empty. Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.try_next() {
            task();
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for a first task, then drains the queue.
    pub fn run_for(&self, timeout: Duration) -> usize {
        let first = {
            let receiver = lock(&self.receiver);
            match receiver.recv_timeout(timeout) {
                Ok(task) => task,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return 0,
            }
        };
        first();
        1 + self.run_pending()
    }

    fn try_next(&self) -> Option<Task> {
        lock(&self.receiver).try_recv().ok()
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Hooks fired when an observable gains its first or loses its last observer.
pub trait ObservableLifecycle<T>: Send + Sync {
    fn on_active(&self, target: &Observable<T>);
    fn on_inactive(&self, target: &Observable<T>);
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ObserverSlot<T> {
    callback: Callback<T>,
    last_version: u64,
}

struct State<T> {
    value: Option<T>,
    version: u64,
    next_observer_id: u64,
    observers: BTreeMap<u64, ObserverSlot<T>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    dispatcher: Arc<dyn Dispatcher>,
    lifecycle: Option<Box<dyn ObservableLifecycle<T>>>,
}

/// Shared handle to an observable value. Clones observe the same value.
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Non-owning handle, used by producers that must not keep a value alive.
pub struct WeakObservable<T> {
    shared: Weak<Shared<T>>,
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T> WeakObservable<T> {
    pub fn upgrade(&self) -> Option<Observable<T>> {
        self.shared.upgrade().map(|shared| Observable { shared })
    }
}

impl<T: Clone + Send + 'static> Observable<T> {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self::build(dispatcher, None)
    }

    pub fn with_lifecycle(
        dispatcher: Arc<dyn Dispatcher>,
        lifecycle: impl ObservableLifecycle<T> + 'static,
    ) -> Self {
        Self::build(dispatcher, Some(Box::new(lifecycle)))
    }

    fn build(
        dispatcher: Arc<dyn Dispatcher>,
        lifecycle: Option<Box<dyn ObservableLifecycle<T>>>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    value: None,
                    version: 0,
                    next_observer_id: 0,
                    observers: BTreeMap::new(),
                }),
                dispatcher,
                lifecycle,
            }),
        }
    }

    /// Last value set, if any.
    pub fn value(&self) -> Option<T> {
        self.state().value.clone()
    }

    pub fn has_observers(&self) -> bool {
        !self.state().observers.is_empty()
    }

    pub fn observer_count(&self) -> usize {
        self.state().observers.len()
    }

    pub fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Stores `value` and schedules delivery to current observers.
    ///
    /// Callable from any thread.
    pub fn set_value(&self, value: T) {
        {
            let mut state = self.state();
            state.value = Some(value);
            state.version += 1;
        }
        self.schedule_delivery();
    }

    /// Forgets the current value; observers hear nothing until the next set.
    pub(crate) fn clear_value(&self) {
        self.state().value = None;
    }

    /// Registers `callback`; the returned handle unsubscribes when dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let (id, became_active) = {
            let mut state = self.state();
            let id = state.next_observer_id;
            state.next_observer_id += 1;
            state.observers.insert(
                id,
                ObserverSlot {
                    callback: Arc::new(callback),
                    last_version: 0,
                },
            );
            (id, state.observers.len() == 1)
        };

        if became_active {
            if let Some(lifecycle) = &self.shared.lifecycle {
                lifecycle.on_active(self);
            }
        }
        self.schedule_delivery();

        let owner = self.clone();
        Subscription {
            detach: Some(Box::new(move || owner.remove_observer(id))),
        }
    }

    fn remove_observer(&self, id: u64) {
        let became_inactive = {
            let mut state = self.state();
            state.observers.remove(&id).is_some() && state.observers.is_empty()
        };

        if became_inactive {
            if let Some(lifecycle) = &self.shared.lifecycle {
                lifecycle.on_inactive(self);
            }
        }
    }

    fn schedule_delivery(&self) {
        let target = self.downgrade();
        self.shared.dispatcher.dispatch(Box::new(move || {
            if let Some(observable) = target.upgrade() {
                observable.deliver_pending();
            }
        }));
    }

    fn deliver_pending(&self) {
        let (value, callbacks) = {
            let mut state = self.state();
            let Some(value) = state.value.clone() else {
                return;
            };
            let version = state.version;
            let callbacks: Vec<Callback<T>> = state
                .observers
                .values_mut()
                .filter(|slot| slot.last_version < version)
                .map(|slot| {
                    slot.last_version = version;
                    Arc::clone(&slot.callback)
                })
                .collect();
            (value, callbacks)
        };

        for callback in callbacks {
            callback(&value);
        }
    }

    fn state(&self) -> MutexGuard<'_, State<T>> {
        lock(&self.shared.state)
    }
}

/// Live registration of one observer.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

/// Observable recomputed from the latest values of `a` and `b`.
///
/// Subscribes to both sources only while it has observers. Emits nothing
/// until both sources have delivered a value since activation; the previous
/// result is dropped on deactivation and never replayed.
pub fn combine_latest<A, B, R, F>(
    dispatcher: Arc<dyn Dispatcher>,
    a: &Observable<A>,
    b: &Observable<B>,
    combine: F,
) -> Observable<R>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(&A, &B) -> R + Send + Sync + 'static,
{
    Observable::with_lifecycle(
        dispatcher,
        CombineLatest {
            a: a.clone(),
            b: b.clone(),
            combine: Arc::new(combine),
            latest: Arc::new(Mutex::new((None, None))),
            subscriptions: Mutex::new(Vec::new()),
        },
    )
}

struct CombineLatest<A, B, F> {
    a: Observable<A>,
    b: Observable<B>,
    combine: Arc<F>,
    latest: Arc<Mutex<(Option<A>, Option<B>)>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl<A, B, R, F> ObservableLifecycle<R> for CombineLatest<A, B, F>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(&A, &B) -> R + Send + Sync + 'static,
{
    fn on_active(&self, target: &Observable<R>) {
        let sub_a = {
            let latest = Arc::clone(&self.latest);
            let combine = Arc::clone(&self.combine);
            let target = target.downgrade();
            self.a.subscribe(move |value| {
                let output = {
                    let mut latest = lock(&latest);
                    latest.0 = Some(value.clone());
                    combined(&latest, combine.as_ref())
                };
                publish(&target, output);
            })
        };
        let sub_b = {
            let latest = Arc::clone(&self.latest);
            let combine = Arc::clone(&self.combine);
            let target = target.downgrade();
            self.b.subscribe(move |value| {
                let output = {
                    let mut latest = lock(&latest);
                    latest.1 = Some(value.clone());
                    combined(&latest, combine.as_ref())
                };
                publish(&target, output);
            })
        };
        lock(&self.subscriptions).extend([sub_a, sub_b]);
    }

    fn on_inactive(&self, target: &Observable<R>) {
        let subscriptions = std::mem::take(&mut *lock(&self.subscriptions));
        drop(subscriptions);
        *lock(&self.latest) = (None, None);
        target.clear_value();
    }
}

fn combined<A, B, R>(
    latest: &(Option<A>, Option<B>),
    combine: &impl Fn(&A, &B) -> R,
) -> Option<R> {
    match latest {
        (Some(a), Some(b)) => Some(combine(a, b)),
        _ => None,
    }
}

fn publish<R: Clone + Send + 'static>(target: &WeakObservable<R>, output: Option<R>) {
    if let (Some(target), Some(output)) = (target.upgrade(), output) {
        target.set_value(output);
    }
}

fn lock<S>(mutex: &Mutex<S>) -> MutexGuard<'_, S> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
