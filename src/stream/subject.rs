//! Hot multicast source.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::StreamError;

use super::{Observer, Signal, Source, Stream, Subscription};

type SharedObserver<T> = Rc<RefCell<Box<dyn Observer<T>>>>;

/// A push source that forwards every emission to all current subscribers.
///
/// Emissions triggered while another emission is being delivered (for
/// example from inside a subscriber) are queued and delivered by the
/// outermost call, so subscribers never see interleaved deliveries.
pub struct Subject<T> {
    state: Rc<RefCell<SubjectState<T>>>,
}

struct Entry<T> {
    id: u64,
    observer: SharedObserver<T>,
    active: Rc<Cell<bool>>,
}

struct SubjectState<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
    replay: bool,
    latest: Option<T>,
    terminal: Option<Signal<T>>,
    emitting: bool,
    queue: VecDeque<Signal<T>>,
}

impl<T: Clone + 'static> Subject<T> {
    /// Create a subject that only delivers future emissions.
    pub fn new() -> Self {
        Self::with_state(false, None)
    }

    /// Create a subject that replays its latest value to new subscribers.
    pub fn replay(initial: T) -> Self {
        Self::with_state(true, Some(initial))
    }

    /// Create a replaying subject that has not emitted yet.
    pub fn replay_empty() -> Self {
        Self::with_state(true, None)
    }

    fn with_state(replay: bool, latest: Option<T>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SubjectState {
                entries: Vec::new(),
                next_id: 0,
                replay,
                latest,
                terminal: None,
                emitting: false,
                queue: VecDeque::new(),
            })),
        }
    }

    /// Emit a value.
    pub fn next(&self, value: T) {
        self.push(Signal::Next(value));
    }

    /// Terminate with a failure.
    pub fn fail(&self, error: StreamError) {
        self.push(Signal::Fail(error));
    }

    /// Terminate normally.
    pub fn done(&self) {
        self.push(Signal::Done);
    }

    /// Stream view of this subject.
    pub fn stream(&self) -> Stream<T> {
        Stream::from_source(SubjectSource {
            state: self.state.clone(),
        })
    }

    /// Number of live subscribers.
    pub fn observer_count(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Latest value (replaying subjects only).
    pub fn latest(&self) -> Option<T> {
        self.state.borrow().latest.clone()
    }

    /// Whether `fail` or `done` has been delivered.
    pub fn is_terminated(&self) -> bool {
        self.state.borrow().terminal.is_some()
    }

    fn push(&self, signal: Signal<T>) {
        {
            let mut state = self.state.borrow_mut();
            if state.terminal.is_some() {
                return;
            }
            state.queue.push_back(signal);
            if state.emitting {
                return;
            }
            state.emitting = true;
        }
        drain(&self.state);
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Subject")
            .field("observers", &state.entries.len())
            .field("replay", &state.replay)
            .field("terminated", &state.terminal.is_some())
            .finish()
    }
}

/// Deliver queued signals until the queue is empty.
fn drain<T: Clone + 'static>(state: &Rc<RefCell<SubjectState<T>>>) {
    loop {
        let (signal, targets) = {
            let mut guard = state.borrow_mut();
            let Some(signal) = guard.queue.pop_front() else {
                guard.emitting = false;
                return;
            };
            let targets: Vec<(SharedObserver<T>, Rc<Cell<bool>>)> = guard
                .entries
                .iter()
                .map(|entry| (entry.observer.clone(), entry.active.clone()))
                .collect();
            match &signal {
                Signal::Next(value) => {
                    if guard.replay {
                        guard.latest = Some(value.clone());
                    }
                }
                Signal::Fail(_) | Signal::Done => {
                    guard.terminal = Some(signal.clone());
                    guard.queue.clear();
                    for entry in guard.entries.drain(..) {
                        entry.active.set(false);
                    }
                }
            }
            (signal, targets)
        };

        let terminal = !matches!(signal, Signal::Next(_));
        for (observer, active) in targets {
            // Terminal signals flip `active` off before delivery.
            if !terminal && !active.get() {
                continue;
            }
            signal.clone().deliver(&mut **observer.borrow_mut());
        }
    }
}

struct SubjectSource<T> {
    state: Rc<RefCell<SubjectState<T>>>,
}

impl<T: Clone + 'static> Source<T> for SubjectSource<T> {
    fn subscribe(&self, observer: Box<dyn Observer<T>>) -> Subscription {
        let observer: SharedObserver<T> = Rc::new(RefCell::new(observer));
        let active = Rc::new(Cell::new(true));

        let (id, replay, terminal, owns_drain) = {
            let mut state = self.state.borrow_mut();
            let replay = if state.replay { state.latest.clone() } else { None };
            let terminal = state.terminal.clone();
            let id = state.next_id;
            if terminal.is_none() {
                state.next_id += 1;
                state.entries.push(Entry {
                    id,
                    observer: observer.clone(),
                    active: active.clone(),
                });
            }
            // Emissions triggered by the replay below are queued behind it.
            let owns_drain = !state.emitting;
            state.emitting = true;
            (id, replay, terminal, owns_drain)
        };

        {
            let mut observer = observer.borrow_mut();
            observer.open();
            if let Some(value) = replay {
                observer.next(value);
            }
            if let Some(terminal) = terminal {
                terminal.deliver(&mut **observer);
            }
        }
        if owns_drain {
            drain(&self.state);
        }

        if !active.get() || self.state.borrow().terminal.is_some() {
            return Subscription::closed();
        }

        let state: Weak<RefCell<SubjectState<T>>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            active.set(false);
            if let Some(state) = state.upgrade() {
                state.borrow_mut().entries.retain(|entry| entry.id != id);
            }
        })
    }
}
