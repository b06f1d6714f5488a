//! Stream combinators: `of`, `map`, `distinct`, `take`, `merge`.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::StreamError;

use super::{Observer, Signal, Source, Stream, Subscription};

impl<T: Clone + 'static> Stream<T> {
    /// Cold stream that emits `values` synchronously on subscribe, then completes.
    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        Stream::from_source(OfSource {
            values: values.into_iter().collect(),
        })
    }

    /// Keep only the first `count` values, then complete and cancel upstream.
    pub fn take(&self, count: usize) -> Self {
        Stream::from_source(TakeSource {
            upstream: self.clone(),
            count,
        })
    }

    /// Interleave the emissions of several streams.
    ///
    /// Completes when every input completed; fails on the first failure.
    pub fn merge(streams: impl IntoIterator<Item = Stream<T>>) -> Self {
        Stream::from_source(MergeSource {
            streams: streams.into_iter().collect(),
        })
    }
}

impl<T: Clone + PartialEq + 'static> Stream<T> {
    /// Suppress adjacent duplicates. The first value always passes.
    pub fn distinct(&self) -> Self {
        Stream::from_source(DistinctSource {
            upstream: self.clone(),
        })
    }
}

impl<T: 'static> Stream<T> {
    /// Transform every value.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Stream<U> {
        Stream::from_source(MapSource {
            upstream: self.clone(),
            f: Rc::new(f),
        })
    }
}

// =============================================================================
// of
// =============================================================================

struct OfSource<T> {
    values: Vec<T>,
}

impl<T: Clone> Source<T> for OfSource<T> {
    fn subscribe(&self, mut observer: Box<dyn Observer<T>>) -> Subscription {
        observer.open();
        for value in &self.values {
            observer.next(value.clone());
        }
        observer.done();
        Subscription::closed()
    }
}

// =============================================================================
// map
// =============================================================================

struct MapSource<T, U> {
    upstream: Stream<T>,
    f: Rc<dyn Fn(T) -> U>,
}

impl<T: 'static, U: 'static> Source<U> for MapSource<T, U> {
    fn subscribe(&self, observer: Box<dyn Observer<U>>) -> Subscription {
        self.upstream.subscribe(MapObserver {
            downstream: observer,
            f: self.f.clone(),
        })
    }
}

struct MapObserver<T, U> {
    downstream: Box<dyn Observer<U>>,
    f: Rc<dyn Fn(T) -> U>,
}

impl<T, U> Observer<T> for MapObserver<T, U> {
    fn open(&mut self) {
        self.downstream.open();
    }

    fn next(&mut self, value: T) {
        self.downstream.next((self.f)(value));
    }

    fn fail(&mut self, error: StreamError) {
        self.downstream.fail(error);
    }

    fn done(&mut self) {
        self.downstream.done();
    }
}

// =============================================================================
// distinct
// =============================================================================

struct DistinctSource<T> {
    upstream: Stream<T>,
}

impl<T: Clone + PartialEq + 'static> Source<T> for DistinctSource<T> {
    fn subscribe(&self, observer: Box<dyn Observer<T>>) -> Subscription {
        self.upstream.subscribe(DistinctObserver {
            downstream: observer,
            last: None,
        })
    }
}

struct DistinctObserver<T> {
    downstream: Box<dyn Observer<T>>,
    last: Option<T>,
}

impl<T: Clone + PartialEq> Observer<T> for DistinctObserver<T> {
    fn open(&mut self) {
        self.downstream.open();
    }

    fn next(&mut self, value: T) {
        if self.last.as_ref() == Some(&value) {
            return;
        }
        self.last = Some(value.clone());
        self.downstream.next(value);
    }

    fn fail(&mut self, error: StreamError) {
        self.downstream.fail(error);
    }

    fn done(&mut self) {
        self.downstream.done();
    }
}

// =============================================================================
// take
// =============================================================================

struct TakeSource<T> {
    upstream: Stream<T>,
    count: usize,
}

impl<T: Clone + 'static> Source<T> for TakeSource<T> {
    fn subscribe(&self, mut observer: Box<dyn Observer<T>>) -> Subscription {
        if self.count == 0 {
            observer.open();
            observer.done();
            return Subscription::closed();
        }

        let finished = Rc::new(Cell::new(false));
        let upstream_slot: Rc<RefCell<Option<Subscription>>> = Rc::default();
        let subscription = self.upstream.subscribe(TakeObserver {
            downstream: observer,
            remaining: self.count,
            finished: finished.clone(),
            upstream: upstream_slot.clone(),
        });

        // The quota may already be spent by a synchronous replay.
        if finished.get() {
            subscription.cancel();
        } else {
            *upstream_slot.borrow_mut() = Some(subscription.clone());
        }
        subscription
    }
}

struct TakeObserver<T> {
    downstream: Box<dyn Observer<T>>,
    remaining: usize,
    finished: Rc<Cell<bool>>,
    upstream: Rc<RefCell<Option<Subscription>>>,
}

impl<T> Observer<T> for TakeObserver<T> {
    fn open(&mut self) {
        self.downstream.open();
    }

    fn next(&mut self, value: T) {
        if self.finished.get() {
            return;
        }
        self.remaining -= 1;
        self.downstream.next(value);
        if self.remaining == 0 {
            self.finished.set(true);
            self.downstream.done();
            let upstream = self.upstream.borrow_mut().take();
            if let Some(upstream) = upstream {
                upstream.cancel();
            }
        }
    }

    fn fail(&mut self, error: StreamError) {
        if !self.finished.replace(true) {
            self.downstream.fail(error);
        }
    }

    fn done(&mut self) {
        if !self.finished.replace(true) {
            self.downstream.done();
        }
    }
}

// =============================================================================
// merge
// =============================================================================

struct MergeSource<T> {
    streams: Vec<Stream<T>>,
}

impl<T: Clone + 'static> Source<T> for MergeSource<T> {
    fn subscribe(&self, mut observer: Box<dyn Observer<T>>) -> Subscription {
        observer.open();
        if self.streams.is_empty() {
            observer.done();
            return Subscription::closed();
        }

        let relay = Rc::new(Relay {
            observer: RefCell::new(observer),
            queue: RefCell::new(VecDeque::new()),
            busy: Cell::new(false),
            closed: Cell::new(false),
            remaining: Cell::new(self.streams.len()),
        });

        let subscriptions = self
            .streams
            .iter()
            .map(|stream| {
                stream.subscribe(MergeObserver {
                    relay: relay.clone(),
                })
            })
            .collect();
        Subscription::all(subscriptions)
    }
}

/// Serializes deliveries from several upstreams into one observer.
struct Relay<T> {
    observer: RefCell<Box<dyn Observer<T>>>,
    queue: RefCell<VecDeque<Signal<T>>>,
    busy: Cell<bool>,
    closed: Cell<bool>,
    remaining: Cell<usize>,
}

impl<T> Relay<T> {
    fn push(&self, signal: Signal<T>) {
        if self.closed.get() {
            return;
        }
        if !matches!(signal, Signal::Next(_)) {
            self.closed.set(true);
        }
        self.queue.borrow_mut().push_back(signal);
        if self.busy.replace(true) {
            return;
        }
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(signal) = next else { break };
            signal.deliver(&mut **self.observer.borrow_mut());
        }
        self.busy.set(false);
    }
}

struct MergeObserver<T> {
    relay: Rc<Relay<T>>,
}

impl<T> Observer<T> for MergeObserver<T> {
    fn next(&mut self, value: T) {
        self.relay.push(Signal::Next(value));
    }

    fn fail(&mut self, error: StreamError) {
        self.relay.push(Signal::Fail(error));
    }

    fn done(&mut self) {
        let remaining = self.relay.remaining.get().saturating_sub(1);
        self.relay.remaining.set(remaining);
        if remaining == 0 {
            self.relay.push(Signal::Done);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Subject;

    fn record<T: Clone + 'static>(stream: &Stream<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let subscription = stream.subscribe_next(move |value| sink.borrow_mut().push(value));
        (seen, subscription)
    }

    #[test]
    fn test_of_emits_synchronously() {
        let (seen, subscription) = record(&Stream::of([1, 2, 3]));
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        assert!(subscription.is_closed());
    }

    #[test]
    fn test_map_and_distinct() {
        let subject = Subject::new();
        let (seen, _sub) = record(&subject.stream().map(|n: u32| n / 10).distinct());

        for n in [1, 5, 12, 19, 3, 30] {
            subject.next(n);
        }
        assert_eq!(*seen.borrow(), vec![0, 1, 0, 3]);
    }

    #[test]
    fn test_distinct_passes_first_value() {
        let subject = Subject::replay("x".to_string());
        let (seen, _sub) = record(&subject.stream().distinct());
        subject.next("x".to_string());
        assert_eq!(*seen.borrow(), vec!["x".to_string()]);
    }

    #[test]
    fn test_take_cancels_upstream() {
        let subject = Subject::new();
        let (seen, _sub) = record(&subject.stream().take(2));
        assert_eq!(subject.observer_count(), 1);

        subject.next('a');
        subject.next('b');
        subject.next('c');

        assert_eq!(*seen.borrow(), vec!['a', 'b']);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn test_take_after_replay() {
        let subject = Subject::replay(7);
        let (seen, subscription) = record(&subject.stream().take(1));
        assert_eq!(*seen.borrow(), vec![7]);
        assert!(subscription.is_closed());
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn test_merge_interleaves_and_cancels_all() {
        let left = Subject::new();
        let right = Subject::new();
        let merged = Stream::merge([left.stream(), right.stream()]);
        let (seen, subscription) = record(&merged);

        left.next(1);
        right.next(2);
        left.next(3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);

        subscription.cancel();
        assert_eq!(left.observer_count(), 0);
        assert_eq!(right.observer_count(), 0);
    }

    #[test]
    fn test_merge_completes_after_all_inputs() {
        struct Done(Rc<Cell<bool>>);
        impl Observer<u8> for Done {
            fn next(&mut self, _value: u8) {}
            fn done(&mut self) {
                self.0.set(true);
            }
        }

        let left = Subject::new();
        let right = Subject::new();
        let done = Rc::new(Cell::new(false));
        let _sub = Stream::merge([left.stream(), right.stream()]).subscribe(Done(done.clone()));

        left.done();
        assert!(!done.get());
        right.done();
        assert!(done.get());
    }
}
