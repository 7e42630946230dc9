use event_listener::{Event, Listener};
use once_cell::sync::OnceCell;

/// A one-shot completion signal carrying a value.
///
/// Starts unfired. The first call to `fire` stores the value and wakes every
/// waiter; later calls are rejected. Once fired, the value is read through
/// `OnceCell::get`, which is an acquire load and takes no lock.
pub(crate) struct ReadySignal<T> {
    value: OnceCell<T>,
    fired: Event,
}

impl<T> Default for ReadySignal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReadySignal<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: OnceCell::new(),
            fired: Event::new(),
        }
    }

    pub(crate) fn is_fired(&self) -> bool {
        self.value.get().is_some()
    }

    /// Returns the value if the signal has fired. Never blocks.
    pub(crate) fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Stores `value` and wakes all waiters.
    ///
    /// Returns the value back if the signal has already fired.
    pub(crate) fn fire(&self, value: T) -> Result<&T, T> {
        match self.value.try_insert(value) {
            Ok(stored) => {
                self.fired.notify(usize::MAX);
                Ok(stored)
            }
            Err((_, rejected)) => Err(rejected),
        }
    }

    /// Blocks the current thread until the signal fires.
    pub(crate) fn wait_blocking(&self) -> &T {
        loop {
            if let Some(value) = self.value.get() {
                return value;
            }
            // Register before re-checking so a `fire` racing with us cannot be
            // missed.
            let listener = self.fired.listen();
            if let Some(value) = self.value.get() {
                return value;
            }
            listener.wait();
        }
    }

    /// Waits asynchronously until the signal fires.
    #[cfg(feature = "future")]
    pub(crate) async fn wait(&self) -> &T {
        loop {
            if let Some(value) = self.value.get() {
                return value;
            }
            let listener = self.fired.listen();
            if let Some(value) = self.value.get() {
                return value;
            }
            listener.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReadySignal;

    use std::{sync::Arc, thread, time::Duration};

    #[test]
    fn fires_only_once() {
        let signal = ReadySignal::new();
        assert!(!signal.is_fired());
        assert_eq!(signal.get(), None);

        assert_eq!(signal.fire(1), Ok(&1));
        assert_eq!(signal.fire(2), Err(2));

        assert!(signal.is_fired());
        assert_eq!(signal.get(), Some(&1));
        assert_eq!(signal.wait_blocking(), &1);
    }

    #[test]
    fn wakes_every_blocked_waiter() {
        const NUM_WAITERS: usize = 8;

        let signal = Arc::new(ReadySignal::<String>::new());

        let waiters: Vec<_> = (0..NUM_WAITERS)
            .map(|_| {
                let signal = Arc::clone(&signal);
                thread::spawn(move || signal.wait_blocking().clone())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        signal.fire("ready".to_string()).unwrap();

        for w in waiters {
            assert_eq!(w.join().expect("waiter panicked"), "ready");
        }
    }

    #[cfg(feature = "future")]
    #[tokio::test]
    async fn wakes_async_waiters() {
        let signal = Arc::new(ReadySignal::<u32>::new());

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let signal = Arc::clone(&signal);
                tokio::spawn(async move { *signal.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        signal.fire(42).unwrap();

        for w in waiters {
            assert_eq!(w.await.unwrap(), 42);
        }
    }
}
