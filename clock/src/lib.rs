pub mod clock {
    use chrono::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Time source of the supervisor.
    ///
    /// `now` is monotonic and measured from the creation of the clock; it drives every
    /// time-triggered transition. `local_time` is only used to name files.
    pub trait Clock {
        fn now(&self) -> Duration;
        fn sleep(&self, duration: Duration);
        fn local_time(&self) -> DateTime<FixedOffset>;

        /// Time elapsed since `since`, a value previously returned by `now`
        fn elapsed_since(&self, since: Duration) -> Duration {
            self.now().saturating_sub(since)
        }
    }

    impl<C: Clock + ?Sized> Clock for &C {
        fn now(&self) -> Duration {
            (**self).now()
        }

        fn sleep(&self, duration: Duration) {
            (**self).sleep(duration)
        }

        fn local_time(&self) -> DateTime<FixedOffset> {
            (**self).local_time()
        }
    }

    /// Wall clock of the host, shifted to a fixed timezone offset.
    #[derive(Clone)]
    pub struct SystemClock {
        start: Instant,
        offset: FixedOffset,
    }

    impl SystemClock {
        // Constructor for SystemClock
        pub fn new(timezone_offset_hours: i32) -> SystemClock {
            let offset =
                FixedOffset::east_opt(timezone_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
            SystemClock {
                start: Instant::now(),
                offset,
            }
        }
    }

    impl Clock for SystemClock {
        fn now(&self) -> Duration {
            self.start.elapsed()
        }

        fn sleep(&self, duration: Duration) {
            thread::sleep(duration);
        }

        fn local_time(&self) -> DateTime<FixedOffset> {
            Utc::now().with_timezone(&self.offset)
        }
    }

    /// Deterministic clock for simulations and tests.
    ///
    /// Time only moves through `advance` or `sleep`, so a sleep returns immediately after
    /// adding its duration. Clones share the same time line.
    #[derive(Clone)]
    pub struct ManualClock {
        elapsed: Rc<Cell<Duration>>,
        origin: DateTime<FixedOffset>,
    }

    impl ManualClock {
        pub fn new() -> ManualClock {
            let origin = Utc
                .timestamp_opt(0, 0)
                .single()
                .unwrap_or_else(Utc::now)
                .with_timezone(&Utc.fix());
            ManualClock {
                elapsed: Rc::new(Cell::new(Duration::ZERO)),
                origin,
            }
        }

        pub fn advance(&self, duration: Duration) {
            self.elapsed.set(self.elapsed.get() + duration);
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Duration {
            self.elapsed.get()
        }

        fn sleep(&self, duration: Duration) {
            self.advance(duration);
        }

        fn local_time(&self) -> DateTime<FixedOffset> {
            let elapsed = chrono::Duration::from_std(self.elapsed.get())
                .unwrap_or_else(|_| chrono::Duration::zero());
            self.origin + elapsed
        }
    }

    /// File name suffix used for captures and snapshots, e.g. `-20240612-134501`
    pub fn file_time_suffix(time: &DateTime<FixedOffset>) -> String {
        time.format("-%Y%m%d-%H%M%S").to_string()
    }

}

pub use clock::{file_time_suffix, Clock, ManualClock, SystemClock};
