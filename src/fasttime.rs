//! Cheap access to the current unix time.
//!
//! A single [`FastClock`] caches the current timestamp in seconds. It is created on first use,
//! at which point one background thread starts refreshing it every second. Reads are plain atomic
//! loads and never block, so any number of threads may call [`unix_timestamp`] concurrently.
//!
//! Inside unit tests (or after [`set_test_mode`]) the cache is bypassed and the system clock is
//! read directly, so time-sensitive tests don't depend on the refresh cadence.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use crate::config::{Settings, FAST_CLOCK_REFRESH_INTERVAL};

static FAST_CLOCK: OnceLock<FastClock> = OnceLock::new();
static TEST_MODE: AtomicBool = AtomicBool::new(false);

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

#[derive(Debug)]
pub struct FastClock {
    current: AtomicU64,
    refresh: Duration,
    /// set if the refresher thread couldn't be started. Reads go to the system clock.
    detached: AtomicBool,
}

impl FastClock {
    fn new(refresh: Duration) -> Self {
        FastClock {
            current: AtomicU64::new(system_unix_timestamp()),
            refresh,
            detached: AtomicBool::new(false),
        }
    }

    /// Returns the cached unix timestamp in seconds, or the system time in test mode.
    pub fn unix_timestamp(&self) -> u64 {
        if is_test_mode() || self.detached.load(Ordering::Relaxed) {
            return system_unix_timestamp();
        }
        self.cached()
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh
    }

    fn cached(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }

    fn update(&self, ts: u64) {
        self.current.store(ts, Ordering::Relaxed);
    }

    fn spawn_refresher(&'static self) {
        let refresh = self.refresh;
        let res = thread::Builder::new()
            .name("fasttime".to_string())
            .spawn(move || loop {
                thread::sleep(refresh);
                self.update(system_unix_timestamp());
            });
        match res {
            Ok(_) => info!("fasttime: refreshing cached timestamp every {:?}", refresh),
            Err(e) => {
                warn!("fasttime: cannot start refresher thread: {e}; falling back to system clock");
                self.detached.store(true, Ordering::Relaxed);
            }
        }
    }
}

/// Starts the process-wide clock with the given refresh interval. Only the first call has an
/// effect; later calls return the already running clock.
pub fn start(refresh: Duration) -> &'static FastClock {
    let mut created = false;
    let clock = FAST_CLOCK.get_or_init(|| {
        created = true;
        FastClock::new(refresh)
    });
    if created {
        clock.spawn_refresher();
    }
    clock
}

pub fn init(settings: &Settings) -> &'static FastClock {
    start(settings.fast_clock_refresh)
}

pub fn clock() -> &'static FastClock {
    start(FAST_CLOCK_REFRESH_INTERVAL)
}

/// Forces every read to bypass the cache. Meant for test harnesses outside this crate.
pub fn set_test_mode(enabled: bool) {
    TEST_MODE.store(enabled, Ordering::Relaxed);
}

pub fn is_test_mode() -> bool {
    cfg!(test) || TEST_MODE.load(Ordering::Relaxed)
}

/// Returns the current unix timestamp in seconds.
///
/// It is faster than asking the system clock.
pub fn unix_timestamp() -> u64 {
    clock().unix_timestamp()
}

/// Returns the number of days since the unix epoch.
pub fn unix_date() -> u64 {
    unix_timestamp() / SECONDS_PER_DAY
}

/// Returns the number of hours since the unix epoch.
pub fn unix_hour() -> u64 {
    unix_timestamp() / SECONDS_PER_HOUR
}

fn system_unix_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unix_timestamp_bypasses_cache_in_tests() {
        let ts = unix_timestamp();
        let now = system_unix_timestamp();
        assert!(now >= ts && now - ts <= 1, "unexpected timestamp; got {ts}; want {now}");
    }

    #[test]
    fn test_test_mode_ignores_stale_cache() {
        let clock = FastClock::new(Duration::from_secs(3600));
        clock.update(42);
        assert_eq!(clock.cached(), 42);
        let ts = clock.unix_timestamp();
        assert!(ts > 42, "expected system time in test mode; got {ts}");
    }

    #[test]
    fn test_start_is_idempotent() {
        let first = start(Duration::from_millis(10));
        let second = clock();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.refresh_interval(), second.refresh_interval());
    }

    #[test]
    fn test_unix_date_and_hour() {
        let ts = unix_timestamp();
        let date = unix_date();
        let hour = unix_hour();
        assert!(date == ts / SECONDS_PER_DAY || date == ts / SECONDS_PER_DAY + 1);
        assert!(hour == ts / SECONDS_PER_HOUR || hour == ts / SECONDS_PER_HOUR + 1);
        assert!(hour / 24 >= date - 1 && hour / 24 <= date);
    }

    #[test]
    fn test_concurrent_reads() {
        let clock = Arc::new(FastClock::new(Duration::from_secs(1)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let clock = clock.clone();
                thread::spawn(move || {
                    let mut prev = 0;
                    for _ in 0..1000 {
                        let ts = clock.unix_timestamp();
                        assert!(ts >= prev, "time went backwards; got {ts}; prev {prev}");
                        prev = ts;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}
