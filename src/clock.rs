//! Time source injected into the services so tests can pin "now".

use std::sync::RwLock;
use time::OffsetDateTime;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<OffsetDateTime>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: time::Duration) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}
