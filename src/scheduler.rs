//! Cooperative timers.
//!
//! Nothing here owns a thread or a real timer. Each primitive holds at most
//! one pending deadline and is driven by the embedding loop, which passes the
//! current time in milliseconds to `call`/`poll`.

#[derive(Debug, Clone)]
struct Pending<T> {
    due_ms: u64,
    payload: T,
}

/// Runs once, `delay_ms` after the most recent call, with the payload of that
/// call.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay_ms: u64,
    pending: Option<Pending<T>>,
}

impl<T> Debounce<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    /// Restart the delay window, replacing any pending payload.
    pub fn call(&mut self, now_ms: u64, payload: T) {
        self.pending = Some(Pending {
            due_ms: now_ms.saturating_add(self.delay_ms),
            payload,
        });
    }

    /// Take the payload if its window has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        match &self.pending {
            Some(p) if p.due_ms <= now_ms => self.pending.take().map(|p| p.payload),
            _ => None,
        }
    }

    /// Take the pending payload without waiting for the window.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.payload)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// At most one run per `interval_ms`, leading and trailing edge.
///
/// The first call in a quiet period runs immediately. Calls inside the
/// cooldown collapse into one trailing run at the end of the cooldown that
/// carries the latest payload.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval_ms: u64,
    last_run_ms: Option<u64>,
    trailing: Option<Pending<T>>,
}

impl<T> Throttle<T> {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_run_ms: None,
            trailing: None,
        }
    }

    /// Returns the payload when the caller should run now.
    pub fn call(&mut self, now_ms: u64, payload: T) -> Option<T> {
        match self.last_run_ms {
            Some(last) if now_ms.saturating_sub(last) < self.interval_ms => {
                let due_ms = last.saturating_add(self.interval_ms);
                match &mut self.trailing {
                    Some(p) => p.payload = payload,
                    None => self.trailing = Some(Pending { due_ms, payload }),
                }
                None
            }
            _ => {
                self.last_run_ms = Some(now_ms);
                self.trailing = None;
                Some(payload)
            }
        }
    }

    /// Returns the trailing payload once its cooldown has ended.
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        match &self.trailing {
            Some(p) if p.due_ms <= now_ms => {
                self.last_run_ms = Some(now_ms);
                self.trailing.take().map(|p| p.payload)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.trailing = None;
    }

    pub fn is_pending(&self) -> bool {
        self.trailing.is_some()
    }
}

/// Repeating deadline with a switchable period.
#[derive(Debug, Clone)]
pub struct Interval {
    period_ms: u64,
    next_due_ms: Option<u64>,
}

impl Interval {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            next_due_ms: None,
        }
    }

    pub fn start(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms.saturating_add(self.period_ms));
    }

    /// Change the period; the next run is one new period from `now_ms`.
    pub fn set_period(&mut self, now_ms: u64, period_ms: u64) {
        self.period_ms = period_ms.max(1);
        if self.next_due_ms.is_some() {
            self.start(now_ms);
        }
    }

    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.next_due_ms {
            Some(due) if due <= now_ms => {
                self.next_due_ms = Some(now_ms.saturating_add(self.period_ms));
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.next_due_ms = None;
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn is_running(&self) -> bool {
        self.next_due_ms.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_flush_returns_payload_early() {
        let mut d = Debounce::new(100);
        d.call(0, 7);
        assert_eq!(d.flush(), Some(7));
        assert_eq!(d.poll(200), None);
    }

    #[test]
    fn throttle_quiet_period_runs_immediately() {
        let mut t = Throttle::new(200);
        assert_eq!(t.call(0, ()), Some(()));
        assert_eq!(t.call(500, ()), Some(()));
        assert!(!t.is_pending());
    }
}
