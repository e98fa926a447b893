use crate::{
    classifier::Classifier,
    config::{Config, Retry},
    error::ClientResult,
    poll::{CycleOutcome, PollLoop},
    transport::Transport,
};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// Waits between cycles.
pub trait Sleeper {
    /// Returns `false` if the wait was cut short by shutdown.
    fn sleep(&self, delay: Duration) -> bool;
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, delay: Duration) -> bool {
        (**self).sleep(delay)
    }
}

/// Cloneable stop signal. Sleeping on it wakes up as soon as it is triggered.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner()) = true;
        cvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Triggers on the first SIGINT or SIGTERM. A cycle already in flight
    /// finishes before the loop stops.
    pub fn trigger_on_signals(&self) -> std::io::Result<()> {
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let shutdown = self.clone();
        std::thread::Builder::new()
            .name("ddc-signals".into())
            .spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    info!("received signal {sig}, stopping");
                    shutdown.trigger();
                }
            })?;
        Ok(())
    }
}

impl Sleeper for Shutdown {
    fn sleep(&self, delay: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (stopped, _) = cvar
            .wait_timeout_while(guard, delay, |stopped| !*stopped)
            .unwrap_or_else(|e| e.into_inner());
        !*stopped
    }
}

/// Exponential delay between consecutive transport failures.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    max_attempts: u32,
    attempts: u32,
    current: Duration,
}

impl Backoff {
    pub fn new(cfg: &Retry) -> Self {
        let initial_secs = cfg.initial_delay_secs.max(1);
        let initial = Duration::from_secs(initial_secs);
        Self {
            initial,
            max: Duration::from_secs(cfg.max_delay_secs.max(initial_secs)),
            multiplier: cfg.multiplier.max(1.0),
            max_attempts: cfg.max_attempts,
            attempts: 0,
            current: initial,
        }
    }

    /// Delay before the next attempt, or `None` once the attempt budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempts += 1;
        if self.max_attempts > 0 && self.attempts > self.max_attempts {
            return None;
        }
        let delay = self.current;
        self.current = Duration::try_from_secs_f64(self.current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max)
            .min(self.max);
        Some(delay)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.current = self.initial;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Drives [`PollLoop`] cycles until shutdown or a fatal error.
///
/// Empty polls sleep for the idle delay. Transport errors are retried with
/// [`Backoff`] when `[retry]` allows it; every other error is returned.
pub struct Supervisor<T: Transport, C: Classifier, S: Sleeper> {
    poll_loop: PollLoop<T, C>,
    sleeper: S,
    idle_delay: Duration,
    retry: Retry,
}

impl<T: Transport, C: Classifier, S: Sleeper> Supervisor<T, C, S> {
    pub fn new(poll_loop: PollLoop<T, C>, cfg: &Config, sleeper: S) -> Self {
        Self {
            poll_loop,
            sleeper,
            idle_delay: cfg.poll.idle_delay(),
            retry: cfg.retry.clone(),
        }
    }

    pub fn run(&self, shutdown: &Shutdown) -> ClientResult<()> {
        let mut backoff = Backoff::new(&self.retry);

        while !shutdown.is_triggered() {
            let delay = match self.poll_loop.cycle() {
                Ok(CycleOutcome::Idle) => {
                    backoff.reset();
                    info!("sleeping for {}s", self.idle_delay.as_secs());
                    Some(self.idle_delay)
                }
                Ok(CycleOutcome::Reported { .. }) => {
                    backoff.reset();
                    None
                }
                Err(err) if err.is_transport() && self.retry.enabled => {
                    let Some(delay) = backoff.next_delay() else {
                        warn!("giving up after {} transport failures", backoff.attempts());
                        return Err(err);
                    };
                    warn!("{err}; retrying in {}s", delay.as_secs_f64());
                    Some(delay)
                }
                Err(err) => return Err(err),
            };

            if let Some(delay) = delay {
                if !self.sleeper.sleep(delay) {
                    break;
                }
            }
        }

        info!("shutdown requested, poll loop stopped");
        Ok(())
    }
}
