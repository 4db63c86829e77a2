//! Time-of-day scheduler for full syncs.
//!
//! The loop wakes on a fixed interval, well below a minute, and launches a
//! full sync whenever the local wall-clock minute equals a configured trigger
//! time. A trigger minute fires at most once however many ticks land in it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::FetchPipeline;
use crate::config::SchedulerConfig;
use crate::datetime::to_rfc3339;
use crate::{OarssError, Result};

/// How often the clock is checked.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Trigger times used when none of the configured ones is valid.
pub const DEFAULT_TRIGGER_TIMES: &[&str] = &["07:00", "12:00", "20:00"];

/// A time of day at minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerTime {
    pub hour: u32,
    pub minute: u32,
}

impl TriggerTime {
    /// Parse `H:MM` or `HH:MM`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || OarssError::Validation(format!("invalid trigger time '{s}'"));

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty()
            || hour.len() > 2
            || minute.len() != 2
            || !hour.chars().all(|c| c.is_ascii_digit())
            || !minute.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        if hour >= 24 || minute >= 60 {
            return Err(invalid());
        }
        Ok(Self { hour, minute })
    }

    /// Whether a local time falls in this minute.
    pub fn matches(&self, local: &NaiveDateTime) -> bool {
        local.hour() == self.hour && local.minute() == self.minute
    }
}

impl fmt::Display for TriggerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parse configured times, dropping invalid entries.
///
/// Falls back to [`DEFAULT_TRIGGER_TIMES`] when nothing valid remains.
pub fn parse_trigger_times(times: &[String]) -> BTreeSet<TriggerTime> {
    let mut parsed = BTreeSet::new();
    for time in times {
        match TriggerTime::parse(time) {
            Ok(t) => {
                parsed.insert(t);
            }
            Err(e) => warn!("Ignoring scheduler time: {}", e),
        }
    }

    if parsed.is_empty() {
        warn!("No valid scheduler times configured, using defaults");
        parsed = DEFAULT_TRIGGER_TIMES
            .iter()
            .filter_map(|t| TriggerTime::parse(t).ok())
            .collect();
    }
    parsed
}

/// Snapshot of the scheduler for the API.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub times: Vec<String>,
    pub timezone: String,
    pub next_run: Option<String>,
}

/// Local minutes since the epoch.
fn minute_key(local: &NaiveDateTime) -> i64 {
    local.and_utc().timestamp().div_euclid(60)
}

/// Shared by the scheduler handle and its loop.
struct Trigger {
    pipeline: FetchPipeline,
    times: BTreeSet<TriggerTime>,
    tz: Tz,
    /// Minute (local, in minutes since the epoch) that last launched a sync.
    last_fired: AtomicI64,
}

impl Trigger {
    fn now_local(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }

    fn tick_at(&self, local: NaiveDateTime) -> bool {
        if !self.times.iter().any(|t| t.matches(&local)) {
            return false;
        }

        let minute_key = minute_key(&local);
        if self.last_fired.swap(minute_key, Ordering::SeqCst) == minute_key {
            debug!("Trigger at {} already fired", local.format("%H:%M"));
            return false;
        }

        info!("Scheduled sync at {}", local.format("%Y-%m-%d %H:%M"));
        self.pipeline.spawn_sync_all();
        true
    }

    /// Treat the minute of `local` as already fired.
    fn mark_fired(&self, local: NaiveDateTime) {
        self.last_fired.store(minute_key(&local), Ordering::SeqCst);
    }

    fn next_run(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local_now = now.with_timezone(&self.tz).naive_local();
        let today = local_now.date();
        let tomorrow = today.checked_add_days(Days::new(1))?;

        [today, tomorrow]
            .iter()
            .flat_map(|day| {
                self.times
                    .iter()
                    .filter_map(move |t| day.and_hms_opt(t.hour, t.minute, 0))
            })
            .filter(|candidate| *candidate > local_now)
            .filter_map(|candidate| self.tz.from_local_datetime(&candidate).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .min()
    }
}

enum SchedulerState {
    Stopped,
    Running {
        stop_tx: oneshot::Sender<()>,
        handle: JoinHandle<()>,
    },
}

/// Scheduler with a start/stop lifecycle and a manual trigger.
pub struct Scheduler {
    trigger: Arc<Trigger>,
    check_interval: Duration,
    state: Mutex<SchedulerState>,
}

impl Scheduler {
    /// Create a stopped scheduler.
    pub fn new(pipeline: FetchPipeline, config: &SchedulerConfig) -> Self {
        let tz = config.timezone.parse::<Tz>().unwrap_or_else(|_| {
            warn!("Unknown timezone '{}', using UTC", config.timezone);
            Tz::UTC
        });
        Self {
            trigger: Arc::new(Trigger {
                pipeline,
                times: parse_trigger_times(&config.times),
                tz,
                last_fired: AtomicI64::new(i64::MIN),
            }),
            check_interval: DEFAULT_CHECK_INTERVAL,
            state: Mutex::new(SchedulerState::Stopped),
        }
    }

    /// Set how often the clock is checked.
    pub fn with_check_interval(mut self, check_interval: Duration) -> Self {
        self.check_interval = check_interval;
        self
    }

    /// Effective trigger times as `HH:MM`, sorted.
    pub fn trigger_times(&self) -> Vec<String> {
        self.trigger.times.iter().map(ToString::to_string).collect()
    }

    pub fn timezone(&self) -> Tz {
        self.trigger.tz
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.state.lock().await, SchedulerState::Running { .. })
    }

    /// Start the loop and launch one full sync.
    ///
    /// Returns `false` if the scheduler was already running.
    pub async fn start(&self) -> bool {
        let mut state = self.state.lock().await;
        if matches!(*state, SchedulerState::Running { .. }) {
            return false;
        }

        // The startup sync below covers the current minute.
        self.trigger.mark_fired(self.trigger.now_local());

        let (stop_tx, stop_rx) = oneshot::channel();
        let trigger = Arc::clone(&self.trigger);
        let handle = tokio::spawn(run_loop(trigger, self.check_interval, stop_rx));
        *state = SchedulerState::Running { stop_tx, handle };

        info!(
            "Scheduler started (times: {}, timezone: {})",
            self.trigger_times().join(", "),
            self.trigger.tz
        );
        self.trigger.pipeline.spawn_sync_all();
        true
    }

    /// Stop the loop and wait for it to exit.
    ///
    /// Syncs already launched keep running. Returns `false` if the scheduler
    /// was not running.
    pub async fn stop(&self) -> bool {
        let mut state = self.state.lock().await;
        let SchedulerState::Running { stop_tx, handle } =
            std::mem::replace(&mut *state, SchedulerState::Stopped)
        else {
            return false;
        };

        // The loop may already be gone; the join below covers both cases.
        let _ = stop_tx.send(());
        if let Err(e) = handle.await {
            error!("Scheduler loop ended abnormally: {}", e);
        }
        true
    }

    /// Evaluate one clock tick at a local time.
    ///
    /// Returns whether a full sync was launched.
    pub fn tick_at(&self, local: NaiveDateTime) -> bool {
        self.trigger.tick_at(local)
    }

    /// Launch a sync now: one channel when given, otherwise all of them.
    pub fn trigger_manual(&self, real_id: Option<&str>) {
        match real_id {
            Some(id) => info!("Manual sync of channel {}", id),
            None => info!("Manual sync of all channels"),
        }
        self.trigger.pipeline.trigger(real_id);
    }

    /// Next scheduled run after `now`.
    pub fn next_run(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.trigger.next_run(now)
    }

    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running().await,
            times: self.trigger_times(),
            timezone: self.trigger.tz.to_string(),
            next_run: self.next_run(Utc::now()).map(|dt| to_rfc3339(&dt)),
        }
    }
}

async fn run_loop(
    trigger: Arc<Trigger>,
    check_interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut timer = interval(check_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer.reset();

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                info!("Scheduler stopped");
                break;
            }
            _ = timer.tick() => {
                trigger.tick_at(trigger.now_local());
            }
        }
    }
}
