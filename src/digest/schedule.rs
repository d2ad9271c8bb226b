use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Timelike};
use chrono_tz::Tz;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::reconcile::{DigestEngine, RunOutcome};
use crate::clock::Clock;

/// Owns one digest loop task per guild.
///
/// Each loop runs independently so a slow upstream in one guild cannot stall
/// another's cadence, and each holds its own cancellation channel alongside
/// the process-wide shutdown signal.
pub struct DigestScheduler {
    engine: Arc<DigestEngine>,
    clock: Arc<dyn Clock>,
    cadence_mins: u32,
    backoff: StdDuration,
    shutdown: watch::Receiver<bool>,
    loops: Mutex<HashMap<u64, GuildLoopHandle>>,
}

struct GuildLoopHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DigestScheduler {
    pub fn new(
        engine: Arc<DigestEngine>,
        clock: Arc<dyn Clock>,
        cadence_mins: u32,
        backoff: StdDuration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            engine,
            clock,
            cadence_mins: cadence_mins.clamp(1, 60),
            backoff,
            shutdown,
            loops: Mutex::new(HashMap::new()),
        }
    }

    /// Start the digest loop for a guild if it isn't already running.
    pub fn ensure_guild(&self, guild_id: u64) {
        let mut loops = self.loops.lock().unwrap();
        if let Some(handle) = loops.get(&guild_id) {
            if !handle.task.is_finished() {
                return;
            }
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(run_guild_loop(
            self.engine.clone(),
            self.clock.clone(),
            self.cadence_mins,
            self.backoff,
            guild_id,
            cancel_rx,
            self.shutdown.clone(),
        ));
        loops.insert(
            guild_id,
            GuildLoopHandle {
                cancel: cancel_tx,
                task,
            },
        );
        info!("Started digest loop for guild {}", guild_id);
    }

    /// Stop one guild's loop, e.g. after the bot leaves the guild.
    pub fn stop_guild(&self, guild_id: u64) {
        if let Some(handle) = self.loops.lock().unwrap().remove(&guild_id) {
            let _ = handle.cancel.send(true);
            info!("Stopping digest loop for guild {}", guild_id);
        }
    }

    /// Signal every loop to stop. In-flight runs are allowed to finish; the
    /// loops observe the signal at their next sleep.
    pub fn shutdown(&self) {
        let mut loops = self.loops.lock().unwrap();
        for (guild_id, handle) in loops.drain() {
            debug!("Stopping digest loop for guild {}", guild_id);
            let _ = handle.cancel.send(true);
        }
    }
}

async fn run_guild_loop(
    engine: Arc<DigestEngine>,
    clock: Arc<dyn Clock>,
    cadence_mins: u32,
    backoff: StdDuration,
    guild_id: u64,
    mut cancel: watch::Receiver<bool>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let wait = match engine.run(guild_id).await {
            Ok(report) => {
                match report.outcome {
                    RunOutcome::Skipped => {}
                    RunOutcome::Success if report.created + report.deleted > 0 => info!(
                        "Digest run for guild {}: {} created, {} updated, {} deleted",
                        guild_id, report.created, report.updated, report.deleted
                    ),
                    RunOutcome::Success => debug!(
                        "Digest run for guild {}: {} updated",
                        guild_id, report.updated
                    ),
                    RunOutcome::PartialFailure => warn!(
                        "Digest run for guild {} partially failed: {} day(s) stale until next tick",
                        guild_id, report.failed_days
                    ),
                }
                let now = clock.now();
                (next_fire(now, cadence_mins) - now)
                    .to_std()
                    .unwrap_or(StdDuration::from_secs(60))
            }
            Err(e) => {
                error!("Digest run for guild {} failed unexpectedly: {}", guild_id, e);
                backoff
            }
        };

        debug!(
            "Digest loop for guild {} sleeping {}",
            guild_id,
            humantime::format_duration(wait)
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancel.changed() => break,
            _ = shutdown.changed() => break,
        }
    }

    info!("Digest loop for guild {} stopped", guild_id);
}

/// Instant of the next cadence boundary strictly after `now`, evaluated on
/// the reference-zone wall clock (minute 0, 5, 10, ... for a 5-minute
/// cadence).
pub fn next_fire(now: DateTime<Tz>, cadence_mins: u32) -> DateTime<Tz> {
    let cadence_secs = i64::from(cadence_mins) * 60;
    let into_boundary = i64::from(now.minute() % cadence_mins) * 60 + i64::from(now.second());
    now + Duration::seconds(cadence_secs - into_boundary)
        - Duration::nanoseconds(i64::from(now.nanosecond()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    #[test]
    fn fires_on_the_next_five_minute_boundary() {
        let now = New_York.with_ymd_and_hms(2024, 7, 15, 12, 3, 21).unwrap();
        assert_eq!(
            next_fire(now, 5),
            New_York.with_ymd_and_hms(2024, 7, 15, 12, 5, 0).unwrap()
        );
    }

    #[test]
    fn an_exact_boundary_schedules_the_following_one() {
        let now = New_York.with_ymd_and_hms(2024, 7, 15, 12, 5, 0).unwrap();
        assert_eq!(
            next_fire(now, 5),
            New_York.with_ymd_and_hms(2024, 7, 15, 12, 10, 0).unwrap()
        );
    }

    #[test]
    fn rolls_over_the_hour() {
        let now = New_York.with_ymd_and_hms(2024, 7, 15, 12, 59, 59).unwrap();
        assert_eq!(
            next_fire(now, 5),
            New_York.with_ymd_and_hms(2024, 7, 15, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn truncates_sub_second_noise() {
        let now = New_York
            .with_ymd_and_hms(2024, 7, 15, 12, 3, 21)
            .unwrap()
            .with_nanosecond(250_000_000)
            .unwrap();
        let next = next_fire(now, 5);
        assert_eq!(next.second(), 0);
        assert_eq!(next.nanosecond(), 0);
        assert_eq!(next.minute(), 5);
    }
}
