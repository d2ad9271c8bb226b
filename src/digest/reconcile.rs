use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::bucket::bucket_week;
use super::render::{parse_day_marker, render_day};
use super::{
    ChannelTranscript, DigestChannelSource, DigestDocument, PostedMessageRef, TranscriptError,
    TranscriptMessage, DAYS_PER_WEEK,
};
use crate::clock::Clock;
use crate::events::EventCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Guild has no digest channel configured.
    Skipped,
    Success,
    PartialFailure,
}

#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed_days: usize,
}

impl RunReport {
    fn skipped() -> Self {
        Self {
            outcome: RunOutcome::Skipped,
            created: 0,
            updated: 0,
            deleted: 0,
            failed_days: 0,
        }
    }

    /// A fetch failed before any mutation happened.
    fn aborted() -> Self {
        Self {
            outcome: RunOutcome::PartialFailure,
            created: 0,
            updated: 0,
            deleted: 0,
            failed_days: 0,
        }
    }
}

/// Converges a guild's digest channel onto the rendered state of the current
/// week, one message per day.
///
/// The channel itself is the only persistence: each run re-learns which
/// message belongs to which day by parsing the day marker back out of the
/// message bodies, then edits in place (preserving message order and pins) or
/// creates what is missing. A channel that no longer looks like a digest is
/// wiped and reposted.
pub struct DigestEngine {
    channels: Arc<dyn DigestChannelSource>,
    catalog: Arc<dyn EventCatalog>,
    transcript: Arc<dyn ChannelTranscript>,
    clock: Arc<dyn Clock>,
    fetch_limit: u8,
}

impl DigestEngine {
    pub fn new(
        channels: Arc<dyn DigestChannelSource>,
        catalog: Arc<dyn EventCatalog>,
        transcript: Arc<dyn ChannelTranscript>,
        clock: Arc<dyn Clock>,
        fetch_limit: u8,
    ) -> Self {
        Self {
            channels,
            catalog,
            transcript,
            clock,
            fetch_limit,
        }
    }

    /// One reconciliation pass for one guild.
    ///
    /// Collaborator failures are absorbed into the report; `Err` means the
    /// settings store itself broke, which the loop driver backs off on.
    pub async fn run(&self, guild_id: u64) -> anyhow::Result<RunReport> {
        let Some(channel_id) = self.channels.digest_channel(guild_id).await? else {
            debug!("Guild {} has no digest channel configured", guild_id);
            return Ok(RunReport::skipped());
        };

        let today = self.clock.today();
        let week_start = self.clock.week_start();

        let events = match self.catalog.events_in_week(guild_id, week_start).await {
            Ok(events) => events,
            Err(e) => {
                warn!("Fetching this week's events failed for guild {}: {}", guild_id, e);
                return Ok(RunReport::aborted());
            }
        };

        let messages = match self.transcript.fetch_recent(channel_id, self.fetch_limit).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(
                    "Fetching digest channel {} history failed for guild {}: {}",
                    channel_id, guild_id, e
                );
                return Ok(RunReport::aborted());
            }
        };

        let buckets = bucket_week(events, week_start, self.clock.zone());
        let documents: Vec<DigestDocument> = buckets
            .iter()
            .enumerate()
            .map(|(index, bucket)| render_day(bucket, today, index))
            .collect();

        let survey = survey_channel(&messages, &documents);
        let mut posted = survey.matched;

        let mut report = RunReport {
            outcome: RunOutcome::Success,
            created: 0,
            updated: 0,
            deleted: 0,
            failed_days: 0,
        };
        let mut wipe_failed = false;

        if survey.needs_wipe {
            info!(
                "Digest channel {} needs a repost ({}); wiping existing messages",
                channel_id, survey.reason
            );
            for message in messages.iter().filter(|m| m.mine) {
                match self.transcript.delete(channel_id, message.id).await {
                    // Already gone is as good as deleted
                    Ok(()) | Err(TranscriptError::NotFound) => report.deleted += 1,
                    Err(e) => {
                        warn!("Failed deleting message {} during wipe: {}", message.id, e);
                        wipe_failed = true;
                    }
                }
            }
            posted.clear();
        }

        // Edits are issued unconditionally each run: the channel has no
        // compare-before-write, and converging at least once per tick beats
        // suppressing redundant edits.
        for document in &documents {
            let result = match posted.get(&document.date) {
                Some(prior) => self
                    .transcript
                    .edit_in_place(channel_id, prior.message_id, document)
                    .await
                    .map(|()| report.updated += 1),
                None => self
                    .transcript
                    .create(channel_id, document)
                    .await
                    .map(|_| report.created += 1),
            };

            if let Err(e) = result {
                warn!(
                    "Failed posting {} ({}) digest in channel {}: {}",
                    document.title, document.date, channel_id, e
                );
                report.failed_days += 1;
            }
        }

        if report.failed_days > 0 || wipe_failed {
            report.outcome = RunOutcome::PartialFailure;
        }
        Ok(report)
    }
}

struct ChannelSurvey {
    matched: HashMap<NaiveDate, PostedMessageRef>,
    needs_wipe: bool,
    reason: &'static str,
}

/// Recover which bot message belongs to which day of the target week.
///
/// Messages arrive newest first, so the first match per label wins. A bot
/// message whose marker fails to parse or names a date outside the week is
/// alien; aliens, duplicates, or more than 7 bot messages mark the channel
/// dirty. Dirty plus any unmatched day means the page can no longer be
/// trusted and triggers the wipe path.
fn survey_channel(messages: &[TranscriptMessage], documents: &[DigestDocument]) -> ChannelSurvey {
    let targets: HashSet<NaiveDate> = documents.iter().map(|d| d.date).collect();

    let mut matched: HashMap<NaiveDate, PostedMessageRef> = HashMap::new();
    let mut bot_messages = 0usize;
    let mut aliens = 0usize;
    let mut duplicates = false;

    for message in messages.iter().filter(|m| m.mine) {
        bot_messages += 1;
        match parse_day_marker(&message.body) {
            Some(date) if targets.contains(&date) => {
                if matched.contains_key(&date) {
                    duplicates = true;
                } else {
                    matched.insert(
                        date,
                        PostedMessageRef {
                            message_id: message.id,
                            date,
                        },
                    );
                }
            }
            _ => aliens += 1,
        }
    }

    let dirty = aliens > 0 || bot_messages > DAYS_PER_WEEK || duplicates;
    let missing = matched.len() < documents.len();

    let (needs_wipe, reason) = if duplicates {
        (true, "duplicate day labels")
    } else if dirty && missing {
        (true, "unrecognized bot messages alongside missing days")
    } else {
        (false, "")
    };

    ChannelSurvey {
        matched,
        needs_wipe,
        reason,
    }
}
