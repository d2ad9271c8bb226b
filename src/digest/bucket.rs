use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;

use super::{DayBucket, DAYS_PER_WEEK};
use crate::clock::zoned_midnight;
use crate::events::ScheduledEvent;

/// Group events into one bucket per day of the week starting at `week_start`.
///
/// An event lands in the bucket for the reference-zone date of its start
/// instant. Events outside the window are dropped silently; the catalog is
/// expected to window its fetch, this just guards against stragglers.
pub fn bucket_week(events: Vec<ScheduledEvent>, week_start: NaiveDate, zone: Tz) -> Vec<DayBucket> {
    let mut buckets: Vec<DayBucket> = (0..DAYS_PER_WEEK)
        .map(|offset| {
            let date = week_start + Duration::days(offset as i64);
            DayBucket {
                date,
                midnight: zoned_midnight(date, zone),
                events: Vec::new(),
            }
        })
        .collect();

    for event in events {
        let local_date = event.starts_at.with_timezone(&zone).date_naive();
        let Ok(offset) = usize::try_from((local_date - week_start).num_days()) else {
            continue;
        };
        if offset >= DAYS_PER_WEEK {
            continue;
        }
        buckets[offset].events.push(event);
    }

    for bucket in &mut buckets {
        bucket.events.sort_by_key(|event| event.starts_at);
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventStatus;
    use chrono::{TimeZone, Utc};
    use chrono_tz::America::New_York;

    fn event(id: u64, starts_at: chrono::DateTime<Utc>) -> ScheduledEvent {
        ScheduledEvent {
            id,
            guild_id: 1,
            name: format!("event-{id}"),
            description: None,
            starts_at,
            ends_at: None,
            location: None,
            voice_channel: None,
            status: EventStatus::Scheduled,
            creator: None,
            cover_image_url: None,
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    #[test]
    fn every_windowed_event_lands_in_exactly_one_bucket() {
        let events = vec![
            // Tuesday 18:00 New York == 22:00 UTC
            event(1, Utc.with_ymd_and_hms(2024, 7, 16, 22, 0, 0).unwrap()),
            // Sunday late evening local
            event(2, Utc.with_ymd_and_hms(2024, 7, 22, 1, 30, 0).unwrap()),
            // Monday 00:00 local exactly
            event(3, Utc.with_ymd_and_hms(2024, 7, 15, 4, 0, 0).unwrap()),
        ];

        let buckets = bucket_week(events, monday(), New_York);
        assert_eq!(buckets.len(), DAYS_PER_WEEK);

        let placed: usize = buckets.iter().map(|b| b.events.len()).sum();
        assert_eq!(placed, 3);
        assert_eq!(buckets[0].events[0].id, 3);
        assert_eq!(buckets[1].events[0].id, 1);
        // 01:30 UTC Monday the 22nd is still Sunday the 21st in New York
        assert_eq!(buckets[6].events[0].id, 2);
    }

    #[test]
    fn buckets_are_ordered_by_start_time() {
        let events = vec![
            event(2, Utc.with_ymd_and_hms(2024, 7, 17, 20, 0, 0).unwrap()),
            event(1, Utc.with_ymd_and_hms(2024, 7, 17, 18, 0, 0).unwrap()),
            event(3, Utc.with_ymd_and_hms(2024, 7, 17, 19, 0, 0).unwrap()),
        ];

        let buckets = bucket_week(events, monday(), New_York);
        let ids: Vec<u64> = buckets[2].events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn out_of_window_events_are_dropped() {
        let events = vec![
            // The Sunday before the window
            event(1, Utc.with_ymd_and_hms(2024, 7, 14, 22, 0, 0).unwrap()),
            // The Monday after
            event(2, Utc.with_ymd_and_hms(2024, 7, 22, 22, 0, 0).unwrap()),
        ];

        let buckets = bucket_week(events, monday(), New_York);
        assert!(buckets.iter().all(|b| b.events.is_empty()));
    }

    #[test]
    fn empty_input_still_yields_seven_buckets() {
        let buckets = bucket_week(Vec::new(), monday(), New_York);
        assert_eq!(buckets.len(), 7);
        let dates: Vec<NaiveDate> = buckets.iter().map(|b| b.date).collect();
        for pair in dates.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }
}
