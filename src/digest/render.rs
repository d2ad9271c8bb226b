use chrono::NaiveDate;

use super::{DayBucket, DigestDocument, DAYS_PER_WEEK};
use crate::events::EventStatus;

/// Marker line closing every digest body. Identity matching between a channel
/// message and its day reads this line, never the visible heading.
const DAY_MARKER_PREFIX: &str = "-# schedule-day: ";
const DAY_MARKER_FORMAT: &str = "%Y-%m-%d";

/// Render one day of the digest. Pure; header/footer chrome is derived from
/// the bucket's index in the 7-day sequence and attached at the embed layer.
pub fn render_day(bucket: &DayBucket, today: NaiveDate, index: usize) -> DigestDocument {
    let weekday = bucket.date.format("%A").to_string();
    let date_stamp = bucket.midnight.timestamp();

    let mut body = String::new();
    if bucket.date < today {
        // The day already happened; history is not re-litigated.
        body.push_str(&format!("~~### {weekday} - <t:{date_stamp}:D>~~\n"));
    } else {
        body.push_str(&format!("### {weekday} - <t:{date_stamp}:D>\n"));

        if bucket.events.is_empty() {
            body.push_str("*No events scheduled*\n");
        } else {
            for event in &bucket.events {
                let start = event.starts_at.timestamp();
                body.push_str(&format!(
                    "- [{} - {}]({})\n",
                    event.location_label(),
                    event.name,
                    event.url()
                ));
                if event.status == EventStatus::Active {
                    body.push_str(&format!("  - <t:{start}:t> - Happening now!\n"));
                } else {
                    body.push_str(&format!("  - <t:{start}:t> - <t:{start}:R>\n"));
                }
                if let Some(creator) = event.creator {
                    body.push_str(&format!("  - Hosted by <@{creator}>\n"));
                }
            }
        }
    }
    body.push_str(DAY_MARKER_PREFIX);
    body.push_str(&bucket.date.format(DAY_MARKER_FORMAT).to_string());

    DigestDocument {
        date: bucket.date,
        title: weekday,
        body,
        is_header: index == 0,
        is_footer: index + 1 == DAYS_PER_WEEK,
    }
}

/// Recover the day label from a posted message body. `None` means the message
/// is not a (current-format) digest message.
pub fn parse_day_marker(body: &str) -> Option<NaiveDate> {
    let line = body
        .lines()
        .rev()
        .find(|line| line.starts_with(DAY_MARKER_PREFIX))?;
    NaiveDate::parse_from_str(line[DAY_MARKER_PREFIX.len()..].trim(), DAY_MARKER_FORMAT).ok()
}
