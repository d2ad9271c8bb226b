use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

/// A guild scheduled event, as the rest of the bot sees it.
///
/// Owned by the event source; herald only ever reads these.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub id: u64,
    pub guild_id: u64,
    pub name: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    /// When present, always >= starts_at.
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub voice_channel: Option<u64>,
    pub status: EventStatus,
    pub creator: Option<u64>,
    pub cover_image_url: Option<String>,
}

impl ScheduledEvent {
    /// Jump link into the Discord client.
    pub fn url(&self) -> String {
        format!("https://discord.com/events/{}/{}", self.guild_id, self.id)
    }

    /// Where the event happens. External events carry a free-form location;
    /// events held in a voice channel are just "Discord".
    pub fn location_label(&self) -> String {
        match (&self.location, self.voice_channel) {
            (Some(location), _) if !location.trim().is_empty() => location.clone(),
            (_, Some(_)) => "Discord".to_string(),
            _ => "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Error)]
#[error("failed fetching scheduled events: {0}")]
pub struct FetchError(pub String);

/// Read-only source of a guild's scheduled events.
#[async_trait]
pub trait EventCatalog: Send + Sync {
    /// Events whose start instant falls within the 7-day window beginning at
    /// `week_start` (a reference-zone date).
    async fn events_in_week(
        &self,
        guild_id: u64,
        week_start: NaiveDate,
    ) -> Result<Vec<ScheduledEvent>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> ScheduledEvent {
        ScheduledEvent {
            id: 42,
            guild_id: 7,
            name: "Movie Night".to_string(),
            description: None,
            starts_at: Utc.with_ymd_and_hms(2024, 7, 16, 22, 0, 0).unwrap(),
            ends_at: None,
            location: None,
            voice_channel: None,
            status: EventStatus::Scheduled,
            creator: None,
            cover_image_url: None,
        }
    }

    #[test]
    fn url_points_at_the_event() {
        assert_eq!(event().url(), "https://discord.com/events/7/42");
    }

    #[test]
    fn location_label_fallbacks() {
        let mut e = event();
        assert_eq!(e.location_label(), "Unknown");

        e.voice_channel = Some(99);
        assert_eq!(e.location_label(), "Discord");

        e.location = Some("The park".to_string());
        assert_eq!(e.location_label(), "The park");

        // Whitespace-only locations fall through like missing ones
        e.location = Some("   ".to_string());
        assert_eq!(e.location_label(), "Discord");
    }
}
