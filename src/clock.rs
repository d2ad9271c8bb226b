use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Source of "now" in the bot's reference time zone.
///
/// Every digest date calculation goes through this so tests can pin the
/// clock instead of racing the wall clock.
pub trait Clock: Send + Sync {
    fn zone(&self) -> Tz;
    fn now(&self) -> DateTime<Tz>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Monday of the week containing today.
    fn week_start(&self) -> NaiveDate {
        let today = self.today();
        today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
    }
}

pub struct SystemClock {
    zone: Tz,
}

impl SystemClock {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }
}

impl Clock for SystemClock {
    fn zone(&self) -> Tz {
        self.zone
    }

    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.zone)
    }
}

/// Local midnight of `date` in `zone`, as a UTC instant.
///
/// If a DST jump removes midnight, the first representable instant of the
/// day is close enough for a date stamp.
pub fn zoned_midnight(date: NaiveDate, zone: Tz) -> DateTime<Utc> {
    let local = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    zone.from_local_datetime(&local)
        .earliest()
        .unwrap_or_else(|| zone.from_utc_datetime(&local))
        .with_timezone(&Utc)
}

/// Pinned clock for tests.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Tz>);

#[cfg(test)]
impl Clock for FixedClock {
    fn zone(&self) -> Tz {
        self.0.timezone()
    }

    fn now(&self) -> DateTime<Tz> {
        self.0
    }
}
