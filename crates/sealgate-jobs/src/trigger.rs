//! When a scheduled job fires.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

use sealgate_contracts::error::{SealgateError, SealgateResult};

/// A cron-style trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Once a day at `hour:minute` UTC.
    DailyAt { hour: u32, minute: u32 },
    /// Repeatedly, this long after the previous run finished.
    Every(Duration),
}

impl Trigger {
    /// The first firing time strictly after `now`.
    ///
    /// Returns `SealgateError::Configuration` for an out-of-range time of
    /// day or a zero interval.
    pub fn next_after(&self, now: DateTime<Utc>) -> SealgateResult<DateTime<Utc>> {
        match *self {
            Trigger::DailyAt { hour, minute } => {
                let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
                    SealgateError::Configuration {
                        reason: format!("invalid daily trigger time {:02}:{:02}", hour, minute),
                    }
                })?;
                let today = Utc.from_utc_datetime(&now.date_naive().and_time(time));
                if today > now {
                    Ok(today)
                } else {
                    Ok(today + chrono::Duration::days(1))
                }
            }
            Trigger::Every(interval) => {
                if interval.is_zero() {
                    return Err(SealgateError::Configuration {
                        reason: "interval trigger must be positive".to_string(),
                    });
                }
                let step = chrono::Duration::from_std(interval).map_err(|e| {
                    SealgateError::Configuration {
                        reason: format!("interval trigger out of range: {}", e),
                    }
                })?;
                Ok(now + step)
            }
        }
    }

    /// The firing after a run that was due at `fired_at` and finished at `now`.
    ///
    /// Daily triggers step from whichever is later, so a wake-up that lands
    /// just before the due time cannot schedule the same slot again.
    /// Interval triggers always count from `now`.
    pub fn next_after_fire(
        &self,
        fired_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> SealgateResult<DateTime<Utc>> {
        match self {
            Trigger::DailyAt { .. } => self.next_after(fired_at.max(now)),
            Trigger::Every(_) => self.next_after(now),
        }
    }

    /// How long to sleep from `now` until the next firing.
    pub fn delay_from(&self, now: DateTime<Utc>) -> SealgateResult<Duration> {
        let next = self.next_after(now)?;
        Ok(delay_until(next, now))
    }
}

/// Time left from `now` until `target`, zero if already due.
pub(crate) fn delay_until(target: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (target - now).to_std().unwrap_or(Duration::ZERO)
}
