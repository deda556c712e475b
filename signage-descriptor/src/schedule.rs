//! Weekly standby table to wallclock recurrence conversion.
//!
//! Each standby period turns into a screen-off ("end") marker at its start
//! and a screen-on ("begin") marker at its end. Markers repeat weekly from
//! an anchor date one month before the build date:
//!
//! ```text
//! wallclock(R/2024-04-16+w1T22:00:00/P1W)
//! ```
//!
//! `+wN` selects the Nth weekday (0 = Sunday) on or after the anchor.

use std::fmt;

use chrono::{Months, NaiveDate, NaiveTime};
use log::warn;
use serde::Serialize;

use crate::error::DescriptorError;
use crate::trigger::RepeatUnit;
use crate::types::{PlayerConfiguration, WeekdaySchedule};

/// `end` value meaning "dark until midnight" (no wake marker).
pub const UNTIL_MIDNIGHT: &str = "00:00";

const SUNDAY: u8 = 0;
const MONDAY: u8 = 1;
const SATURDAY: u8 = 6;

/// One weekly recurring point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallclockMarker {
    pub anchor: NaiveDate,
    pub weekday: u8,
    pub time: NaiveTime,
}

impl fmt::Display for WallclockMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wallclock(R/{}+w{}T{}/{})",
            self.anchor.format("%Y-%m-%d"),
            self.weekday,
            self.time.format("%H:%M:%S"),
            RepeatUnit::Weeks.period(1)
        )
    }
}

/// Encoded standby expressions, each a `;`-joined marker list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StandbySchedule {
    /// Screen-on markers.
    pub begin: String,
    /// Screen-off markers.
    pub end: String,
}

#[derive(Debug, Default)]
struct Markers {
    begin: Vec<WallclockMarker>,
    end: Vec<WallclockMarker>,
}

impl Markers {
    fn push_end(mut self, marker: WallclockMarker) -> Self {
        self.end.push(marker);
        self
    }

    fn push_begin(mut self, marker: WallclockMarker) -> Self {
        self.begin.push(marker);
        self
    }
}

/// Parse the build date given as `YYYY-MM-DD`.
pub fn parse_now(value: &str) -> Result<NaiveDate, DescriptorError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| DescriptorError::InvalidNow(format!("{:?}: {}", value, e)))
}

/// Recurrence anchor: one calendar month before `now`.
pub fn anchor_date(now: NaiveDate) -> Result<NaiveDate, DescriptorError> {
    now.checked_sub_months(Months::new(1))
        .ok_or_else(|| DescriptorError::AnchorDate(now.to_string()))
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

fn fold_weekday(markers: Markers, day: &WeekdaySchedule, anchor: NaiveDate) -> Markers {
    if day.weekday > SATURDAY {
        warn!("Ignoring screen times for invalid weekday {}", day.weekday);
        return markers;
    }

    day.periods.iter().fold(markers, |markers, period| {
        let (Some(start), Some(end)) = (parse_time(&period.start), parse_time(&period.end)) else {
            warn!(
                "Ignoring malformed standby period {}-{} on weekday {}",
                period.start, period.end, day.weekday
            );
            return markers;
        };

        let markers = markers.push_end(WallclockMarker {
            anchor,
            weekday: day.weekday,
            time: start,
        });
        if period.end.trim() == UNTIL_MIDNIGHT {
            markers
        } else {
            markers.push_begin(WallclockMarker {
                anchor,
                weekday: day.weekday,
                time: end,
            })
        }
    })
}

fn join(markers: &[WallclockMarker]) -> String {
    markers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Encode a weekly standby table against `anchor`.
///
/// Returns `None` for an empty table (screen always on). Otherwise both
/// expressions are non-empty: a missing begin list becomes Monday 00:00:00
/// and a missing end list becomes Sunday 23:59:59.
pub fn encode(schedule: &[WeekdaySchedule], anchor: NaiveDate) -> Option<StandbySchedule> {
    if schedule.is_empty() {
        return None;
    }

    let mut markers = schedule
        .iter()
        .fold(Markers::default(), |markers, day| fold_weekday(markers, day, anchor));

    if markers.begin.is_empty() {
        markers.begin.extend(NaiveTime::from_hms_opt(0, 0, 0).map(|time| WallclockMarker {
            anchor,
            weekday: MONDAY,
            time,
        }));
    }
    if markers.end.is_empty() {
        markers.end.extend(NaiveTime::from_hms_opt(23, 59, 59).map(|time| WallclockMarker {
            anchor,
            weekday: SUNDAY,
            time,
        }));
    }

    Some(StandbySchedule {
        begin: join(&markers.begin),
        end: join(&markers.end),
    })
}

/// Standby expressions for a player, gated on its model family.
///
/// Models without standby support and players without screen times get
/// `None` and the anchor date is never computed for them.
pub fn standby_for(
    config: &PlayerConfiguration,
    now: NaiveDate,
) -> Result<Option<StandbySchedule>, DescriptorError> {
    if !config.model.supports_standby() || config.screen_times.is_empty() {
        return Ok(None);
    }
    let anchor = anchor_date(now)?;
    Ok(encode(&config.screen_times, anchor))
}
