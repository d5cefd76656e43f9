//! Per-product sale countdown.
//!
//! The state machine here is pure; the caller owns the one-second clock and
//! issues the "expire offer" call when [`Countdown::tick`] reports
//! [`Tick::Expired`]. That variant is returned at most once per countdown.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::products::Product;
use crate::CoreError;

static COUNTDOWN_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}:\d{2}$").expect("valid countdown regex"));

/// Checks the admin-facing `HH:MM:SS` format.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDuration`] when `raw` does not match.
pub fn validate_countdown_time(raw: &str) -> Result<(), CoreError> {
    if COUNTDOWN_TIME_RE.is_match(raw) {
        Ok(())
    } else {
        Err(CoreError::InvalidDuration(raw.to_string()))
    }
}

/// Parses a countdown duration into seconds.
///
/// Accepts `H:MM:SS` / `HH:MM:SS`, `HH:MM` (hours and minutes), or a bare
/// number of seconds.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDuration`] for any other shape, non-digit
/// components, or overflow.
pub fn parse_duration(raw: &str) -> Result<u64, CoreError> {
    let invalid = || CoreError::InvalidDuration(raw.to_string());

    let parts = raw
        .trim()
        .split(':')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        })
        .collect::<Result<Vec<u64>, CoreError>>()?;

    let seconds = match parts.as_slice() {
        [s] => Some(*s),
        [h, m] => to_seconds(*h, *m, 0),
        [h, m, s] => to_seconds(*h, *m, *s),
        _ => None,
    };

    seconds.ok_or_else(invalid)
}

fn to_seconds(hours: u64, minutes: u64, seconds: u64) -> Option<u64> {
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

/// Renders seconds as `HH:MM:SS`; zero or negative renders as `00:00:00`.
#[must_use]
pub fn format_hms(seconds: i64) -> String {
    let total = seconds.max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Idle,
    Running { remaining: u64 },
    Expired,
}

/// Result of advancing a countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still running with this many seconds left.
    Running(u64),
    /// Reached zero on this tick. The caller fires the expiry call now.
    Expired,
    /// Idle or already expired; nothing to do.
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    product_id: i64,
    state: CountdownState,
}

impl Countdown {
    /// Starts a countdown for `product` as seen at `now`.
    ///
    /// Products without an enabled, parseable, positive countdown stay
    /// [`CountdownState::Idle`].
    #[must_use]
    pub fn start(product: &Product, now: DateTime<Utc>) -> Self {
        Self::from_parts(
            product.id,
            product.countdown_enabled,
            product.countdown_time.as_deref(),
            product.sale_end_date,
            now,
        )
    }

    #[must_use]
    pub fn from_parts(
        product_id: i64,
        enabled: bool,
        duration: Option<&str>,
        sale_end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let idle = Self {
            product_id,
            state: CountdownState::Idle,
        };
        if !enabled {
            return idle;
        }
        let Some(Ok(duration)) = duration.map(parse_duration) else {
            return idle;
        };

        let remaining = match sale_end {
            Some(end) => duration.min(seconds_until(end, now)),
            None => duration,
        };
        if remaining == 0 {
            return idle;
        }

        Self {
            product_id,
            state: CountdownState::Running { remaining },
        }
    }

    #[must_use]
    pub fn product_id(&self) -> i64 {
        self.product_id
    }

    #[must_use]
    pub fn state(&self) -> CountdownState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, CountdownState::Running { .. })
    }

    /// Seconds left; zero unless running.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        match self.state {
            CountdownState::Running { remaining } => remaining,
            CountdownState::Idle | CountdownState::Expired => 0,
        }
    }

    /// Advances by one second.
    pub fn tick(&mut self) -> Tick {
        match self.state {
            CountdownState::Running { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.state = CountdownState::Expired;
                    Tick::Expired
                } else {
                    self.state = CountdownState::Running { remaining };
                    Tick::Running(remaining)
                }
            }
            CountdownState::Idle | CountdownState::Expired => Tick::Inactive,
        }
    }
}

/// Whole seconds from `now` until `end`, rounded up, floored at zero.
fn seconds_until(end: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (end - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    u64::try_from(millis.div_euclid(1000) + i64::from(millis.rem_euclid(1000) > 0)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn parses_all_duration_shapes() {
        assert_eq!(parse_duration("00:00:05").unwrap(), 5);
        assert_eq!(parse_duration("1:30:00").unwrap(), 5400);
        assert_eq!(parse_duration("02:15").unwrap(), 2 * 3600 + 15 * 60);
        assert_eq!(parse_duration("90").unwrap(), 90);
        assert_eq!(parse_duration(" 00:01:00 ").unwrap(), 60);
    }

    #[test]
    fn rejects_malformed_durations() {
        for raw in ["", "abc", "1:2:3:4", "::", "-5", "01:-1:00", "1.5"] {
            assert!(
                matches!(parse_duration(raw), Err(CoreError::InvalidDuration(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn countdown_time_format_check() {
        assert!(validate_countdown_time("5:00:00").is_ok());
        assert!(validate_countdown_time("12:30:45").is_ok());
        assert!(validate_countdown_time("123:00:00").is_err());
        assert!(validate_countdown_time("12:30").is_err());
        assert!(validate_countdown_time("1:3:45").is_err());
    }

    #[test]
    fn format_hms_pads_and_floors_at_zero() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(-12), "00:00:00");
        assert_eq!(format_hms(5), "00:00:05");
        assert_eq!(format_hms(3661), "01:01:01");
        assert_eq!(format_hms(100 * 3600), "100:00:00");
    }

    #[test]
    fn disabled_or_unparseable_stays_idle() {
        let c = Countdown::from_parts(1, false, Some("00:00:05"), None, now());
        assert_eq!(c.state(), CountdownState::Idle);

        let c = Countdown::from_parts(1, true, None, None, now());
        assert_eq!(c.state(), CountdownState::Idle);

        let c = Countdown::from_parts(1, true, Some("soon"), None, now());
        assert_eq!(c.state(), CountdownState::Idle);

        let c = Countdown::from_parts(1, true, Some("00:00:00"), None, now());
        assert_eq!(c.state(), CountdownState::Idle);
    }

    #[test]
    fn five_second_countdown_expires_once_after_five_ticks() {
        let mut c = Countdown::from_parts(42, true, Some("00:00:05"), None, now());
        assert_eq!(c.remaining(), 5);

        let ticks: Vec<Tick> = (0..8).map(|_| c.tick()).collect();
        assert_eq!(
            ticks,
            vec![
                Tick::Running(4),
                Tick::Running(3),
                Tick::Running(2),
                Tick::Running(1),
                Tick::Expired,
                Tick::Inactive,
                Tick::Inactive,
                Tick::Inactive,
            ]
        );
        assert_eq!(c.state(), CountdownState::Expired);
        assert_eq!(c.product_id(), 42);
    }

    #[test]
    fn sale_end_caps_remaining() {
        let end = now() + Duration::seconds(30);
        let c = Countdown::from_parts(1, true, Some("01:00:00"), Some(end), now());
        assert_eq!(c.remaining(), 30);
    }

    #[test]
    fn sale_end_rounds_partial_second_up() {
        let end = now() + Duration::milliseconds(2_100);
        let c = Countdown::from_parts(1, true, Some("01:00:00"), Some(end), now());
        assert_eq!(c.remaining(), 3);
    }

    #[test]
    fn duration_shorter_than_sale_end_wins() {
        let end = now() + Duration::hours(5);
        let c = Countdown::from_parts(1, true, Some("00:00:10"), Some(end), now());
        assert_eq!(c.remaining(), 10);
    }

    #[test]
    fn lapsed_sale_end_never_runs() {
        let end = now() - Duration::seconds(1);
        let mut c = Countdown::from_parts(1, true, Some("00:10:00"), Some(end), now());
        assert_eq!(c.state(), CountdownState::Idle);
        assert_eq!(c.tick(), Tick::Inactive);
    }
}
