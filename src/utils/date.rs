//! HTTP date handling without timezone dependencies.
//!
//! Provides a lightweight `DateTimeUtc` struct for `Last-Modified` and
//! `If-Modified-Since` headers, which use the IMF-fixdate format:
//!
//! ```text
//! Sun, 06 Nov 1994 08:49:37 GMT
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

const WEEKDAYS: [&str; 7] = ["Sat", "Sun", "Mon", "Tue", "Wed", "Thu", "Fri"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// UTC datetime without timezone complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTimeUtc {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Convert a timestamp; sub-second precision is dropped.
    #[allow(clippy::cast_possible_truncation)] // Ranges are bounded by the calendar math
    pub fn from_system_time(time: SystemTime) -> Self {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let days = secs / 86_400;
        let rem = secs % 86_400;
        let (year, month, day) = civil_from_days(days);
        Self::new(
            year,
            month,
            day,
            (rem / 3600) as u8,
            ((rem / 60) % 60) as u8,
            (rem % 60) as u8,
        )
    }

    pub fn to_system_time(self) -> SystemTime {
        let days = days_from_civil(self.year, self.month, self.day);
        let secs = days * 86_400
            + u64::from(self.hour) * 3600
            + u64::from(self.minute) * 60
            + u64::from(self.second);
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    /// Parse an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`).
    ///
    /// The obsolete RFC 850 and asctime forms are not accepted.
    pub fn parse_http(s: &str) -> Option<Self> {
        let (_weekday, rest) = s.trim().split_once(", ")?;
        let mut parts = rest.split(' ');

        let day: u8 = parts.next()?.parse().ok()?;
        let month_name = parts.next()?;
        let month = MONTHS.iter().position(|m| *m == month_name)?;
        let year: u16 = parts.next()?.parse().ok()?;
        let time = parts.next()?;
        if parts.next()? != "GMT" || parts.next().is_some() {
            return None;
        }

        let mut hms = time.split(':').map(|p| p.parse::<u8>().ok());
        let (hour, minute, second) = (hms.next()??, hms.next()??, hms.next()??);
        if hms.next().is_some() {
            return None;
        }

        let dt = Self::new(year, month as u8 + 1, day, hour, minute, second);
        dt.is_valid().then_some(dt)
    }

    fn is_valid(&self) -> bool {
        (1970..=9999).contains(&self.year)
            && (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.year, self.month)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }

    /// Format as IMF-fixdate for HTTP headers.
    pub fn to_http_date(self) -> String {
        format!(
            "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
            WEEKDAYS[self.weekday_index()],
            self.day,
            MONTHS[(self.month - 1) as usize],
            self.year,
            self.hour,
            self.minute,
            self.second
        )
    }

    // Zeller's congruence; 0 = Saturday
    #[allow(clippy::cast_sign_loss)] // Result of % 7 is always 0-6
    fn weekday_index(&self) -> usize {
        let (y, m) = if self.month < 3 {
            (i32::from(self.year) - 1, i32::from(self.month) + 12)
        } else {
            (i32::from(self.year), i32::from(self.month))
        };
        let d = i32::from(self.day);
        ((d + (13 * (m + 1)) / 5 + y + y / 4 - y / 100 + y / 400) % 7) as usize
    }
}

/// Format a timestamp for a `Last-Modified` header.
pub fn http_date(time: SystemTime) -> String {
    DateTimeUtc::from_system_time(time).to_http_date()
}

/// Parse an `If-Modified-Since` header value.
pub fn parse_http_date(s: &str) -> Option<SystemTime> {
    DateTimeUtc::parse_http(s).map(DateTimeUtc::to_system_time)
}

const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

const fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since 1970-01-01 -> (year, month, day).
#[allow(clippy::cast_possible_truncation)]
fn civil_from_days(mut days: u64) -> (u16, u8, u8) {
    let mut year: u16 = 1970;
    loop {
        let len = if is_leap_year(year) { 366 } else { 365 };
        if days < len {
            break;
        }
        days -= len;
        year += 1;
    }
    let mut month: u8 = 1;
    loop {
        let len = u64::from(days_in_month(year, month));
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }
    (year, month, days as u8 + 1)
}

fn days_from_civil(year: u16, month: u8, day: u8) -> u64 {
    let years: u64 = (1970..year)
        .map(|y| if is_leap_year(y) { 366 } else { 365 })
        .sum();
    let months: u64 = (1..month).map(|m| u64::from(days_in_month(year, m))).sum();
    years + months + u64::from(day) - 1
}
