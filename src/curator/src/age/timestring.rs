//! strftime-style date tokens embedded in index names.

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::{CuratorError, Result};

/// Translate a strftime pattern into a regular expression that finds a date
/// token of that shape.
///
/// `%Y` becomes four digits, `%j` three, and `%y %m %d %H %M %S %W %U %V`
/// two. Every other character is matched literally.
pub fn date_regex(timestring: &str) -> String {
    let mut pattern = String::with_capacity(timestring.len() * 2);
    let mut chars = timestring.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
            continue;
        }
        match chars.next() {
            Some('Y') => pattern.push_str(r"\d{4}"),
            Some('j') => pattern.push_str(r"\d{3}"),
            Some('y' | 'm' | 'd' | 'H' | 'M' | 'S' | 'W' | 'U' | 'V') => {
                pattern.push_str(r"\d{2}")
            }
            Some(other) => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            None => pattern.push('%'),
        }
    }
    pattern
}

/// A compiled timestring able to pull an epoch out of an index name.
#[derive(Debug, Clone)]
pub struct Timestring {
    timestring: String,
    regex: Regex,
}

impl Timestring {
    pub fn new(timestring: &str) -> Result<Self> {
        let regex = Regex::new(&date_regex(timestring)).map_err(|e| {
            CuratorError::invalid(format!("timestring '{timestring}' is not usable: {e}"))
        })?;
        Ok(Self {
            timestring: timestring.to_string(),
            regex,
        })
    }

    /// Epoch seconds of the first date token in `name`, if any.
    pub fn epoch_of(&self, name: &str) -> Option<i64> {
        let stamp = self.regex.find(name)?.as_str();
        parse_stamp(stamp, &self.timestring)
    }
}

/// Parse `stamp` with `timestring`, filling the components it leaves out.
///
/// Missing month and day default to 1, missing time parts to 0 and
/// week-based patterns resolve to the Monday of that week.
pub fn parse_stamp(stamp: &str, timestring: &str) -> Option<i64> {
    let mut format = timestring.to_string();
    let mut stamp = stamp.to_string();
    let mut fill = |directive: &str, value: &str| {
        format.push(' ');
        format.push_str(directive);
        stamp.push(' ');
        stamp.push_str(value);
    };

    let has = |directive: &str| timestring.contains(directive);
    let iso_week = has("%V");
    let weekly = has("%W") || has("%U") || iso_week;

    if !has("%Y") && !has("%y") {
        fill(if iso_week { "%G" } else { "%Y" }, "1900");
    }
    if weekly {
        fill(if iso_week { "%u" } else { "%w" }, "1");
    } else if !has("%j") {
        if !has("%m") {
            fill("%m", "01");
        }
        if !has("%d") {
            fill("%d", "01");
        }
    }
    if !has("%H") {
        fill("%H", "00");
    }
    if !has("%M") {
        fill("%M", "00");
    }
    if !has("%S") {
        fill("%S", "00");
    }

    if iso_week {
        format = format.replace("%Y", "%G").replace("%y", "%g");
    }

    NaiveDateTime::parse_from_str(&stamp, &format)
        .ok()
        .map(|datetime| datetime.and_utc().timestamp())
}
