// src/diff/interval.rs

use std::time::Duration;

use crate::errors::{ListenError, Result};

/// Parse a cycle interval.
///
/// Bare numbers are seconds and may be fractional (`5`, `0.5`). Suffixed
/// integers use `ms`, `s`, `m` or `h` (`500ms`, `2m`). Zero is rejected.
pub fn parse_interval(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ListenError::MissingArgument("interval".into()));
    }

    let dur = match s.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Duration::try_from_secs_f64(secs)
            .map_err(|e| invalid(s, &e.to_string()))?,
        Ok(_) => return Err(invalid(s, "must be a positive number of seconds")),
        Err(_) => parse_suffixed(s)?,
    };

    if dur.is_zero() {
        return Err(invalid(s, "must be greater than zero"));
    }
    Ok(dur)
}

fn parse_suffixed(s: &str) -> Result<Duration> {
    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| invalid(s, "missing unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| invalid(s, &format!("invalid number '{num_part}': {e}")))?;

    let secs_per_unit = match unit_part.trim().to_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        unit => {
            return Err(invalid(
                s,
                &format!("unsupported unit '{unit}'; expected ms, s, m, or h"),
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| invalid(s, "too large"))
}

fn invalid(s: &str, why: &str) -> ListenError {
    ListenError::MissingArgument(format!("valid interval (got '{s}': {why})"))
}
