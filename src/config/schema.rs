//! Configuration value parsing helpers

use std::time::Duration;

/// Parse a duration string like "1500ms", "15s", "2m" or "1m30s".
///
/// A bare number is read as milliseconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Empty duration".to_string());
    }

    let mut total_ms: u64 = 0;
    let mut current_num = String::new();
    let mut current_unit = String::new();

    let mut flush = |num: &mut String, unit: &mut String| -> Result<(), String> {
        if num.is_empty() {
            return Err(format!("Missing number before unit in duration: {}", s));
        }
        let n: u64 = num
            .parse()
            .map_err(|_| format!("Invalid number in duration: {}", s))?;
        let factor = match unit.as_str() {
            "" | "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            other => return Err(format!("Unknown duration unit: {}", other)),
        };
        total_ms = n
            .checked_mul(factor)
            .and_then(|ms| total_ms.checked_add(ms))
            .ok_or_else(|| format!("Duration too large: {}", s))?;
        num.clear();
        unit.clear();
        Ok(())
    };

    for c in s.chars() {
        if c.is_ascii_digit() {
            if !current_unit.is_empty() {
                flush(&mut current_num, &mut current_unit)?;
            }
            current_num.push(c);
        } else if c.is_ascii_alphabetic() {
            current_unit.push(c);
        } else {
            return Err(format!("Unexpected character '{}' in duration: {}", c, s));
        }
    }
    flush(&mut current_num, &mut current_unit)?;

    if total_ms == 0 {
        return Err(format!("Invalid duration: {}", s));
    }

    Ok(Duration::from_millis(total_ms))
}

/// Serde adapter for duration strings in `config.toml`.
pub mod duration_str {
    use super::parse_duration;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{}ms", d.as_millis()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
