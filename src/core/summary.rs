use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

/// Statistics from the engine's closing `Lsize=` line.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSummary {
    pub final_size_bytes: u64,
    pub duration: Duration,
    pub avg_bitrate_kbps: f32,
}

static RE_LSIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Lsize=\s*([0-9]*\.?[0-9]+)\s*([A-Za-z]+)").unwrap());
static RE_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"time=\s*([0-9:\.]+)").unwrap());
static RE_BITRATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"bitrate=\s*([0-9]*\.?[0-9]+)\s*([A-Za-z/]+)").unwrap());

pub fn parse_summary_line(line: &str) -> Option<EncodeSummary> {
    if !line.contains("Lsize=") {
        return None;
    }

    let size = RE_LSIZE.captures(line).and_then(|cap| {
        let value = cap.get(1)?.as_str().parse::<f32>().ok()?;
        let unit = cap.get(2)?.as_str();
        parse_size_to_bytes(value, unit)
    });
    let duration = RE_TIME
        .captures(line)
        .and_then(|cap| cap.get(1))
        .and_then(|m| parse_ffmpeg_time(m.as_str()));
    let bitrate = RE_BITRATE.captures(line).and_then(|cap| {
        let value = cap.get(1)?.as_str().parse::<f32>().ok()?;
        let unit = cap.get(2)?.as_str();
        parse_bitrate_to_kbps(value, unit)
    });

    if size.is_none() && duration.is_none() && bitrate.is_none() {
        return None;
    }

    Some(EncodeSummary {
        final_size_bytes: size.unwrap_or(0),
        duration: duration.unwrap_or(Duration::from_secs(0)),
        avg_bitrate_kbps: bitrate.unwrap_or(0.0),
    })
}

/// Parses `HH:MM:SS(.frac)` as printed by ffmpeg.
pub fn parse_ffmpeg_time(value: &str) -> Option<Duration> {
    let mut parts = value.trim().split(':');
    let hours = parts.next()?.parse::<u64>().ok()?;
    let minutes = parts.next()?.parse::<u64>().ok()?;
    let seconds = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let whole = hours.checked_mul(3600)?.checked_add(minutes.checked_mul(60)?)?;
    let fraction = Duration::try_from_secs_f64(seconds).ok()?;
    Duration::from_secs(whole).checked_add(fraction)
}

fn parse_size_to_bytes(value: f32, unit: &str) -> Option<u64> {
    let multiplier = match unit.to_ascii_lowercase().as_str() {
        "b" => 1.0,
        "kb" | "kib" => 1024.0,
        "mb" | "mib" => 1024.0 * 1024.0,
        "gb" | "gib" => 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some((value as f64 * multiplier).round() as u64)
}

fn parse_bitrate_to_kbps(value: f32, unit: &str) -> Option<f32> {
    match unit.to_ascii_lowercase().as_str() {
        "kbits/s" | "kb/s" => Some(value),
        "mbits/s" | "mb/s" => Some(value * 1000.0),
        "bits/s" | "b/s" => Some(value / 1000.0),
        _ => None,
    }
}
