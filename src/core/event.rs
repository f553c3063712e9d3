use crate::core::outcome::ProgressEvent;
use crate::core::state::RunState;

#[derive(Debug, Clone, PartialEq)]
pub enum LogLevel {
    Progress,
    Input,
    Output,
    Summary,
    Warning,
    Error,
    Noise,
}

/// Everything a run reports to an observer, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    State(RunState),
    /// One line of merged engine stdout/stderr.
    Log(String),
    Progress(ProgressEvent),
}

pub fn classify_log_line(line: &str) -> LogLevel {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LogLevel::Noise;
    }

    if trimmed.starts_with("Input #") {
        return LogLevel::Input;
    }
    if trimmed.starts_with("Output #") {
        return LogLevel::Output;
    }
    if trimmed.contains("frame=") && trimmed.contains("time=") {
        return LogLevel::Progress;
    }
    if trimmed.contains("Lsize=") && trimmed.contains("bitrate=") {
        return LogLevel::Summary;
    }

    let lower = trimmed.to_ascii_lowercase();
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "libavutil",
        "libavcodec",
        "libavformat",
        "libavdevice",
        "libavfilter",
        "libswscale",
        "libswresample",
        "libpostproc",
    ];

    if noise_prefixes.iter().any(|prefix| lower.starts_with(prefix)) {
        return LogLevel::Noise;
    }

    if lower.contains("error")
        || lower.contains("invalid")
        || lower.contains("no such file")
        || lower.contains("unable to find")
        || lower.contains("permission denied")
    {
        return LogLevel::Error;
    }

    if lower.contains("warning") || lower.contains("deprecated") {
        return LogLevel::Warning;
    }

    LogLevel::Noise
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_engine_lines() {
        assert_eq!(
            classify_log_line("Input #0, matroska,webm, from 'in.mkv':"),
            LogLevel::Input
        );
        assert_eq!(
            classify_log_line("Output #0, mp4, to 'out.mp4':"),
            LogLevel::Output
        );
        assert_eq!(
            classify_log_line("frame=  240 fps=120 q=28.0 size=  512kB time=00:00:10.00 bitrate= 419.4kbits/s speed=5x"),
            LogLevel::Progress
        );
        assert_eq!(
            classify_log_line("video:1024kB audio:160kB Lsize=    1200kB time=00:01:00.00 bitrate= 163.8kbits/s"),
            LogLevel::Summary
        );
        assert_eq!(
            classify_log_line("missing.mkv: No such file or directory"),
            LogLevel::Error
        );
        assert_eq!(
            classify_log_line("[swscaler @ 0x55] deprecated pixel format used"),
            LogLevel::Warning
        );
    }

    #[test]
    fn banner_lines_are_noise() {
        assert_eq!(
            classify_log_line("ffmpeg version 6.1 Copyright (c) 2000-2023"),
            LogLevel::Noise
        );
        assert_eq!(classify_log_line("  libavcodec     60. 31.102"), LogLevel::Noise);
        assert_eq!(classify_log_line("   "), LogLevel::Noise);
    }
}
