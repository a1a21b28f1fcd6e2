use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use parse_duration::parse;

use crate::models::SendableError;

#[derive(Parser, Debug)]
#[command(
    name = "cwtail",
    version,
    about = "Follow AWS CloudWatch log streams as new events arrive."
)]
pub struct AppConfig {
    #[arg(long, global = true, default_value = "us-east-1")]
    pub region: Option<String>,

    #[arg(long, global = true, default_value = "default")]
    pub profile: Option<String>,

    /// Diagnostic log level (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: log::LevelFilter,

    /// Also write diagnostics to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List log groups.
    Groups,
    /// List the streams of a log group, most recently active first.
    Streams { log_group: String },
    /// Follow a log stream.
    Tail(TailArgs),
}

#[derive(Args, Debug)]
pub struct TailArgs {
    pub log_group: String,

    /// Stream to follow. Defaults to the group's most recently active stream.
    #[arg(long)]
    pub stream: Option<String>,

    /// How far back to start, e.g. "10m" or "2h".
    #[arg(long, default_value = "5m")]
    pub since: String,

    /// Absolute start time (RFC 3339). Overrides --since.
    #[arg(long)]
    pub start_time: Option<DateTime<Utc>>,

    /// Seconds to wait after catching up before polling again.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: u64,

    /// Append lines to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl TailArgs {
    /// Start of the session in epoch milliseconds.
    pub fn start_millis(&self, now: DateTime<Utc>) -> Result<i64, SendableError> {
        if let Some(start_time) = self.start_time {
            return Ok(start_time.timestamp_millis());
        }
        // Parse duration string (e.g., "3h", "2days")
        let duration = parse(&self.since)
            .map_err(|e| format!("failed to parse duration '{}': {}", self.since, e))?;
        let start_time = now
            .checked_sub_signed(chrono::Duration::from_std(duration)?)
            .ok_or_else(|| format!("duration '{}' reaches too far back", self.since))?;
        Ok(start_time.timestamp_millis())
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tail_args(args: &[&str]) -> TailArgs {
        let argv = ["cwtail", "tail"].iter().chain(args.iter()).copied();
        match AppConfig::parse_from(argv).command {
            Command::Tail(tail) => tail,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn tail_defaults() {
        let args = tail_args(&["/app/web"]);
        assert_eq!(args.log_group, "/app/web");
        assert_eq!(args.stream, None);
        assert_eq!(args.poll_interval(), std::time::Duration::from_secs(5));
        assert!(args.output.is_none());
    }

    #[test]
    fn since_is_subtracted_from_now() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let args = tail_args(&["g", "--since", "10m"]);
        let expected = now - chrono::Duration::minutes(10);
        assert_eq!(args.start_millis(now).unwrap(), expected.timestamp_millis());
    }

    #[test]
    fn absolute_start_time_wins() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let args = tail_args(&["g", "--since", "1h", "--start-time", "2024-03-01T11:59:00Z"]);
        assert_eq!(
            args.start_millis(now).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 11, 59, 0).unwrap().timestamp_millis()
        );
    }

    #[test]
    fn bad_duration_is_an_error() {
        let args = tail_args(&["g", "--since", "soon"]);
        assert!(args.start_millis(Utc::now()).is_err());
    }

    #[test]
    fn since_beyond_representable_range_is_an_error() {
        let args = tail_args(&["g", "--since", "300000years"]);
        assert!(args.start_millis(Utc::now()).is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let result = AppConfig::try_parse_from(["cwtail", "tail", "g", "--poll-interval", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let config = AppConfig::parse_from(["cwtail", "streams", "g", "--region", "eu-west-1"]);
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert!(matches!(config.command, Command::Streams { .. }));
    }
}
