#[macro_use]
extern crate lazy_static;

mod aws;
mod config;
mod error;
mod filter;
mod models;
mod sink;
mod tailer;
mod utilities;

use crate::models::SendableError;
use aws_sdk_cloudwatchlogs::Client;
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use config::{AppConfig, Command, TailArgs};
use log::{error, info, Level};
use models::TailSession;
use sink::LineSink;
use std::process::ExitCode;
use std::time::SystemTime;
use tailer::Tailer;

pub fn setup_logger(app_config: &AppConfig) -> Result<(), SendableError> {
    let mut dispatch = fern::Dispatch::new()
        .level(app_config.log_level)
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "[{} {} {}] {}",
                        humantime::format_rfc3339_seconds(SystemTime::now()),
                        colored_level(record.level()),
                        record.target(),
                        message
                    ))
                })
                .chain(std::io::stderr()),
        );

    if let Some(path) = &app_config.log_file {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "[{} {} {}] {}",
                        humantime::format_rfc3339_seconds(SystemTime::now()),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(fern::log_file(path)?),
        );
    }

    dispatch.apply()?;
    Ok(())
}

fn colored_level(level: Level) -> colored::ColoredString {
    let name = level.as_str();
    match level {
        Level::Error => name.red(),
        Level::Warn => name.yellow(),
        Level::Info => name.green(),
        Level::Debug => name.blue(),
        Level::Trace => name.dimmed(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let app_config = AppConfig::parse();
    if let Err(e) = setup_logger(&app_config) {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }
    info!("Starting application with args: {:?}", app_config);

    match run(&app_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(app_config: &AppConfig) -> Result<(), SendableError> {
    let config = aws::build_config(app_config).await?;
    let client = Client::new(&config);

    match &app_config.command {
        Command::Groups => {
            let log_groups = aws::get_log_groups(&client).await?;
            info!("Found {} total log group(s).", log_groups.len());
            for log_group in log_groups {
                if let Some(name) = log_group.log_group_name {
                    println!("{}", name);
                }
            }
        }
        Command::Streams { log_group } => {
            let streams = aws::get_log_streams(&client, log_group).await?;
            info!("Found {} stream(s) in {}.", streams.len(), log_group);
            for stream in streams {
                println!(
                    "{}\t{}",
                    utilities::format_millis(stream.last_event_timestamp),
                    stream.log_stream_name
                );
            }
        }
        Command::Tail(args) => tail(client, args).await?,
    }
    Ok(())
}

async fn tail(client: Client, args: &TailArgs) -> Result<(), SendableError> {
    let log_stream = match &args.stream {
        Some(stream) => stream.clone(),
        None => aws::latest_log_stream(&client, &args.log_group).await?,
    };
    let start_time = args.start_millis(Utc::now())?;

    let sink = match &args.output {
        Some(path) => LineSink::append_to_file(path)?,
        None => LineSink::stdout(),
    };
    let session = TailSession::new(args.log_group.clone(), log_stream, start_time, sink)
        .with_poll_interval(args.poll_interval());

    let mut handle = Tailer::new(aws::CloudWatchSource::new(client), session).spawn();

    tokio::select! {
        result = handle.join() => return Ok(result?),
        signal = wait_for_shutdown_signal() => signal?,
    }

    info!("Shutdown requested, stopping tail");
    handle.stop().await?;
    Ok(())
}

/// Completes on Ctrl-C, or SIGTERM on unix.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = sigterm.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
