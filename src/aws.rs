use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_cloudwatchlogs::{
    types::{LogGroup, OrderBy, OutputLogEvent},
    Client,
};
use log::{debug, info};

use crate::config::AppConfig;
use crate::error::{Result, TailError};
use crate::models::{FetchPosition, FetchRequest, LogEvent, LogPage, SendableError, StreamSummary};
use crate::tailer::LogSource;

/// Upper bound on events per `GetLogEvents` page.
pub const PAGE_SIZE: i32 = 100;

lazy_static! {
    static ref AWS_REGIONS: Vec<&'static str> = vec![
        "us-east-1", "us-east-2", "us-west-1", "us-west-2",
        "af-south-1", "ap-east-1", "ap-south-1", "ap-south-2",
        "ap-southeast-1", "ap-southeast-2", "ap-southeast-3",
        "ap-northeast-1", "ap-northeast-2", "ap-northeast-3",
        "ca-central-1", "eu-central-1", "eu-central-2",
        "eu-west-1", "eu-west-2", "eu-west-3", "eu-south-1",
        "eu-south-2", "eu-north-1", "me-central-1", "me-south-1",
        "sa-east-1",
    ];
}

fn find_region(input: &str) -> Option<&'static str> {
    AWS_REGIONS.iter().find(|&&region| region == input).copied()
}

pub async fn build_config(app_config: &AppConfig) -> std::result::Result<SdkConfig, SendableError> {
    let mut loader = aws_config::from_env();

    if let Some(profile_name) = app_config.profile.clone() {
        loader = loader.profile_name(profile_name);
    }

    if let Some(region_str) = &app_config.region {
        let selected_region = find_region(region_str)
            .ok_or_else(|| format!("unknown AWS region '{}'", region_str))?;
        loader = loader.region(Region::new(selected_region));
    }

    let shared_config = loader.load().await;
    Ok(shared_config)
}

pub async fn get_log_groups(client: &Client) -> std::result::Result<Vec<LogGroup>, SendableError> {
    let mut result = Vec::new();
    let mut next_token = None;

    loop {
        let resp = client
            .describe_log_groups()
            .set_next_token(next_token.clone())
            .send()
            .await?;

        if let Some(log_groups) = resp.log_groups {
            result.extend(log_groups);
        }

        next_token = resp.next_token;
        if next_token.is_none() {
            break;
        }
    }
    Ok(result)
}

/// Streams of a group, most recently written first.
pub async fn get_log_streams(
    client: &Client,
    log_group_name: &str,
) -> std::result::Result<Vec<StreamSummary>, SendableError> {
    let mut result = Vec::new();
    let mut next_token = None;

    loop {
        let resp = client
            .describe_log_streams()
            .log_group_name(log_group_name)
            .order_by(OrderBy::LastEventTime)
            .descending(true)
            .set_next_token(next_token.clone())
            .send()
            .await?;

        if let Some(streams) = resp.log_streams {
            result.extend(streams.into_iter().filter_map(|stream| {
                Some(StreamSummary {
                    log_stream_name: stream.log_stream_name?,
                    last_event_timestamp: stream.last_event_timestamp,
                })
            }));
        }

        next_token = resp.next_token;
        if next_token.is_none() {
            break;
        }
    }
    Ok(result)
}

pub async fn latest_log_stream(
    client: &Client,
    log_group_name: &str,
) -> std::result::Result<String, SendableError> {
    let resp = client
        .describe_log_streams()
        .log_group_name(log_group_name)
        .order_by(OrderBy::LastEventTime)
        .descending(true)
        .limit(1)
        .send()
        .await?;

    let stream = resp
        .log_streams
        .unwrap_or_default()
        .into_iter()
        .find_map(|stream| stream.log_stream_name)
        .ok_or_else(|| format!("log group '{}' has no streams", log_group_name))?;
    info!("Using most recently active stream: {}", stream);
    Ok(stream)
}

/// `GetLogEvents`-backed source reading forward from the head of a stream.
pub struct CloudWatchSource {
    client: Client,
}

impl CloudWatchSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogSource for CloudWatchSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<LogPage> {
        let mut call = self
            .client
            .get_log_events()
            .log_group_name(&request.log_group)
            .log_stream_name(&request.log_stream)
            .start_from_head(true)
            .limit(PAGE_SIZE);

        call = match &request.position {
            FetchPosition::Token(token) => call.next_token(token),
            FetchPosition::StartTime(start_time) => call.start_time(*start_time),
        };

        let resp = call.send().await.map_err(TailError::transport)?;
        let events: Vec<LogEvent> = resp
            .events
            .unwrap_or_default()
            .into_iter()
            .map(into_log_event)
            .collect();
        debug!(
            "Retrieved {} event(s) for {}/{}",
            events.len(),
            request.log_group,
            request.log_stream
        );

        Ok(LogPage {
            events,
            next_token: resp.next_forward_token,
        })
    }
}

fn into_log_event(event: OutputLogEvent) -> LogEvent {
    LogEvent::new(event.timestamp.unwrap_or(0), event.message.unwrap_or_default())
}
