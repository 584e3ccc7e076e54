//! Elastic Beanstalk list operations
use anyhow::{bail, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_elasticbeanstalk::{
  config::{self, retry::RetryConfig},
  primitives::{DateTime, DateTimeFormat},
  types::{ApplicationVersionDescription, EnvironmentDescription, EventDescription, EventSeverity},
  Client,
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pagination::{Page, PageFetcher, PageRequest};

/// Largest `MaxRecords` value accepted by the Elastic Beanstalk describe operations
pub const PAGE_SIZE_CEILING: usize = 1000;

/// Construct and return the Elastic Beanstalk client
pub fn get_client(config: &SdkConfig, max_attempts: u32) -> Client {
  Client::from_conf(
    // Start with the shared environment configuration
    config::Builder::from(config)
      .retry_config(RetryConfig::standard().with_max_attempts(max_attempts))
      .build(),
  )
}

/// Parse an ISO-8601 timestamp such as `2023-11-09T08:00:00Z`
pub fn parse_date_time(value: &str) -> Result<DateTime> {
  Ok(DateTime::from_str(value, DateTimeFormat::DateTime)?)
}

fn format_date_time(value: DateTime) -> Option<String> {
  value.fmt(DateTimeFormat::DateTime).ok()
}

/// Filters for `DescribeApplicationVersions`
#[derive(Args, Clone, Debug, Default)]
pub struct ApplicationVersionsFilter {
  /// Restrict results to versions of this application
  #[arg(long)]
  pub application_name: Option<String>,

  /// Restrict results to these version labels
  #[arg(long, value_delimiter = ',')]
  pub version_labels: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationVersion {
  pub application_name: Option<String>,
  pub version_label: Option<String>,
  pub description: Option<String>,
  pub status: Option<String>,
  pub date_created: Option<String>,
}

impl From<ApplicationVersionDescription> for ApplicationVersion {
  fn from(version: ApplicationVersionDescription) -> Self {
    Self {
      application_name: version.application_name,
      version_label: version.version_label,
      description: version.description,
      status: version.status.map(|s| s.as_str().to_owned()),
      date_created: version.date_created.and_then(format_date_time),
    }
  }
}

pub struct ApplicationVersionsFetcher {
  client: Client,
  filter: ApplicationVersionsFilter,
}

impl ApplicationVersionsFetcher {
  pub fn new(client: Client, filter: ApplicationVersionsFilter) -> Self {
    Self { client, filter }
  }
}

#[async_trait]
impl PageFetcher for ApplicationVersionsFetcher {
  type Item = ApplicationVersion;

  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<ApplicationVersion>> {
    let output = self
      .client
      .describe_application_versions()
      .set_application_name(self.filter.application_name.clone())
      .set_version_labels(self.filter.version_labels.clone())
      .max_records(i32::try_from(request.page_size)?)
      .set_next_token(request.next_token.clone())
      .send()
      .await?;

    let items = output
      .application_versions
      .unwrap_or_default()
      .into_iter()
      .map(ApplicationVersion::from)
      .collect::<Vec<_>>();
    debug!("Described {} application versions", items.len());

    Ok(Page::new(items, output.next_token))
  }
}

/// Filters for `DescribeEnvironments`
#[derive(Args, Clone, Debug, Default)]
pub struct EnvironmentsFilter {
  /// Restrict results to environments of this application
  #[arg(long)]
  pub application_name: Option<String>,

  /// Restrict results to environments running this version label
  #[arg(long)]
  pub version_label: Option<String>,

  /// Restrict results to these environment IDs
  #[arg(long, value_delimiter = ',')]
  pub environment_ids: Option<Vec<String>>,

  /// Restrict results to these environment names
  #[arg(long, value_delimiter = ',')]
  pub environment_names: Option<Vec<String>>,

  /// Include environments that have been terminated
  #[arg(long)]
  pub include_deleted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
  pub environment_name: Option<String>,
  pub environment_id: Option<String>,
  pub application_name: Option<String>,
  pub version_label: Option<String>,
  pub status: Option<String>,
  pub health: Option<String>,
  #[serde(rename = "CNAME")]
  pub cname: Option<String>,
  pub date_updated: Option<String>,
}

impl From<EnvironmentDescription> for Environment {
  fn from(env: EnvironmentDescription) -> Self {
    Self {
      environment_name: env.environment_name,
      environment_id: env.environment_id,
      application_name: env.application_name,
      version_label: env.version_label,
      status: env.status.map(|s| s.as_str().to_owned()),
      health: env.health.map(|h| h.as_str().to_owned()),
      cname: env.cname,
      date_updated: env.date_updated.and_then(format_date_time),
    }
  }
}

pub struct EnvironmentsFetcher {
  client: Client,
  filter: EnvironmentsFilter,
}

impl EnvironmentsFetcher {
  pub fn new(client: Client, filter: EnvironmentsFilter) -> Self {
    Self { client, filter }
  }
}

#[async_trait]
impl PageFetcher for EnvironmentsFetcher {
  type Item = Environment;

  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Environment>> {
    let output = self
      .client
      .describe_environments()
      .set_application_name(self.filter.application_name.clone())
      .set_version_label(self.filter.version_label.clone())
      .set_environment_ids(self.filter.environment_ids.clone())
      .set_environment_names(self.filter.environment_names.clone())
      .include_deleted(self.filter.include_deleted)
      .max_records(i32::try_from(request.page_size)?)
      .set_next_token(request.next_token.clone())
      .send()
      .await?;

    let items = output
      .environments
      .unwrap_or_default()
      .into_iter()
      .map(Environment::from)
      .collect::<Vec<_>>();
    debug!("Described {} environments", items.len());

    Ok(Page::new(items, output.next_token))
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Severity {
  Trace,
  Debug,
  Info,
  Warn,
  Error,
  Fatal,
}

impl From<Severity> for EventSeverity {
  fn from(severity: Severity) -> Self {
    match severity {
      Severity::Trace => EventSeverity::Trace,
      Severity::Debug => EventSeverity::Debug,
      Severity::Info => EventSeverity::Info,
      Severity::Warn => EventSeverity::Warn,
      Severity::Error => EventSeverity::Error,
      Severity::Fatal => EventSeverity::Fatal,
    }
  }
}

/// Filters for `DescribeEvents`
#[derive(Args, Clone, Debug, Default)]
pub struct EventsFilter {
  /// Restrict results to events of this application
  #[arg(long)]
  pub application_name: Option<String>,

  /// Restrict results to events associated with this version label
  #[arg(long)]
  pub version_label: Option<String>,

  /// Restrict results to events associated with this configuration template
  #[arg(long)]
  pub template_name: Option<String>,

  /// Restrict results to events of this environment ID
  #[arg(long)]
  pub environment_id: Option<String>,

  /// Restrict results to events of this environment name
  #[arg(long)]
  pub environment_name: Option<String>,

  /// Restrict results to events of this platform version
  #[arg(long)]
  pub platform_arn: Option<String>,

  /// Restrict results to events raised by this request
  #[arg(long)]
  pub request_id: Option<String>,

  /// Restrict results to events of this severity or higher
  #[arg(long, value_enum)]
  pub severity: Option<Severity>,

  /// Only include events at or after this time (ISO-8601)
  #[arg(long, value_parser = parse_date_time)]
  pub start_time: Option<DateTime>,

  /// Only include events before this time (ISO-8601)
  #[arg(long, value_parser = parse_date_time)]
  pub end_time: Option<DateTime>,
}

impl EventsFilter {
  pub fn validate(&self) -> Result<()> {
    if let (Some(start), Some(end)) = (&self.start_time, &self.end_time) {
      if start > end {
        bail!("--start-time must not be after --end-time");
      }
    }

    Ok(())
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
  pub event_date: Option<String>,
  pub severity: Option<String>,
  pub message: Option<String>,
  pub application_name: Option<String>,
  pub environment_name: Option<String>,
  pub request_id: Option<String>,
}

impl From<EventDescription> for Event {
  fn from(event: EventDescription) -> Self {
    Self {
      event_date: event.event_date.and_then(format_date_time),
      severity: event.severity.map(|s| s.as_str().to_owned()),
      message: event.message,
      application_name: event.application_name,
      environment_name: event.environment_name,
      request_id: event.request_id,
    }
  }
}

pub struct EventsFetcher {
  client: Client,
  filter: EventsFilter,
}

impl EventsFetcher {
  pub fn new(client: Client, filter: EventsFilter) -> Result<Self> {
    filter.validate()?;

    Ok(Self { client, filter })
  }
}

#[async_trait]
impl PageFetcher for EventsFetcher {
  type Item = Event;

  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Event>> {
    let output = self
      .client
      .describe_events()
      .set_application_name(self.filter.application_name.clone())
      .set_version_label(self.filter.version_label.clone())
      .set_template_name(self.filter.template_name.clone())
      .set_environment_id(self.filter.environment_id.clone())
      .set_environment_name(self.filter.environment_name.clone())
      .set_platform_arn(self.filter.platform_arn.clone())
      .set_request_id(self.filter.request_id.clone())
      .set_severity(self.filter.severity.map(EventSeverity::from))
      .set_start_time(self.filter.start_time)
      .set_end_time(self.filter.end_time)
      .max_records(i32::try_from(request.page_size)?)
      .set_next_token(request.next_token.clone())
      .send()
      .await?;

    let items = output
      .events
      .unwrap_or_default()
      .into_iter()
      .map(Event::from)
      .collect::<Vec<_>>();
    debug!("Described {} events", items.len());

    Ok(Page::new(items, output.next_token))
  }
}

#[cfg(test)]
mod tests {
  use aws_sdk_elasticbeanstalk::types::{ApplicationVersionStatus, EnvironmentHealth, EnvironmentStatus};
  use rstest::*;

  use super::*;

  #[test]
  fn it_shapes_application_versions() {
    let description = ApplicationVersionDescription::builder()
      .application_name("web")
      .version_label("v42")
      .status(ApplicationVersionStatus::Processed)
      .date_created(DateTime::from_secs(0))
      .build();

    let version = ApplicationVersion::from(description);
    assert_eq!(
      version,
      ApplicationVersion {
        application_name: Some("web".to_string()),
        version_label: Some("v42".to_string()),
        description: None,
        status: Some("Processed".to_string()),
        date_created: Some("1970-01-01T00:00:00Z".to_string()),
      }
    );
  }

  #[test]
  fn it_shapes_environments() {
    let description = EnvironmentDescription::builder()
      .environment_name("web-prod")
      .environment_id("e-abc123")
      .status(EnvironmentStatus::Ready)
      .health(EnvironmentHealth::Green)
      .cname("web-prod.elasticbeanstalk.com")
      .build();

    let env = Environment::from(description);
    assert_eq!(env.environment_id.as_deref(), Some("e-abc123"));
    assert_eq!(env.status.as_deref(), Some("Ready"));
    assert_eq!(env.health.as_deref(), Some("Green"));

    let json = serde_json::to_value(&env).unwrap();
    assert_eq!(json["CNAME"], "web-prod.elasticbeanstalk.com");
    assert_eq!(json["EnvironmentName"], "web-prod");
  }

  #[test]
  fn it_shapes_events() {
    let description = EventDescription::builder()
      .message("Environment health has transitioned from Ok to Severe")
      .severity(EventSeverity::Warn)
      .environment_name("web-prod")
      .build();

    let event = Event::from(description);
    assert_eq!(event.severity.as_deref(), Some("WARN"));
    assert_eq!(event.event_date, None);
  }

  #[rstest]
  #[case(Severity::Trace, "TRACE")]
  #[case(Severity::Info, "INFO")]
  #[case(Severity::Fatal, "FATAL")]
  fn it_maps_severity(#[case] severity: Severity, #[case] expected: &str) {
    assert_eq!(EventSeverity::from(severity).as_str(), expected);
  }

  #[rstest]
  #[case(None, None, true)]
  #[case(Some("2023-01-01T00:00:00Z"), None, true)]
  #[case(Some("2023-01-01T00:00:00Z"), Some("2023-01-02T00:00:00Z"), true)]
  #[case(Some("2023-01-02T00:00:00Z"), Some("2023-01-01T00:00:00Z"), false)]
  fn it_validates_event_window(#[case] start: Option<&str>, #[case] end: Option<&str>, #[case] valid: bool) {
    let filter = EventsFilter {
      start_time: start.map(|s| parse_date_time(s).unwrap()),
      end_time: end.map(|s| parse_date_time(s).unwrap()),
      ..Default::default()
    };

    assert_eq!(filter.validate().is_ok(), valid);
  }

  #[test]
  fn it_rejects_malformed_dates() {
    assert!(parse_date_time("yesterday").is_err());
  }
}
