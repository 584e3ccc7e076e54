use anyhow::Result;
use clap::{Args, Subcommand};

use crate::{
  beanstalk::{
    self, ApplicationVersionsFetcher, ApplicationVersionsFilter, EnvironmentsFetcher, EnvironmentsFilter,
    EventsFetcher, EventsFilter, PAGE_SIZE_CEILING,
  },
  cli::AwsInput,
  commands::{list, PagingInput},
};

#[derive(Args, Debug)]
pub struct Beanstalk {
  #[command(subcommand)]
  pub command: BeanstalkCommands,
}

#[derive(Debug, Subcommand)]
pub enum BeanstalkCommands {
  /// List application versions (DescribeApplicationVersions)
  ApplicationVersions(ListApplicationVersionsInput),

  /// List environments (DescribeEnvironments)
  Environments(ListEnvironmentsInput),

  /// List events (DescribeEvents)
  Events(ListEventsInput),
}

#[derive(Args, Debug)]
pub struct ListApplicationVersionsInput {
  #[command(flatten)]
  pub filter: ApplicationVersionsFilter,

  #[command(flatten)]
  pub paging: PagingInput,
}

#[derive(Args, Debug)]
pub struct ListEnvironmentsInput {
  #[command(flatten)]
  pub filter: EnvironmentsFilter,

  #[command(flatten)]
  pub paging: PagingInput,
}

#[derive(Args, Debug)]
pub struct ListEventsInput {
  #[command(flatten)]
  pub filter: EventsFilter,

  #[command(flatten)]
  pub paging: PagingInput,
}

impl Beanstalk {
  pub async fn run(&self, aws: &AwsInput) -> Result<()> {
    // Reject invalid filter combinations before resolving credentials
    if let BeanstalkCommands::Events(input) = &self.command {
      input.filter.validate()?;
    }

    let config = aws.sdk_config().await?;
    let client = beanstalk::get_client(&config, aws.max_attempts);

    match &self.command {
      BeanstalkCommands::ApplicationVersions(input) => {
        let fetcher = ApplicationVersionsFetcher::new(client, input.filter.clone());
        list(fetcher, &input.paging, PAGE_SIZE_CEILING).await
      }
      BeanstalkCommands::Environments(input) => {
        let fetcher = EnvironmentsFetcher::new(client, input.filter.clone());
        list(fetcher, &input.paging, PAGE_SIZE_CEILING).await
      }
      BeanstalkCommands::Events(input) => {
        let fetcher = EventsFetcher::new(client, input.filter.clone())?;
        list(fetcher, &input.paging, PAGE_SIZE_CEILING).await
      }
    }
  }
}
