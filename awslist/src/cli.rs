use anyhow::Result;
use aws_config::SdkConfig;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::Verbosity;

use crate::commands;

/// Styles for CLI
fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .literal(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightCyan))),
    )
    .usage(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
}

#[derive(Debug, Parser)]
#[command(author, about, version)]
#[command(propagate_version = true)]
#[command(styles=get_styles())]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,

  #[clap(flatten)]
  pub verbose: Verbosity,

  #[command(flatten)]
  pub aws: AwsInput,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  /// List Elastic Beanstalk application versions, environments, and events
  Beanstalk(commands::beanstalk::Beanstalk),

  /// List WorkSpaces, bundles, and directories
  Workspaces(commands::workspaces::Workspaces),
}

/// Settings shared by every AWS client
#[derive(Args, Clone, Debug)]
pub struct AwsInput {
  /// The AWS region to query
  ///
  /// Falls back to AWS_DEFAULT_REGION and then the default provider chain
  #[arg(long, global = true, env = "AWS_REGION")]
  pub region: Option<String>,

  /// The named profile used to resolve credentials
  #[arg(long, global = true, env = "AWS_PROFILE")]
  pub profile: Option<String>,

  /// Maximum attempts per request, including the initial call
  #[arg(long, global = true, default_value_t = 3)]
  pub max_attempts: u32,
}

impl AwsInput {
  pub async fn sdk_config(&self) -> Result<SdkConfig> {
    crate::get_sdk_config(self.region.clone(), self.profile.clone()).await
  }
}
