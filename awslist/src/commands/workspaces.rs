use anyhow::Result;
use clap::{Args, Subcommand};

use crate::{
  cli::AwsInput,
  commands::{list, PagingInput},
  workspaces::{
    self, BundlesFetcher, BundlesFilter, DirectoriesFetcher, DirectoriesFilter, WorkspacesFetcher, WorkspacesFilter,
    PAGE_SIZE_CEILING,
  },
};

#[derive(Args, Debug)]
pub struct Workspaces {
  #[command(subcommand)]
  pub command: WorkspacesCommands,
}

#[derive(Debug, Subcommand)]
pub enum WorkspacesCommands {
  /// List WorkSpaces (DescribeWorkspaces)
  Workspaces(ListWorkspacesInput),

  /// List WorkSpace bundles (DescribeWorkspaceBundles)
  Bundles(ListBundlesInput),

  /// List directories registered with WorkSpaces (DescribeWorkspaceDirectories)
  Directories(ListDirectoriesInput),
}

#[derive(Args, Debug)]
pub struct ListWorkspacesInput {
  #[command(flatten)]
  pub filter: WorkspacesFilter,

  #[command(flatten)]
  pub paging: PagingInput,
}

#[derive(Args, Debug)]
pub struct ListBundlesInput {
  #[command(flatten)]
  pub filter: BundlesFilter,

  #[command(flatten)]
  pub paging: PagingInput,
}

#[derive(Args, Debug)]
pub struct ListDirectoriesInput {
  #[command(flatten)]
  pub filter: DirectoriesFilter,

  #[command(flatten)]
  pub paging: PagingInput,
}

impl Workspaces {
  pub async fn run(&self, aws: &AwsInput) -> Result<()> {
    // Reject invalid filter combinations before resolving credentials
    match &self.command {
      WorkspacesCommands::Workspaces(input) => input.filter.validate()?,
      WorkspacesCommands::Bundles(input) => input.filter.validate()?,
      WorkspacesCommands::Directories(_) => {}
    }

    let config = aws.sdk_config().await?;
    let client = workspaces::get_client(&config, aws.max_attempts);

    match &self.command {
      WorkspacesCommands::Workspaces(input) => {
        let fetcher = WorkspacesFetcher::new(client, input.filter.clone())?;
        list(fetcher, &input.paging, PAGE_SIZE_CEILING).await
      }
      WorkspacesCommands::Bundles(input) => {
        let fetcher = BundlesFetcher::new(client, input.filter.clone())?;
        list(fetcher, &input.paging, PAGE_SIZE_CEILING).await
      }
      WorkspacesCommands::Directories(input) => {
        let fetcher = DirectoriesFetcher::new(client, input.filter.clone());
        list(fetcher, &input.paging, PAGE_SIZE_CEILING).await
      }
    }
  }
}
