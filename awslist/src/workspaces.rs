//! WorkSpaces list operations
use anyhow::{bail, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_workspaces::{
  config::{self, retry::RetryConfig},
  types::{Workspace as WorkspaceDescription, WorkspaceBundle, WorkspaceDirectory},
  Client,
};
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pagination::{Page, PageFetcher, PageRequest};

/// Largest `Limit` value accepted by the WorkSpaces describe operations
pub const PAGE_SIZE_CEILING: usize = 25;

/// Construct and return the WorkSpaces client
pub fn get_client(config: &SdkConfig, max_attempts: u32) -> Client {
  Client::from_conf(
    config::Builder::from(config)
      .retry_config(RetryConfig::standard().with_max_attempts(max_attempts))
      .build(),
  )
}

/// Filters for `DescribeWorkspaces`
#[derive(Args, Clone, Debug, Default)]
pub struct WorkspacesFilter {
  /// Restrict results to these WorkSpace IDs
  ///
  /// Cannot be combined with any other filter
  #[arg(long, value_delimiter = ',', conflicts_with_all = ["directory_id", "user_name", "bundle_id"])]
  pub workspace_ids: Option<Vec<String>>,

  /// Restrict results to WorkSpaces registered to this directory
  #[arg(long)]
  pub directory_id: Option<String>,

  /// Restrict results to WorkSpaces of this user; requires --directory-id
  #[arg(long, requires = "directory_id")]
  pub user_name: Option<String>,

  /// Restrict results to WorkSpaces created from this bundle
  #[arg(long)]
  pub bundle_id: Option<String>,
}

impl WorkspacesFilter {
  pub fn validate(&self) -> Result<()> {
    let others = self.directory_id.is_some() || self.user_name.is_some() || self.bundle_id.is_some();
    if self.workspace_ids.is_some() && others {
      bail!("WorkSpace IDs cannot be combined with directory, user name, or bundle filters");
    }

    if self.user_name.is_some() && self.directory_id.is_none() {
      bail!("A user name filter requires a directory ID");
    }

    Ok(())
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Workspace {
  pub workspace_id: Option<String>,
  pub directory_id: Option<String>,
  pub user_name: Option<String>,
  pub ip_address: Option<String>,
  pub state: Option<String>,
  pub bundle_id: Option<String>,
  pub computer_name: Option<String>,
  pub error_message: Option<String>,
}

impl From<WorkspaceDescription> for Workspace {
  fn from(ws: WorkspaceDescription) -> Self {
    Self {
      workspace_id: ws.workspace_id,
      directory_id: ws.directory_id,
      user_name: ws.user_name,
      ip_address: ws.ip_address,
      state: ws.state.map(|s| s.as_str().to_owned()),
      bundle_id: ws.bundle_id,
      computer_name: ws.computer_name,
      error_message: ws.error_message,
    }
  }
}

pub struct WorkspacesFetcher {
  client: Client,
  filter: WorkspacesFilter,
}

impl WorkspacesFetcher {
  pub fn new(client: Client, filter: WorkspacesFilter) -> Result<Self> {
    filter.validate()?;

    Ok(Self { client, filter })
  }
}

#[async_trait]
impl PageFetcher for WorkspacesFetcher {
  type Item = Workspace;

  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Workspace>> {
    let output = self
      .client
      .describe_workspaces()
      .set_workspace_ids(self.filter.workspace_ids.clone())
      .set_directory_id(self.filter.directory_id.clone())
      .set_user_name(self.filter.user_name.clone())
      .set_bundle_id(self.filter.bundle_id.clone())
      .limit(i32::try_from(request.page_size)?)
      .set_next_token(request.next_token.clone())
      .send()
      .await?;

    let items = output
      .workspaces
      .unwrap_or_default()
      .into_iter()
      .map(Workspace::from)
      .collect::<Vec<_>>();
    debug!("Described {} workspaces", items.len());

    Ok(Page::new(items, output.next_token))
  }
}

/// Filters for `DescribeWorkspaceBundles`
#[derive(Args, Clone, Debug, Default)]
pub struct BundlesFilter {
  /// Restrict results to these bundle IDs
  #[arg(long, value_delimiter = ',', conflicts_with = "owner")]
  pub bundle_ids: Option<Vec<String>>,

  /// Bundle owner; `AMAZON` for public bundles, omit for account bundles
  #[arg(long)]
  pub owner: Option<String>,
}

impl BundlesFilter {
  pub fn validate(&self) -> Result<()> {
    if self.bundle_ids.is_some() && self.owner.is_some() {
      bail!("Bundle IDs and owner cannot be combined");
    }

    Ok(())
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bundle {
  pub bundle_id: Option<String>,
  pub name: Option<String>,
  pub owner: Option<String>,
  pub description: Option<String>,
  pub image_id: Option<String>,
}

impl From<WorkspaceBundle> for Bundle {
  fn from(bundle: WorkspaceBundle) -> Self {
    Self {
      bundle_id: bundle.bundle_id,
      name: bundle.name,
      owner: bundle.owner,
      description: bundle.description,
      image_id: bundle.image_id,
    }
  }
}

/// `DescribeWorkspaceBundles` has no page size parameter, the requested size is advisory only
pub struct BundlesFetcher {
  client: Client,
  filter: BundlesFilter,
}

impl BundlesFetcher {
  pub fn new(client: Client, filter: BundlesFilter) -> Result<Self> {
    filter.validate()?;

    Ok(Self { client, filter })
  }
}

#[async_trait]
impl PageFetcher for BundlesFetcher {
  type Item = Bundle;

  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Bundle>> {
    let output = self
      .client
      .describe_workspace_bundles()
      .set_bundle_ids(self.filter.bundle_ids.clone())
      .set_owner(self.filter.owner.clone())
      .set_next_token(request.next_token.clone())
      .send()
      .await?;

    let items = output
      .bundles
      .unwrap_or_default()
      .into_iter()
      .map(Bundle::from)
      .collect::<Vec<_>>();
    debug!("Described {} bundles", items.len());

    Ok(Page::new(items, output.next_token))
  }
}

/// Filters for `DescribeWorkspaceDirectories`
#[derive(Args, Clone, Debug, Default)]
pub struct DirectoriesFilter {
  /// Restrict results to these directory IDs
  #[arg(long, value_delimiter = ',')]
  pub directory_ids: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Directory {
  pub directory_id: Option<String>,
  pub alias: Option<String>,
  pub directory_name: Option<String>,
  pub directory_type: Option<String>,
  pub state: Option<String>,
  pub registration_code: Option<String>,
}

impl From<WorkspaceDirectory> for Directory {
  fn from(dir: WorkspaceDirectory) -> Self {
    Self {
      directory_id: dir.directory_id,
      alias: dir.alias,
      directory_name: dir.directory_name,
      directory_type: dir.directory_type.map(|t| t.as_str().to_owned()),
      state: dir.state.map(|s| s.as_str().to_owned()),
      registration_code: dir.registration_code,
    }
  }
}

pub struct DirectoriesFetcher {
  client: Client,
  filter: DirectoriesFilter,
}

impl DirectoriesFetcher {
  pub fn new(client: Client, filter: DirectoriesFilter) -> Self {
    Self { client, filter }
  }
}

#[async_trait]
impl PageFetcher for DirectoriesFetcher {
  type Item = Directory;

  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Directory>> {
    let output = self
      .client
      .describe_workspace_directories()
      .set_directory_ids(self.filter.directory_ids.clone())
      .limit(i32::try_from(request.page_size)?)
      .set_next_token(request.next_token.clone())
      .send()
      .await?;

    let items = output
      .directories
      .unwrap_or_default()
      .into_iter()
      .map(Directory::from)
      .collect::<Vec<_>>();
    debug!("Described {} directories", items.len());

    Ok(Page::new(items, output.next_token))
  }
}

#[cfg(test)]
mod tests {
  use aws_sdk_workspaces::types::WorkspaceState;
  use rstest::*;

  use super::*;

  fn ids(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(|v| v.to_string()).collect())
  }

  #[rstest]
  #[case(WorkspacesFilter::default(), true)]
  #[case(WorkspacesFilter { workspace_ids: ids(&["ws-1", "ws-2"]), ..Default::default() }, true)]
  #[case(WorkspacesFilter { directory_id: Some("d-1".to_string()), user_name: Some("jdoe".to_string()), ..Default::default() }, true)]
  #[case(WorkspacesFilter { workspace_ids: ids(&["ws-1"]), bundle_id: Some("wsb-1".to_string()), ..Default::default() }, false)]
  #[case(WorkspacesFilter { workspace_ids: ids(&["ws-1"]), directory_id: Some("d-1".to_string()), ..Default::default() }, false)]
  #[case(WorkspacesFilter { user_name: Some("jdoe".to_string()), ..Default::default() }, false)]
  fn it_validates_workspace_filters(#[case] filter: WorkspacesFilter, #[case] valid: bool) {
    assert_eq!(filter.validate().is_ok(), valid);
  }

  #[rstest]
  #[case(BundlesFilter::default(), true)]
  #[case(BundlesFilter { owner: Some("AMAZON".to_string()), ..Default::default() }, true)]
  #[case(BundlesFilter { bundle_ids: ids(&["wsb-1"]), ..Default::default() }, true)]
  #[case(BundlesFilter { bundle_ids: ids(&["wsb-1"]), owner: Some("AMAZON".to_string()) }, false)]
  fn it_validates_bundle_filters(#[case] filter: BundlesFilter, #[case] valid: bool) {
    assert_eq!(filter.validate().is_ok(), valid);
  }

  #[test]
  fn it_shapes_workspaces() {
    let description = WorkspaceDescription::builder()
      .workspace_id("ws-abc123")
      .directory_id("d-123")
      .user_name("jdoe")
      .state(WorkspaceState::Available)
      .build();

    let ws = Workspace::from(description);
    assert_eq!(ws.workspace_id.as_deref(), Some("ws-abc123"));
    assert_eq!(ws.state.as_deref(), Some("AVAILABLE"));

    let json = serde_json::to_value(&ws).unwrap();
    assert_eq!(json["WorkspaceId"], "ws-abc123");
    assert_eq!(json["UserName"], "jdoe");
  }
}
