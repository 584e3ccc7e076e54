pub mod beanstalk;
pub mod cli;
pub mod commands;
pub mod output;
pub mod pagination;
pub mod workspaces;

use std::env;

use anyhow::Result;
use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, SdkConfig};
use aws_types::region::Region;
pub use cli::{Cli, Commands};
pub use pagination::{paginate, Page, PageFetcher, PageRequest, PaginationOptions, Paginator, ProgressReporter};

/// Get the configuration to authn/authz with AWS that will be used across AWS clients
pub async fn get_sdk_config(region: Option<String>, profile: Option<String>) -> Result<SdkConfig> {
  let aws_region = match region {
    Some(region) => Some(Region::new(region)),
    None => env::var("AWS_DEFAULT_REGION").ok().map(Region::new),
  };

  let region_provider = RegionProviderChain::first_try(aws_region).or_default_provider();

  let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
  if let Some(profile) = profile {
    loader = loader.profile_name(profile);
  }

  Ok(loader.load().await)
}
