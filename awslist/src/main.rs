use std::process;

use anyhow::Result;
use awslist::{Cli, Commands};
use clap::Parser;
use tracing_log::AsTrace;
use tracing_subscriber::FmtSubscriber;

#[cfg(not(tarpaulin_include))]
#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let subscriber = FmtSubscriber::builder()
    .with_max_level(cli.verbose.log_level_filter().as_trace())
    .without_time()
    // Records go to stdout, everything else to stderr
    .with_writer(std::io::stderr)
    .finish();
  tracing::subscriber::set_global_default(subscriber).expect("Setting default subscriber failed");

  let result = match &cli.command {
    Commands::Beanstalk(beanstalk) => beanstalk.run(&cli.aws).await,
    Commands::Workspaces(workspaces) => workspaces.run(&cli.aws).await,
  };

  if let Err(err) = result {
    eprintln!("{err:#}");
    process::exit(2);
  }

  Ok(())
}
