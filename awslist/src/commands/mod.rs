pub mod beanstalk;
pub mod workspaces;

use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::{
  output::{ItemWriter, OutputFormat},
  pagination::{PageFetcher, PaginationOptions, Paginator, WriterProgress},
};

/// Paging controls shared by every list command
///
/// Supplying either --next-token or --max-items switches to manual paging, which reports progress on stderr
#[derive(Args, Clone, Debug, Default)]
pub struct PagingInput {
  /// Resume listing from the token returned by a previous call
  #[arg(long)]
  pub next_token: Option<String>,

  /// Stop requesting pages once this many records have been retrieved
  ///
  /// Pages are never split, so slightly more records may be returned
  #[arg(long)]
  pub max_items: Option<usize>,

  /// Output format
  #[arg(long, value_enum, default_value_t)]
  pub output: OutputFormat,
}

impl PagingInput {
  pub fn options(&self, page_size_ceiling: usize) -> PaginationOptions {
    PaginationOptions {
      start_token: self.next_token.clone(),
      max_items: self.max_items,
      page_size_ceiling,
    }
  }
}

/// List every record from the fetcher to stdout, reporting progress on stderr
pub async fn list<F>(fetcher: F, paging: &PagingInput, page_size_ceiling: usize) -> Result<()>
where
  F: PageFetcher,
  F::Item: Serialize,
{
  let written = list_to(fetcher, paging, page_size_ceiling, io::stdout(), io::stderr()).await?;
  info!("Listed {written} records");

  Ok(())
}

/// Records retrieved before a failing page are still written out before the error is returned
async fn list_to<F, O, E>(fetcher: F, paging: &PagingInput, page_size_ceiling: usize, out: O, mut err: E) -> Result<usize>
where
  F: PageFetcher,
  F::Item: Serialize,
  O: Write,
  E: Write,
{
  let mut writer = ItemWriter::new(out, paging.output);

  let (result, resume_token) = {
    let progress = WriterProgress::new(&mut err);
    let mut paginator = Paginator::new(fetcher, paging.options(page_size_ceiling), progress);

    let result = loop {
      match paginator.next_page().await {
        Some(Ok(items)) => {
          for item in items {
            writer.write(item)?;
          }
        }
        Some(Err(e)) => break Err(e),
        None => break Ok(()),
      }
    };

    (result, paginator.resume_token().map(str::to_owned))
  };

  let written = writer.finish()?;
  result?;

  if let Some(token) = resume_token {
    writeln!(err, "More records are available, resume with --next-token '{token}'")?;
  }

  Ok(written)
}

#[cfg(test)]
mod tests {
  use anyhow::anyhow;
  use async_trait::async_trait;

  use super::*;
  use crate::pagination::{Page, PageRequest};

  /// Serves pages of two records each, `pages` in total, failing on request `fail_on` if set
  struct PairFetcher {
    pages: usize,
    fail_on: Option<usize>,
  }

  #[async_trait]
  impl PageFetcher for PairFetcher {
    type Item = String;

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<String>> {
      let index = match &request.next_token {
        Some(token) => token.parse::<usize>()?,
        None => 0,
      };
      if self.fail_on == Some(index) {
        return Err(anyhow!("service unavailable"));
      }

      let items = vec![format!("r{}", index * 2), format!("r{}", index * 2 + 1)];
      let next_token = (index + 1 < self.pages).then(|| (index + 1).to_string());

      Ok(Page::new(items, next_token))
    }
  }

  async fn run(fetcher: PairFetcher, paging: PagingInput) -> (Result<usize>, String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = list_to(fetcher, &paging, 2, &mut out, &mut err).await;

    (
      result,
      String::from_utf8(out).unwrap(),
      String::from_utf8(err).unwrap(),
    )
  }

  #[tokio::test]
  async fn it_lists_silently_without_paging_controls() {
    let paging = PagingInput {
      output: OutputFormat::Jsonl,
      ..Default::default()
    };
    let (result, out, err) = run(PairFetcher { pages: 2, fail_on: None }, paging).await;

    assert_eq!(result.unwrap(), 4);
    assert_eq!(out, "\"r0\"\n\"r1\"\n\"r2\"\n\"r3\"\n");
    assert_eq!(err, "");
  }

  #[tokio::test]
  async fn it_reports_progress_and_resume_token_when_capped() {
    let paging = PagingInput {
      max_items: Some(3),
      output: OutputFormat::Jsonl,
      ..Default::default()
    };
    let (result, out, err) = run(PairFetcher { pages: 5, fail_on: None }, paging).await;

    assert_eq!(result.unwrap(), 4);
    assert_eq!(out.lines().count(), 4);
    assert_eq!(
      err,
      "Retrieved 2 records starting from marker ''\n\
       Retrieved 2 records starting from marker '1'\n\
       Completed: retrieved 4 records\n\
       More records are available, resume with --next-token '2'\n"
    );
  }

  #[tokio::test]
  async fn it_resumes_from_next_token() {
    let paging = PagingInput {
      next_token: Some("3".to_string()),
      output: OutputFormat::Jsonl,
      ..Default::default()
    };
    let (result, out, err) = run(PairFetcher { pages: 5, fail_on: None }, paging).await;

    assert_eq!(result.unwrap(), 4);
    assert_eq!(out, "\"r6\"\n\"r7\"\n\"r8\"\n\"r9\"\n");
    assert!(err.ends_with("Completed: retrieved 4 records\n"));
  }

  #[tokio::test]
  async fn it_writes_earlier_records_before_failing() {
    let paging = PagingInput {
      output: OutputFormat::Json,
      ..Default::default()
    };
    let (result, out, _) = run(PairFetcher { pages: 3, fail_on: Some(1) }, paging).await;

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("service unavailable"));
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed, serde_json::json!(["r0", "r1"]));
  }
}
