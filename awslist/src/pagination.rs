//! Pagination controller shared by every list operation
//!
//! A [`Paginator`] drives a [`PageFetcher`] one request at a time, tracking the continuation token and the
//! number of records retrieved so far. Iteration ends when the service stops returning a token, or when an
//! optional item cap has been met. Pages are never split: when a page carries more records than the remaining
//! budget, every record is yielded and no further request is issued.
use std::io::Write;

use anyhow::{Context, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// A single request issued to a [`PageFetcher`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageRequest {
  /// The cursor to resume from; `None` starts from the first page
  pub next_token: Option<String>,
  /// The number of records requested; always at least 1 and never above the ceiling
  pub page_size: usize,
}

/// One batch of records returned by a [`PageFetcher`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
  pub items: Vec<T>,
  /// The cursor for the next page; `None` when the listing is exhausted
  pub next_token: Option<String>,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
    Self { items, next_token }
  }
}

/// Retrieves a single page of records from a backing service
///
/// Implementations own their filters; the controller only supplies the cursor and the page size.
#[async_trait]
pub trait PageFetcher: Send + Sync {
  type Item: Send;

  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Self::Item>>;
}

/// Receives notifications while a list operation pages through results
///
/// Only invoked in manual paging mode, that is when a starting token or an item cap was supplied.
pub trait ProgressReporter {
  /// Called after every successful page with the page's record count and the token used to request it
  fn on_progress(&mut self, retrieved: usize, token: Option<&str>);

  /// Called exactly once when iteration ends, whether it completed, failed, or was abandoned
  fn on_complete(&mut self, total: usize);
}

/// Discards all progress notifications
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
  fn on_progress(&mut self, _retrieved: usize, _token: Option<&str>) {}

  fn on_complete(&mut self, _total: usize) {}
}

/// Writes progress lines to the wrapped writer (typically stderr)
#[derive(Debug)]
pub struct WriterProgress<W: Write> {
  writer: W,
}

impl<W: Write> WriterProgress<W> {
  pub fn new(writer: W) -> Self {
    Self { writer }
  }

  pub fn into_inner(self) -> W {
    self.writer
  }
}

impl<W: Write> ProgressReporter for WriterProgress<W> {
  fn on_progress(&mut self, retrieved: usize, token: Option<&str>) {
    let marker = token.unwrap_or_default();
    if let Err(err) = writeln!(self.writer, "Retrieved {retrieved} records starting from marker '{marker}'") {
      warn!("Unable to write progress: {err}");
    }
  }

  fn on_complete(&mut self, total: usize) {
    if let Err(err) = writeln!(self.writer, "Completed: retrieved {total} records") {
      warn!("Unable to write progress: {err}");
    }
  }
}

/// Caller supplied controls for a single list operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationOptions {
  /// Resume from this cursor instead of the first page
  pub start_token: Option<String>,
  /// Stop requesting pages once this many records have been retrieved
  pub max_items: Option<usize>,
  /// The largest page size the service operation accepts
  pub page_size_ceiling: usize,
}

impl PaginationOptions {
  pub fn new(page_size_ceiling: usize) -> Self {
    Self {
      start_token: None,
      max_items: None,
      page_size_ceiling,
    }
  }

  pub fn start_token(mut self, token: impl Into<String>) -> Self {
    self.start_token = Some(token.into());
    self
  }

  pub fn max_items(mut self, max_items: usize) -> Self {
    self.max_items = Some(max_items);
    self
  }

  /// Manual paging is signalled by the caller supplying a starting token and/or an item cap
  pub fn is_manual(&self) -> bool {
    self.start_token.is_some() || self.max_items.is_some()
  }
}

/// Iteration bookkeeping for one list operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IterationState {
  next_token: Option<String>,
  emit_limit: Option<usize>,
  retrieved_so_far: usize,
  page_size_ceiling: usize,
  pages_fetched: usize,
}

impl IterationState {
  pub fn new(options: &PaginationOptions) -> Self {
    Self {
      next_token: non_empty(options.start_token.clone()),
      emit_limit: options.max_items,
      retrieved_so_far: 0,
      page_size_ceiling: options.page_size_ceiling.max(1),
      pages_fetched: 0,
    }
  }

  /// The current continuation cursor
  ///
  /// After a capped iteration stops, this is the token to resume from.
  pub fn next_token(&self) -> Option<&str> {
    self.next_token.as_deref()
  }

  pub fn retrieved_so_far(&self) -> usize {
    self.retrieved_so_far
  }

  pub fn pages_fetched(&self) -> usize {
    self.pages_fetched
  }

  /// Page size for the next request, bounded by the ceiling and the remaining budget
  pub fn requested_page_size(&self) -> usize {
    match self.emit_limit {
      Some(limit) => {
        let remaining = limit.saturating_sub(self.retrieved_so_far);
        self.page_size_ceiling.min(remaining).max(1)
      }
      None => self.page_size_ceiling,
    }
  }

  pub fn next_request(&self) -> PageRequest {
    PageRequest {
      next_token: self.next_token.clone(),
      page_size: self.requested_page_size(),
    }
  }

  fn record(&mut self, retrieved: usize, next_token: Option<String>) {
    self.retrieved_so_far += retrieved;
    self.pages_fetched += 1;
    self.next_token = non_empty(next_token);
  }

  pub fn limit_reached(&self) -> bool {
    self.emit_limit.is_some_and(|limit| self.retrieved_so_far >= limit)
  }

  /// Whether iteration is over
  ///
  /// The first request is always issued, so a cap of zero still fetches exactly one page.
  pub fn is_finished(&self) -> bool {
    self.pages_fetched > 0 && (self.next_token.is_none() || self.limit_reached())
  }
}

/// Services occasionally return an empty string in place of an absent token
fn non_empty(token: Option<String>) -> Option<String> {
  token.filter(|t| !t.is_empty())
}

/// Drives a [`PageFetcher`] until the listing is exhausted or the item cap is met
pub struct Paginator<F: PageFetcher, P: ProgressReporter> {
  fetcher: F,
  state: IterationState,
  /// Present only in manual paging mode, taken once on completion
  reporter: Option<P>,
  finished: bool,
}

impl<F: PageFetcher, P: ProgressReporter> Paginator<F, P> {
  pub fn new(fetcher: F, options: PaginationOptions, reporter: P) -> Self {
    let reporter = options.is_manual().then_some(reporter);

    Self {
      fetcher,
      state: IterationState::new(&options),
      reporter,
      finished: false,
    }
  }

  pub fn state(&self) -> &IterationState {
    &self.state
  }

  /// The cursor to resume from when iteration stopped on the item cap rather than exhaustion
  pub fn resume_token(&self) -> Option<&str> {
    match self.finished && self.state.limit_reached() {
      true => self.state.next_token(),
      false => None,
    }
  }

  /// Fetch the next page of records
  ///
  /// Returns `None` once iteration has finished. A fetch failure ends iteration; the error carries the token and
  /// page size of the failing request.
  pub async fn next_page(&mut self) -> Option<Result<Vec<F::Item>>> {
    if self.finished {
      return None;
    }

    let request = self.state.next_request();
    debug!(
      "Requesting {} records starting from marker '{}'",
      request.page_size,
      request.next_token.as_deref().unwrap_or_default()
    );

    let page = self.fetcher.fetch_page(&request).await.with_context(|| {
      format!(
        "Failed to retrieve {} records starting from marker '{}'",
        request.page_size,
        request.next_token.as_deref().unwrap_or_default()
      )
    });

    let Page { items, next_token } = match page {
      Ok(page) => page,
      Err(err) => {
        self.finish();
        return Some(Err(err));
      }
    };

    self.state.record(items.len(), next_token);
    if let Some(reporter) = self.reporter.as_mut() {
      reporter.on_progress(items.len(), request.next_token.as_deref());
    }

    if self.state.is_finished() {
      self.finish();
    }

    Some(Ok(items))
  }

  /// Lazily yield every record, fetching the next page only once the previous one has been consumed
  pub fn items(self) -> impl Stream<Item = Result<F::Item>> {
    let mut paginator = self;

    try_stream! {
      while let Some(page) = paginator.next_page().await {
        for item in page? {
          yield item;
        }
      }
    }
  }

  fn finish(&mut self) {
    self.finished = true;
    if let Some(mut reporter) = self.reporter.take() {
      reporter.on_complete(self.state.retrieved_so_far());
    }
  }
}

impl<F: PageFetcher, P: ProgressReporter> Drop for Paginator<F, P> {
  fn drop(&mut self) {
    self.finish();
  }
}

/// Lazily page through a listing, yielding each record in service order
pub fn paginate<F, P>(fetcher: F, options: PaginationOptions, reporter: P) -> impl Stream<Item = Result<F::Item>>
where
  F: PageFetcher,
  P: ProgressReporter,
{
  Paginator::new(fetcher, options, reporter).items()
}
