//! Hook pipeline: pre hook → fetch → post hook.

use crate::error::{Error, Result};
use crate::hooks::{PostHook, PreHook};
use crate::request::Request;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Suspension points of a pull.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Lookup,
    PreHook,
    Fetch,
    PostHook,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lookup => "lookup",
            Stage::PreHook => "pre hook",
            Stage::Fetch => "fetch",
            Stage::PostHook => "post hook",
        };
        f.write_str(name)
    }
}

/// Await `fut`, failing with `Error::Timeout` if `limit` elapses first.
///
/// Without a limit the future is awaited as-is and no timer is involved, so
/// any executor works. With a limit, a Tokio runtime with time enabled is
/// required.
pub(crate) async fn bounded<T, Fut>(limit: Option<Duration>, stage: Stage, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            Error::Timeout(format!("{} did not complete within {:?}", stage, limit))
        })?,
        None => fut.await,
    }
}

/// One pre hook / fetch / post hook sequence.
pub struct HookPipeline<'h, Pre, Post> {
    pre: &'h Pre,
    post: &'h Post,
    stage_timeout: Option<Duration>,
}

impl<Pre, Post> Clone for HookPipeline<'_, Pre, Post> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Pre, Post> Copy for HookPipeline<'_, Pre, Post> {}

impl<'h, Pre: PreHook, Post> HookPipeline<'h, Pre, Post> {
    pub fn new(pre: &'h Pre, post: &'h Post) -> Self {
        HookPipeline {
            pre,
            post,
            stage_timeout: None,
        }
    }

    /// Bound every stage by `limit`.
    pub fn with_stage_timeout(mut self, limit: Option<Duration>) -> Self {
        self.stage_timeout = limit;
        self
    }

    /// Run the sequence. Any error stops it and is returned unchanged;
    /// `fetch` is only called once the pre hook has accepted the request.
    pub async fn run<'r, T, F, Fut>(self, request: &'r Request, fetch: F) -> Result<T>
    where
        Post: PostHook<T>,
        F: FnOnce(&'r Request) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        bounded(self.stage_timeout, Stage::PreHook, self.pre.before(request)).await?;
        let value = bounded(self.stage_timeout, Stage::Fetch, fetch(request)).await?;
        bounded(
            self.stage_timeout,
            Stage::PostHook,
            self.post.after(request, value),
        )
        .await
    }
}

/// Run `pre`, then `fetch`, then `post` for `request`, without stage limits.
pub async fn run_with_hooks<'r, T, Pre, F, Fut, Post>(
    request: &'r Request,
    pre: &Pre,
    fetch: F,
    post: &Post,
) -> Result<T>
where
    Pre: PreHook,
    Post: PostHook<T>,
    F: FnOnce(&'r Request) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    HookPipeline::new(pre, post).run(request, fetch).await
}
