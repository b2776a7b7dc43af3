//! Pre- and post-fetch hooks for the primary-data path.
//!
//! Hooks are fixed when the orchestrator is built. When none are supplied,
//! [`PassThrough`] and [`Identity`] are used.

use crate::error::Result;
use crate::request::Request;
use std::future::{ready, Future};

/// Runs before the fetch. Returning `Err` aborts the pull; the fetch and
/// the post hook never run.
pub trait PreHook: Send + Sync + 'static {
    fn before(&self, request: &Request) -> impl Future<Output = Result<()>> + Send;
}

/// Runs after a successful fetch and may replace the fetched value.
/// Returning `Err` aborts the pull and nothing is cached.
pub trait PostHook<T>: Send + Sync + 'static {
    fn after(&self, request: &Request, value: T) -> impl Future<Output = Result<T>> + Send;
}

/// Default pre hook: accepts every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThrough;

impl PreHook for PassThrough {
    fn before(&self, _request: &Request) -> impl Future<Output = Result<()>> + Send {
        ready(Ok(()))
    }
}

/// Default post hook: returns the fetched value unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<T: Send + 'static> PostHook<T> for Identity {
    fn after(&self, _request: &Request, value: T) -> impl Future<Output = Result<T>> + Send {
        ready(Ok(value))
    }
}

/// Pre hook backed by a synchronous closure. See [`pre_hook_fn`].
#[derive(Clone, Copy)]
pub struct PreHookFn<F>(F);

/// Wrap a closure as a [`PreHook`].
///
/// ```
/// use provider_pull::{hooks::pre_hook_fn, Error, Request};
///
/// let require_id = pre_hook_fn(|request: &Request| match request.params.id {
///     Some(_) => Ok(()),
///     None => Err(Error::HookAborted("id is required".to_string())),
/// });
/// # let _ = require_id;
/// ```
pub fn pre_hook_fn<F>(f: F) -> PreHookFn<F>
where
    F: Fn(&Request) -> Result<()> + Send + Sync + 'static,
{
    PreHookFn(f)
}

impl<F> PreHook for PreHookFn<F>
where
    F: Fn(&Request) -> Result<()> + Send + Sync + 'static,
{
    fn before(&self, request: &Request) -> impl Future<Output = Result<()>> + Send {
        ready((self.0)(request))
    }
}

/// Post hook backed by a synchronous closure. See [`post_hook_fn`].
#[derive(Clone, Copy)]
pub struct PostHookFn<F>(F);

/// Wrap a closure as a [`PostHook`].
pub fn post_hook_fn<F, T>(f: F) -> PostHookFn<F>
where
    F: Fn(&Request, T) -> Result<T> + Send + Sync + 'static,
{
    PostHookFn(f)
}

impl<F, T> PostHook<T> for PostHookFn<F>
where
    F: Fn(&Request, T) -> Result<T> + Send + Sync + 'static,
    T: Send + 'static,
{
    fn after(&self, request: &Request, value: T) -> impl Future<Output = Result<T>> + Send {
        ready((self.0)(request, value))
    }
}
