//! Engine contract - the single extension point a robot implements.
//!
//! An engine receives a [`CancellationToken`] and should check it at its own
//! cooperative checkpoints. The harness never preempts an engine; an engine
//! that ignores the token simply keeps running until it returns.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// How an engine run ended, when it did not complete normally.
///
/// Engines report cancellation explicitly with [`EngineError::Cancelled`];
/// every other error is a failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The cancellation token was observed and honoured
    #[error("operation was cancelled")]
    Cancelled,

    /// Any other error raised by the engine
    #[error("{0}")]
    Failed(eyre::Report),
}

impl EngineError {
    /// Wrap an arbitrary message as a failure.
    pub fn fail(msg: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        EngineError::Failed(eyre::Report::msg(msg))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}

impl From<eyre::Report> for EngineError {
    fn from(report: eyre::Report) -> Self {
        EngineError::Failed(report)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Failed(eyre::Report::new(err))
    }
}

/// Cooperative checkpoint: `Err(Cancelled)` once the token is set.
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), EngineError> {
    if cancel.is_cancelled() {
        Err(EngineError::Cancelled)
    } else {
        Ok(())
    }
}

/// A single asynchronous unit of work, run once per process.
///
/// ```
/// use async_trait::async_trait;
/// use robot::{Engine, EngineError};
/// use tokio_util::sync::CancellationToken;
///
/// struct Nightly;
///
/// #[async_trait]
/// impl Engine for Nightly {
///     async fn run(&self, cancel: CancellationToken) -> Result<(), EngineError> {
///         robot::engine::ensure_not_cancelled(&cancel)?;
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Engine: Send + Sync {
    async fn run(&self, cancel: CancellationToken) -> Result<(), EngineError>;
}

#[async_trait]
impl<E: Engine + ?Sized> Engine for Arc<E> {
    async fn run(&self, cancel: CancellationToken) -> Result<(), EngineError> {
        (**self).run(cancel).await
    }
}

#[async_trait]
impl<E: Engine + ?Sized> Engine for Box<E> {
    async fn run(&self, cancel: CancellationToken) -> Result<(), EngineError> {
        (**self).run(cancel).await
    }
}

/// Closure-backed engine.
///
/// Each call to [`Engine::run`] invokes the closure and awaits the future it
/// returns.
pub struct EngineFn<F> {
    f: F,
}

impl<F> EngineFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Engine for EngineFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), EngineError>> + Send + 'static,
{
    async fn run(&self, cancel: CancellationToken) -> Result<(), EngineError> {
        (self.f)(cancel).await
    }
}
