//! Evaluation runtime for splice.
//!
//! This crate sits between a host (the `splice` CLI) and a script
//! [`Executor`]:
//!
//! - [`Session`] holds the current script and input texts and submits a new
//!   request on every edit.
//! - [`Orchestrator`] runs at most one evaluation at a time, coalesces
//!   requests that arrive meanwhile, and publishes a [`View`] in which an
//!   older result never replaces a newer one.
//! - [`config`] loads the layered `SpliceConfig`.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use splice_runtime::config::OrchestratorConfig;
//! use splice_runtime::{EvaluationResult, Executor, FailureKind, Orchestrator};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! struct Fails;
//!
//! #[async_trait]
//! impl Executor for Fails {
//!     async fn execute(&self, _: &str, _: &str, _: CancellationToken) -> EvaluationResult {
//!         EvaluationResult::failure(FailureKind::Runtime, "no")
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let handle = Orchestrator::spawn(Arc::new(Fails), OrchestratorConfig::default());
//! let seq = handle.submit("script", "input");
//! let view = handle.wait_for(seq).await.expect("orchestrator running");
//! assert_eq!(view.error_message(), Some("no"));
//! # }
//! ```

pub mod config;
mod evaluation;
mod executor;
mod orchestrator;
mod source;

pub use evaluation::{EvalFailure, EvaluationResult, FailureKind, Transformed};
pub use executor::Executor;
pub use orchestrator::{Orchestrator, OrchestratorHandle, View};
pub use source::{Session, SourceText};
