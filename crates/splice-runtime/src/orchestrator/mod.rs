//! Coalescing evaluation scheduler.
//!
//! # Architecture
//!
//! ```text
//!  Session / host                     Orchestrator (one task)
//!  ──────────────                     ───────────────────────
//!  handle.submit(script, input) ──▶  request_rx
//!        │ assigns Sequence              │
//!        ▼                               ▼
//!     #1 #2 #3                     Idle ──start──▶ Running(#1)
//!                                        ▲             │ #2, #3 arrive:
//!                                        │             │ pending = #3 (latest)
//!                                        │             ▼
//!                                        └── #1 done: stale, discard; start #3
//!                                                      │
//!                                                #3 done: apply
//!                                                      ▼
//!  handle.subscribe()  ◀──────────────────────── watch<View>
//! ```
//!
//! # Ordering
//!
//! - A request's [`Sequence`](splice_types::Sequence) is assigned at
//!   submission, never at completion.
//! - At most one evaluation runs at a time. Requests that arrive while one is
//!   running replace each other in a single pending slot, so intermediate
//!   requests are never executed.
//! - A completed evaluation is applied only if its sequence is still the
//!   latest submitted one. Otherwise it is discarded. An older result can
//!   never overwrite a newer one.
//! - With `cancel_superseded`, the running evaluation is also cancelled when
//!   a newer request arrives. Discarding does not depend on it.
//!
//! # View
//!
//! A successful result replaces the visible output and clears the error. A
//! failed result sets the error and leaves the last successful output in
//! place.

mod handle;
mod runner;
mod view;

pub use handle::OrchestratorHandle;
pub use runner::Orchestrator;
pub use view::View;
