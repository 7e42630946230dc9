#![warn(clippy::all)]
#![warn(rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Memocache is a concurrency-safe memoizing cache for Rust.
//!
//! A memo wraps a computation keyed by an arbitrary `Hash + Eq` key and
//! guarantees that the computation runs **at most once per key**, even when
//! many threads (or tasks) ask for the same key at the same time. Callers that
//! arrive while a key is being computed wait for that computation and share
//! its result. Callers asking for different keys never wait for each other.
//!
//! Memocache provides the following memo implementations:
//!
//! - Thread-safe, blocking memo:
//!     - [`sync::Memo`][sync-memo-struct]
//! - Thread-safe, futures aware memo:
//!     - [`future::Memo`][future-memo-struct]
//!
//! All memos perform single-flight deduplication:
//!
//! - Results are computed lazily, on the first `get` of each key.
//! - The table of entries is guarded by one mutex that is held only to look a
//!   key up or insert it, never while a computation runs.
//! - A computed result is published once and read without locking afterwards.
//! - Errors are memoized exactly like values and are never retried.
//! - A computation that panics (or, for `future::Memo`, is dropped midway) is
//!   published as [`MemoError::InitPanicked`] (or
//!   [`MemoError::InitAborted`]), so no caller is left waiting forever.
//!
//! Memos never evict, expire or bound their entries. Entries live as long as
//! the memo.
//!
//! # Crate Features
//!
//! - `sync` (enabled by default): provides [`sync::Memo`][sync-memo-struct].
//! - `future`: provides [`future::Memo`][future-memo-struct].
//! - `logging`: emits log records through the [log][log-crate] crate when a
//!   computation fails, panics or is abandoned.
//!
//! [sync-memo-struct]: ./sync/struct.Memo.html
//! [future-memo-struct]: ./future/struct.Memo.html
//! [log-crate]: https://crates.io/crates/log
//!
//! # Example
//!
//! ```rust
//! use memocache::{sync::Memo, MemoError};
//!
//! let memo = Memo::new(|key: &String| match key.as_str() {
//!     "a" => Ok(1),
//!     _ => Err("boom"),
//! });
//!
//! assert_eq!(memo.get("a").ok(), Some(1));
//! assert!(matches!(memo.get("b"), Err(MemoError::Computation(e)) if *e == "boom"));
//! ```
//!
//! # Minimum Supported Rust Versions
//!
//! This crate's minimum supported Rust versions (MSRV) are the followings:
//!
//! | Feature          | MSRV                       |
//! |:-----------------|:--------------------------:|
//! | default features | Rust 1.65.0 (Nov 3, 2022)  |
//! | `future`         | Rust 1.65.0 (Nov 3, 2022)  |

#[cfg(feature = "future")]
#[cfg_attr(docsrs, doc(cfg(feature = "future")))]
pub mod future;

#[cfg(feature = "sync")]
#[cfg_attr(docsrs, doc(cfg(feature = "sync")))]
pub mod sync;

pub(crate) mod common;
mod stats;

pub use common::error::MemoError;
pub use stats::MemoStats;
