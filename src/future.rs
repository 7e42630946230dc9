//! Provides a thread-safe, futures-aware memoizing cache.
//!
//! To use this module, enable a crate feature called "future".

mod builder;
mod memo;

pub use {builder::MemoBuilder, memo::Memo};
