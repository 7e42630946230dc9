//! Provides a thread-safe memoizing cache for blocking callers.

mod builder;
mod memo;

pub use {builder::MemoBuilder, memo::Memo};
