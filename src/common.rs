pub(crate) mod entry;
pub(crate) mod error;
pub(crate) mod signal;
pub(crate) mod stats_counter;
pub(crate) mod table;
