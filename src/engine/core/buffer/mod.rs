pub mod store;
pub mod value_log;

pub use store::BufferStore;
pub use value_log::{Entry, LogRecord, ValueLog};

#[cfg(test)]
mod store_test;
