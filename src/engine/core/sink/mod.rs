pub mod flush;
pub mod writer;

pub use flush::{date_partitioned_name, Appender, FlushSink};
pub use writer::{DirWriter, MultiWriter, Writer};

#[cfg(test)]
mod flush_test;
#[cfg(test)]
mod writer_test;
