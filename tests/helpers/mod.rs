pub mod factories;

pub use factories::{BlockFactory, FailingSink, MemorySink, RowFactory, SchemaFactory};
