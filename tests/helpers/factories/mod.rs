pub mod block_factory;
pub mod row_factory;
pub mod schema_factory;
pub mod sink_factory;

pub use block_factory::BlockFactory;
pub use row_factory::RowFactory;
pub use schema_factory::SchemaFactory;
pub use sink_factory::{FailingSink, MemorySink};
