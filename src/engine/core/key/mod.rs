pub mod key;

pub use key::{prefix_of, Key, KEY_SIZE};
