pub mod collection_ext;
pub mod stats;

pub use collection_ext::{KeyDiff, diff_keys, group_by_key, index_by};
