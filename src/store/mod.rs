pub mod memory;
pub mod sqlite;

pub use memory::{MemorySnippetStore, MemoryUserStore};
pub use sqlite::{SqliteSnippetStore, SqliteUserStore};
