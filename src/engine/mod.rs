//! Engine module: extraction, storage, CLI plumbing

pub mod arg_parser;
pub mod db_ops;
pub mod fb2;
pub mod handlers;
pub mod progress;
pub mod tools;

// Re-export commonly used items
pub use arg_parser::{Cli, Commands};
pub use db_ops::{RecordStore, SqliteStore, open_db, open_db_in_memory};
pub use fb2::{Fb2Extractor, MetadataExtractor, parse_fb2};
pub use handlers::handle_run;
pub use tools::{is_recognized_entry, safe_file_name};
