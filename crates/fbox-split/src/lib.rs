//! fbox-split: the file chunking engine
//!
//! # Overview
//! - `plan`: split strategies, option resolution, chunk naming, size parsing
//! - `engine`: byte-oriented split loop and the report model
//! - `text`: encoding detection and the character-oriented split
//! - `join`: chunk-family discovery and reassembly

pub mod engine;
pub mod join;
pub mod plan;
pub mod text;

// Convenience re-exports for the most common operations
pub use engine::{split_file, ChunkFile, ProgressFn, SplitReport};
pub use join::{join_chunks, JoinReport};
pub use plan::{
    chunk_file_name, parse_byte_size, parse_chunk_name, ChunkName, SplitOptions, SplitStrategy,
};
pub use text::TextEncoding;
