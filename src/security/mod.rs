pub mod token;

pub use token::{generate_stream_id, generate_stream_key, verify_stream_key};
