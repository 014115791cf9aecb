pub mod verify_post_count;

pub use verify_post_count::*;
