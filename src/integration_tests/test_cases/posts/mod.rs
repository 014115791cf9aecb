pub mod add_post;
pub mod verify_comment_activity;

pub use add_post::*;
pub use verify_comment_activity::*;
