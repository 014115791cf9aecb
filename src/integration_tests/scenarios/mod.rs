pub mod comment_activity;
pub mod login_cache;

pub use comment_activity::*;
pub use login_cache::*;
