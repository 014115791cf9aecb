pub mod comments;
pub mod posts;
pub mod shared;
pub mod users;
