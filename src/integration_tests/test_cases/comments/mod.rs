pub mod add_comment;
pub mod delete_comment;
pub mod report_comment_views;

pub use add_comment::*;
pub use delete_comment::*;
pub use report_comment_views::*;
