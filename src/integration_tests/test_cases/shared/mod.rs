pub mod borrow_logins;
pub mod provision_logins;

pub use borrow_logins::*;
pub use provision_logins::*;
