pub mod assertions;
pub mod context;
pub mod scenario_result;
pub mod traits;

pub use assertions::*;
pub use context::*;
pub use scenario_result::*;
pub use traits::*;
