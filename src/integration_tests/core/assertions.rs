use crate::RealError;
use std::fmt::Debug;

/// Like `assert_eq!`, but fails the scenario with an error so the login cache
/// still gets torn down.
pub fn ensure_eq<T>(actual: T, expected: T, what: &str) -> Result<(), RealError>
where
    T: PartialEq + Debug,
{
    if actual == expected {
        Ok(())
    } else {
        Err(RealError::Other(anyhow::anyhow!(
            "{}: expected {:?}, got {:?}",
            what,
            expected,
            actual
        )))
    }
}

pub fn ensure(condition: bool, what: &str) -> Result<(), RealError> {
    if condition {
        Ok(())
    } else {
        Err(RealError::Other(anyhow::anyhow!("Check failed: {}", what)))
    }
}
