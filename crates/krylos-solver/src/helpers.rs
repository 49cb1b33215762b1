//! Small helpers shared by the Krylov engines.

use crate::error::{Error, Result};
use crate::preconditioner::Preconditioner;

/// Step by which the restart shrinks when workspace allocation fails.
pub(crate) const SHRINK_STEP: usize = 5;
/// No shrink attempt is made at or below this restart length.
pub(crate) const SHRINK_FLOOR: usize = 5;

/// Next restart length to try after an allocation failure, or `None` when
/// the floor has been reached.
pub(crate) fn shrink_restart(restart: usize) -> Option<usize> {
    if restart > SHRINK_FLOOR {
        Some(restart - SHRINK_STEP)
    } else {
        None
    }
}

/// Allocate a length-`len` zeroed buffer without aborting on failure.
pub(crate) fn try_vec(len: usize) -> Option<Vec<f64>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).ok()?;
    v.resize(len, 0.0);
    Some(v)
}

/// Check that the right-hand side, solution vector, and preconditioner all
/// agree with the operator dimension.
pub(crate) fn check_dims(
    n: usize,
    b: &[f64],
    x: &[f64],
    pc: Option<&dyn Preconditioner>,
) -> Result<()> {
    if b.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }
    if x.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: x.len(),
        });
    }
    if let Some(m) = pc {
        if m.dim() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: m.dim(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrink_policy_steps_down_to_the_floor() {
        assert_eq!(shrink_restart(30), Some(25));
        assert_eq!(shrink_restart(10), Some(5));
        assert_eq!(shrink_restart(7), Some(2));
        assert_eq!(shrink_restart(5), None);
        assert_eq!(shrink_restart(2), None);
    }

    #[test]
    fn try_vec_zeroes_the_buffer() {
        let v = try_vec(8).unwrap();
        assert_eq!(v.len(), 8);
        assert!(v.iter().all(|&x| x == 0.0));
    }
}
