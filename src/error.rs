use thiserror::Error;

use crate::types::ColliderId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColliderError {
    /// An argument had the wrong shape (e.g. a non-finite coordinate).
    #[error("Type mismatch: `{param}` expected {expected}")]
    TypeMismatch {
        param: &'static str,
        expected: &'static str,
    },

    #[error("Unknown collider {0:?}")]
    UnknownCollider(ColliderId),

    /// A placement or swept path would cover more grid cells than allowed.
    #[error("Bound spans {cells} grid cells, limit is {limit}")]
    CellSpanTooLarge { cells: u64, limit: usize },
}

/// Reject NaN and infinities for a named numeric argument.
pub(crate) fn check_finite(value: f32, param: &'static str) -> Result<f32, ColliderError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ColliderError::TypeMismatch {
            param,
            expected: "finite number",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_finite() {
        assert_eq!(check_finite(3.5, "x"), Ok(3.5));
        let err = check_finite(f32::INFINITY, "width").unwrap_err();
        assert_eq!(
            err,
            ColliderError::TypeMismatch { param: "width", expected: "finite number" }
        );
        assert_eq!(err.to_string(), "Type mismatch: `width` expected finite number");
    }

    #[test]
    fn test_cell_span_message() {
        let err = ColliderError::CellSpanTooLarge { cells: 5000, limit: 4096 };
        assert_eq!(err.to_string(), "Bound spans 5000 grid cells, limit is 4096");
    }
}
