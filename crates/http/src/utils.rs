//! Utility macros used across the codec.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Like `assert!`, but for conditions that reject input rather than signal
/// a bug.
///
/// ```ignore
/// ensure!(src.len() <= max_size, ParseError::too_large(src.len(), max_size));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
