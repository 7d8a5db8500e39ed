// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fallible growth for the per-frame buffers.

use std::collections::TryReserveError;

use thiserror::Error;

/// Failure to grow one of the per-frame buffers.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("out of memory growing {buffer} buffer")]
pub struct AllocError {
    /// Name of the buffer that failed to grow.
    pub buffer: &'static str,
    #[source]
    source: TryReserveError,
}

/// Reserves room for `additional` more elements, keeping `Vec`'s
/// amortized doubling.
pub fn reserve<T>(
    vec: &mut Vec<T>,
    buffer: &'static str,
    additional: usize,
) -> Result<(), AllocError> {
    vec.try_reserve(additional)
        .map_err(|source| AllocError { buffer, source })
}

pub fn push<T>(vec: &mut Vec<T>, buffer: &'static str, value: T) -> Result<(), AllocError> {
    reserve(vec, buffer, 1)?;
    vec.push(value);
    Ok(())
}

pub fn extend<T: Copy>(
    vec: &mut Vec<T>,
    buffer: &'static str,
    values: &[T],
) -> Result<(), AllocError> {
    reserve(vec, buffer, values.len())?;
    vec.extend_from_slice(values);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{extend, reserve};

    #[test]
    fn impossible_reservation_is_an_error() {
        let mut v: Vec<u64> = Vec::new();
        let err = reserve(&mut v, "test", usize::MAX).unwrap_err();
        assert_eq!(err.buffer, "test");
        assert!(v.is_empty());
    }

    #[test]
    fn extend_keeps_existing_data() {
        let mut v = vec![1_u32, 2, 3];
        extend(&mut v, "test", &[4, 5]).unwrap();
        assert_eq!(v, [1, 2, 3, 4, 5]);
    }
}
