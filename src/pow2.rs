//! Power-of-two checks and divisor to shift conversion.

use crate::error::ArithmeticError;

/// True iff `n` is positive and has exactly one bit set.
pub fn is_power_of_two(n: i64) -> bool {
    n > 0 && n & (n - 1) == 0
}

/// The right-shift amount equivalent to dividing by `divisor`.
///
/// Fails with [`ArithmeticError::InvalidArgument`] unless `divisor` is a power of two.
pub fn shift_amount_for(divisor: i64) -> Result<u32, ArithmeticError> {
    if !is_power_of_two(divisor) {
        return Err(ArithmeticError::InvalidArgument { value: divisor });
    }

    let mut divisor = divisor;
    let mut shift = 0;
    while divisor & 1 == 0 {
        divisor >>= 1;
        shift += 1;
    }

    Ok(shift)
}
