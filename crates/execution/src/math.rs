//! Decimal helpers

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Square root for Decimal using Newton's method
pub fn sqrt_decimal(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    // Newton's method: x_{n+1} = (x_n + S/x_n) / 2
    let mut guess = if x > Decimal::ONE { x / Decimal::TWO } else { Decimal::ONE };

    for _ in 0..64 {
        let next = (guess + x / guess) / Decimal::TWO;
        if (next - guess).abs() < dec!(0.000000000001) {
            return next;
        }
        guess = next;
    }
    guess
}
