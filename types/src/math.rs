//! Integer helpers shared by the power, quorum and distribution computations.
//!
//! Everything is integer so results are identical on every machine.

/// Basis-point denominator: 10 000 bps = 100%.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Floor of the square root, by Newton iteration.
pub fn isqrt(n: u128) -> u128 {
    if n <= 1 {
        return n;
    }
    let mut x = n;
    let mut y = (n >> 1) + 1;
    while y < x {
        x = y;
        y = (x + n / x) >> 1;
    }
    x
}

/// `floor(value * numerator / denominator)` without intermediate overflow.
///
/// Saturates at `u128::MAX`. Returns zero when `denominator` is zero.
pub fn mul_div_floor(value: u128, numerator: u128, denominator: u128) -> u128 {
    mul_div_rem(value, numerator, denominator).0
}

/// Quotient and remainder of `value * numerator / denominator`.
///
/// Splits `value` into quotient and remainder by `denominator` first, so the only
/// products formed are `q * numerator` and `r * numerator` with `r < denominator`.
/// The quotient saturates at `u128::MAX`. Returns `(0, 0)` when `denominator` is zero.
pub fn mul_div_rem(value: u128, numerator: u128, denominator: u128) -> (u128, u128) {
    if denominator == 0 {
        return (0, 0);
    }
    let q = value / denominator;
    let r = value % denominator;
    let whole = q.saturating_mul(numerator);
    let (part, rem) = match r.checked_mul(numerator) {
        Some(p) => (p / denominator, p % denominator),
        None => mul_div_wide(r, numerator, denominator),
    };
    (whole.saturating_add(part), rem)
}

/// Slow path for `a * b / d` with `a < d`: binary long multiplication keeping the
/// running product reduced modulo `d`. Returns quotient and remainder.
fn mul_div_wide(a: u128, b: u128, d: u128) -> (u128, u128) {
    let mut q: u128 = 0;
    let mut r: u128 = 0;
    for i in (0..128).rev() {
        q <<= 1;
        r = add_mod(r, r, d, &mut q);
        if (b >> i) & 1 == 1 {
            r = add_mod(r, a, d, &mut q);
        }
    }
    (q, r)
}

/// `(x + y) mod d` for `x, y < d`, bumping `q` when a multiple of `d` is carried out.
fn add_mod(x: u128, y: u128, d: u128, q: &mut u128) -> u128 {
    let (sum, carry) = x.overflowing_add(y);
    if carry || sum >= d {
        *q += 1;
        sum.wrapping_sub(d)
    } else {
        sum
    }
}
