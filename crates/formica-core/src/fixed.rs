use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display/FFI, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Round to the nearest integer, matching the display convention for
/// pheromone levels and route cost comparison.
#[inline]
pub fn round_to_i64(v: Fixed64) -> i64 {
    v.round().to_num::<i64>()
}

/// Deterministic square root for Fixed64, used for Euclidean distances.
///
/// Computes the integer square root of the raw value shifted into Q64.64,
/// which yields the Q32.32 root exactly (floor). Negative or zero input
/// returns zero.
pub fn sqrt(v: Fixed64) -> Fixed64 {
    if v <= Fixed64::ZERO {
        return Fixed64::ZERO;
    }
    // sqrt(bits * 2^32 * 2^32) = sqrt(v) * 2^32, i.e. the Q32.32 root.
    let n = (v.to_bits() as u128) << 32;
    let mut x = 1u128 << (128 - n.leading_zeros()).div_ceil(2);
    loop {
        let y = (x + n / x) >> 1;
        if y >= x {
            break;
        }
        x = y;
    }
    Fixed64::from_bits(x as i64)
}
