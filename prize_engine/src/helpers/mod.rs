//! Small helpers shared by the engine: voucher code generation and the weighted draw.
use rand::Rng;

/// The voucher code space. Codes are zero-padded 4-digit strings, "0000" through "9999".
pub const CODE_SPACE: i64 = 10_000;

/// Generates a random voucher code in the configured code space.
pub fn generate_code<R: Rng>(rng: &mut R) -> String {
    format!("{:04}", rng.gen_range(0..CODE_SPACE))
}

/// Picks an index from `weights` with probability proportional to its weight.
///
/// Negative weights are treated as zero. When the total weight is zero, the choice falls back to a
/// uniform pick over all indices. Returns `None` only for an empty slice.
pub fn weighted_choice<R: Rng>(weights: &[f64], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let clamped = weights.iter().map(|w| w.max(0.0)).collect::<Vec<f64>>();
    let total = clamped.iter().sum::<f64>();
    if total <= 0.0 {
        return Some(rng.gen_range(0..weights.len()));
    }
    let mut pick = rng.gen_range(0.0..total);
    for (i, w) in clamped.iter().enumerate() {
        if pick < *w {
            return Some(i);
        }
        pick -= w;
    }
    // Floating point edge: pick landed on the upper bound.
    Some(weights.len() - 1)
}

/// Prize names are machine keys: lowercase alphanumerics and underscores, 1 to 64 chars.
pub fn is_valid_prize_name(name: &str) -> bool {
    !name.is_empty() &&
        name.len() <= 64 &&
        name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
