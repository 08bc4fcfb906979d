use super::sizes;

/// Value that makes `bytes` followed by it sum to zero modulo 256.
pub fn compute(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    0u8.wrapping_sub(sum)
}

/// True iff the first 128 bytes of `block` sum to zero modulo 256.
///
/// Blocks shorter than a full EDID block never validate.
pub fn validate(block: &[u8]) -> bool {
    if block.len() < sizes::BLOCK {
        return false;
    }
    block[..sizes::BLOCK].iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) == 0
}
