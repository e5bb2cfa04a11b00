use sha2::{Digest, Sha256};

/// Label of the random stream that draws level colors and odd cells.
pub(crate) const LEVEL_STREAM: &str = "tint-tap/levels";
/// Label of the random stream that drives gimmick triggers and executions.
pub(crate) const GIMMICK_STREAM: &str = "tint-tap/gimmicks";

/// Derives an independent seed for a named random stream.
pub(crate) fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
