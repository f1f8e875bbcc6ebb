//! Draw derivation for spin resolution.
//!
//! Everything here is a pure function of data that ends up public (consensus seed, block
//! digest, event fields, revealed secrets), so any third party can recompute a draw and
//! check the prize it implies. The reveal path consults a beacon that postdates the
//! commit; the quick path is weaker by construction since all of its inputs are visible
//! to the block proposer.

use commonware_codec::Encode;
use commonware_cryptography::{
    ed25519::PublicKey,
    sha256::{Digest, Sha256},
    Hasher,
};
use commonware_utils::{modulo, union};
use wheelhouse_types::{execution::Seed, spin::DRAW_SPAN, NAMESPACE};

pub use wheelhouse_types::spin::{commitment, prize_for_draw, secret_digest, tier_for_draw};

const REVEAL_SUFFIX: &[u8] = b"_REVEAL";
const QUICK_SUFFIX: &[u8] = b"_QUICK";

/// Derive the draw for a revealed commit.
///
/// Binds the per-view beacon and parent digest (both unknown at commit time) to the
/// revealed secret and the stored commitment, then reduces onto `0..DRAW_SPAN`.
pub fn reveal_draw(
    seed: &Seed,
    parent: &Digest,
    player: &PublicKey,
    secret: &Digest,
    commitment: &Digest,
) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(&union(NAMESPACE, REVEAL_SUFFIX));
    hasher.update(seed.encode().as_ref());
    hasher.update(parent.as_ref());
    hasher.update(player.as_ref());
    hasher.update(secret.as_ref());
    hasher.update(commitment.as_ref());
    modulo(hasher.finalize().as_ref(), DRAW_SPAN)
}

/// Derive the draw for a single-transaction quick spin from same-block entropy.
///
/// `nonce` is the house entropy counter after it was advanced for this spin and
/// `balance` the house balance with the wager already folded in.
pub fn quick_draw(
    seed: &Seed,
    parent: &Digest,
    player: &PublicKey,
    timestamp: u64,
    nonce: u64,
    balance: u64,
) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(&union(NAMESPACE, QUICK_SUFFIX));
    hasher.update(seed.encode().as_ref());
    hasher.update(parent.as_ref());
    hasher.update(player.as_ref());
    hasher.update(&timestamp.to_be_bytes());
    hasher.update(&nonce.to_be_bytes());
    hasher.update(&balance.to_be_bytes());
    modulo(hasher.finalize().as_ref(), DRAW_SPAN)
}
