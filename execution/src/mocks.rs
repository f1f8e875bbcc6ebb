//! Keypairs, beacons, and databases for driving blocks in tests.

use crate::{
    state_transition::{execute_state_transition, StateTransitionResult},
    Adb, Bank,
};
use commonware_codec::Encode;
use commonware_consensus::types::{Epoch, Round, View};
use commonware_cryptography::{
    bls12381::primitives::{group::Private, ops, variant::MinSig},
    ed25519::{PrivateKey, PublicKey},
    sha256::Sha256,
    Hasher, PrivateKeyExt, Signer,
};
use commonware_runtime::{buffer::PoolRef, Clock, Metrics, Spawner, Storage};
use commonware_storage::{
    adb::{self, keyless},
    translator::EightCap,
};
use commonware_utils::{union, NZUsize, NZU64};
use rand::{rngs::StdRng, SeedableRng};
use wheelhouse_types::{
    execution::{BlockContext, Output, Seed, Transaction, Value},
    Identity, NAMESPACE,
};

/// Seconds of wall clock attributed to each consensus view in tests.
pub const SECS_PER_VIEW: u64 = 3;

/// Creates a master keypair for BLS signatures used in consensus
pub fn create_network_keypair() -> (Private, Identity) {
    let mut rng = StdRng::seed_from_u64(0);
    ops::keypair::<_, MinSig>(&mut rng)
}

/// Creates an account keypair for Ed25519 signatures used by users
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::from_rng(&mut rng);
    let public = private.public_key();
    (private, public)
}

fn seed_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, b"_SEED")
}

/// Creates a test seed for consensus
pub fn create_seed(network_secret: &Private, view: u64) -> Seed {
    let seed_namespace = seed_namespace(NAMESPACE);
    let round = Round::new(Epoch::zero(), View::new(view));
    let message = round.encode();
    Seed::new(
        round,
        ops::sign_message::<MinSig>(network_secret, Some(&seed_namespace), &message),
    )
}

/// Creates the execution inputs for one block.
///
/// Heights start at 1; the parent digest is derived from the previous height and the
/// timestamp advances [SECS_PER_VIEW] seconds per view.
pub fn create_context(network_secret: &Private, height: u64, view: u64) -> BlockContext {
    let parent = Sha256::hash(&(height - 1).to_be_bytes());
    BlockContext::new(
        height,
        view * SECS_PER_VIEW,
        parent,
        create_seed(network_secret, view),
    )
}

/// Creates state and events databases for testing
pub async fn create_adbs<E: Spawner + Metrics + Storage + Clock>(
    context: &E,
) -> (Adb<E, EightCap>, keyless::Keyless<E, Output, Sha256>) {
    let buffer_pool = PoolRef::new(NZUsize!(1024), NZUsize!(1024));

    let state = Adb::init(
        context.with_label("state"),
        adb::any::variable::Config {
            mmr_journal_partition: String::from("state-mmr-journal"),
            mmr_metadata_partition: String::from("state-mmr-metadata"),
            mmr_items_per_blob: NZU64!(1024),
            mmr_write_buffer: NZUsize!(1024),
            log_journal_partition: String::from("state-log-journal"),
            log_items_per_section: NZU64!(1024),
            log_write_buffer: NZUsize!(1024),
            log_compression: None,
            log_codec_config: (),
            locations_journal_partition: String::from("state-locations-journal"),
            locations_items_per_blob: NZU64!(1024),
            translator: EightCap,
            thread_pool: None,
            buffer_pool: buffer_pool.clone(),
        },
    )
    .await
    .expect("Failed to initialize state ADB");

    let events = keyless::Keyless::<_, Output, Sha256>::init(
        context.with_label("events"),
        keyless::Config {
            mmr_journal_partition: String::from("events-mmr-journal"),
            mmr_metadata_partition: String::from("events-mmr-metadata"),
            mmr_items_per_blob: NZU64!(1024),
            mmr_write_buffer: NZUsize!(1024),
            log_journal_partition: String::from("events-log-journal"),
            log_items_per_section: NZU64!(1024),
            log_write_buffer: NZUsize!(1024),
            log_compression: None,
            log_codec_config: (),
            locations_journal_partition: String::from("events-locations-journal"),
            locations_items_per_blob: NZU64!(1024),
            locations_write_buffer: NZUsize!(1024),
            thread_pool: None,
            buffer_pool,
        },
    )
    .await
    .expect("Failed to initialize events Keyless");

    (state, events)
}

/// Executes the next block against the databases and syncs them.
pub async fn execute_block<E: Spawner + Metrics + Storage + Clock, B: Bank>(
    network_secret: &Private,
    owner: &PublicKey,
    state: &mut Adb<E, EightCap>,
    events: &mut keyless::Keyless<E, Output, Sha256>,
    bank: &mut B,
    view: u64,
    txs: Vec<Transaction>,
) -> StateTransitionResult {
    // Get height from state
    let current_height = state
        .get_metadata()
        .await
        .unwrap()
        .and_then(|(_, v)| match v {
            Some(Value::Checkpoint { height, start: _ }) => Some(height),
            _ => None,
        })
        .unwrap_or(0);
    let height = current_height + 1;

    let ctx = create_context(network_secret, height, view);
    let result = execute_state_transition(state, events, owner.clone(), ctx, txs, bank)
        .await
        .expect("Failed to execute state transition");

    // Sync results
    state.sync().await.unwrap();
    events.sync().await.unwrap();

    result
}
