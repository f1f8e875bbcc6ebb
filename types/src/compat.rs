#![cfg(test)]
use crate::execution::{Event, Instruction, Key, Output, Transaction, Value};
use crate::spin::{House, PlayerRecord, SPIN_COST};
use commonware_codec::{Encode, ReadExt};
use commonware_cryptography::{ed25519::PrivateKey, sha256::Sha256, Digestible, Hasher, Signer};

#[test]
fn instruction_encoding_is_stable() {
    assert_eq!(Instruction::Deposit.encode().as_ref(), &[10u8]);
    assert_eq!(
        Instruction::Withdraw { amount: 100 }.encode().as_ref(),
        &[11u8, 0, 0, 0, 0, 0, 0, 0, 100]
    );
    assert_eq!(Instruction::Fund.encode().as_ref(), &[12u8]);
    assert_eq!(Instruction::QuickSpin.encode().as_ref(), &[15u8]);
    assert_eq!(Instruction::Pause.encode().as_ref(), &[16u8]);
    assert_eq!(Instruction::Unpause.encode().as_ref(), &[17u8]);
    assert_eq!(Instruction::EmergencyWithdraw.encode().as_ref(), &[18u8]);

    let secret_hash = Sha256::hash(b"secret");
    let mut expected = vec![13u8];
    expected.extend_from_slice(secret_hash.as_ref());
    assert_eq!(
        Instruction::CommitSpin { secret_hash }.encode().as_ref(),
        expected.as_slice()
    );
}

#[test]
fn key_encoding_is_stable() {
    let player = PrivateKey::from_seed(1).public_key();

    assert_eq!(Key::House.encode().as_ref(), &[1u8]);

    let mut expected = vec![0u8];
    expected.extend_from_slice(player.as_ref());
    assert_eq!(Key::Account(player.clone()).encode().as_ref(), expected.as_slice());

    expected[0] = 2;
    assert_eq!(Key::Player(player.clone()).encode().as_ref(), expected.as_slice());

    expected[0] = 3;
    assert_eq!(Key::Commit(player).encode().as_ref(), expected.as_slice());
}

#[test]
fn value_checkpoint_encoding_is_stable() {
    assert_eq!(
        Value::Checkpoint { height: 7, start: 9 }.encode().as_ref(),
        &[4u8, 0, 0, 0, 0, 0, 0, 0, 7, 0, 0, 0, 0, 0, 0, 0, 9]
    );
}

#[test]
fn event_pause_encoding_is_stable() {
    assert_eq!(
        Event::PauseChanged { paused: true }.encode().as_ref(),
        &[25u8, 1]
    );
    assert_eq!(
        Event::PauseChanged { paused: false }.encode().as_ref(),
        &[25u8, 0]
    );
}

#[test]
fn event_rejection_message_is_bounded_on_decode() {
    let player = PrivateKey::from_seed(1).public_key();
    let event = Event::SpinRejected {
        player,
        error_code: 3,
        message: "x".repeat(300),
    };

    let encoded = event.encode();
    assert!(matches!(
        Event::read(&mut &encoded[..]),
        Err(commonware_codec::Error::Invalid(_, _))
    ));
}

#[test]
fn transaction_roundtrip_and_verification() {
    let private = PrivateKey::from_seed(1);
    let tx = Transaction::sign(&private, 0, SPIN_COST, Instruction::QuickSpin);
    assert!(tx.verify());

    let encoded = tx.encode();
    let decoded = Transaction::read(&mut &encoded[..]).unwrap();
    assert_eq!(tx, decoded);
    assert!(decoded.verify());

    // Any signed-over field invalidates the signature.
    let mut tampered = tx.clone();
    tampered.value = SPIN_COST + 1;
    assert!(!tampered.verify());

    let mut tampered = tx.clone();
    tampered.nonce = 1;
    assert!(!tampered.verify());

    let mut tampered = tx;
    tampered.instruction = Instruction::Fund;
    assert!(!tampered.verify());
}

#[test]
fn transaction_digest_excludes_signature() {
    let private = PrivateKey::from_seed(1);
    let other = PrivateKey::from_seed(2);

    let tx = Transaction::sign(&private, 4, 0, Instruction::Pause);
    let unrelated = Transaction::sign(&other, 4, 0, Instruction::Pause);

    // Swapping in foreign signature bytes leaves the digest unchanged.
    let mut resigned = tx.clone();
    resigned.signature = unrelated.signature.clone();
    assert_eq!(tx.digest(), resigned.digest());

    // A different signer changes the digest.
    assert_ne!(tx.digest(), unrelated.digest());
}

#[test]
fn output_roundtrip() {
    let private = PrivateKey::from_seed(1);
    let player = private.public_key();

    let outputs = [
        Output::Event(Event::SpinResolved {
            player,
            wager: SPIN_COST,
            prize: 0,
            draw: 123,
            timestamp: 1_700_000_000,
        }),
        Output::Transaction(Transaction::sign(&private, 0, 0, Instruction::Pause)),
        Output::Checkpoint {
            height: 1,
            start: 0,
        },
    ];

    for output in outputs {
        let encoded = output.encode();
        let decoded = Output::read(&mut &encoded[..]).unwrap();
        assert_eq!(output, decoded);
    }
}

#[test]
fn state_value_roundtrip() {
    let values = [
        Value::House(House {
            balance: 100,
            nonce: 1,
            paused: false,
            total_spins: 2,
            total_wagered: 3,
            total_paid_out: 4,
        }),
        Value::Player(PlayerRecord {
            last_spin: 5,
            spins: 6,
            winnings: 7,
        }),
    ];

    for value in values {
        let encoded = value.encode();
        let decoded = Value::read(&mut &encoded[..]).unwrap();
        assert_eq!(value, decoded);
    }
}
