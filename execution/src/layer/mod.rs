use anyhow::{Context as _, Result};
use commonware_cryptography::{
    ed25519::PublicKey,
    sha256::Digest,
};
use std::collections::BTreeMap;
use tracing::debug;
use wheelhouse_types::{
    execution::{BlockContext, Event, Instruction, Key, Output, Transaction, Value},
    spin::{
        commitment, secret_digest, CommitState, House, PlayerRecord, SpinCommit, SpinError,
        COOLDOWN_SECS, MAX_PRIZE, REVEAL_DELAY, SPIN_COST,
    },
};

use crate::bank::Bank;
use crate::draw::{prize_for_draw, quick_draw, reveal_draw};
use crate::state::{
    load_account, load_commit, load_house, load_player, validate_and_increment_nonce,
    PrepareError, State, Status,
};

mod handlers;

/// Per-block execution overlay.
///
/// Buffers every write in `pending` until [`Layer::commit`]; reads fall through to the
/// backing state. Each instruction runs to completion behind `&mut self`, so no
/// instruction can observe another's partial effects and nothing can re-enter the layer
/// mid-instruction. The bank is an external sink: it never calls back in.
pub struct Layer<'a, S: State, B: Bank> {
    state: &'a S,
    bank: &'a mut B,
    pending: BTreeMap<Key, Status>,

    owner: PublicKey,
    ctx: BlockContext,
}

impl<'a, S: State, B: Bank> Layer<'a, S, B> {
    pub fn new(state: &'a S, bank: &'a mut B, owner: PublicKey, ctx: BlockContext) -> Self {
        Self {
            state,
            bank,
            pending: BTreeMap::new(),

            owner,
            ctx,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        let mut account = load_account(self, &transaction.public)
            .await
            .map_err(PrepareError::State)?;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    async fn dispatch(
        &mut self,
        public: &PublicKey,
        value: u64,
        instruction: &Instruction,
    ) -> Result<Result<Vec<Event>, SpinError>> {
        match instruction {
            Instruction::Deposit => self.handle_deposit(public, value).await,
            Instruction::Withdraw { amount } => {
                self.handle_withdraw(public, value, *amount).await
            }
            Instruction::Fund => self.handle_fund(public, value).await,
            Instruction::CommitSpin { secret_hash } => {
                self.handle_commit_spin(public, value, secret_hash).await
            }
            Instruction::RevealSpin { secret } => {
                self.handle_reveal_spin(public, value, secret).await
            }
            Instruction::QuickSpin => self.handle_quick_spin(public, value).await,
            Instruction::Pause => self.handle_pause(public, value).await,
            Instruction::Unpause => self.handle_unpause(public, value).await,
            Instruction::EmergencyWithdraw => self.handle_emergency_withdraw(public, value).await,
        }
    }

    /// Apply one instruction as an atomic unit.
    ///
    /// A domain rejection restores the overlay to its pre-instruction shape (the consumed
    /// envelope nonce stands), refunds any attached value, and surfaces the failure as an
    /// `Event::SpinRejected` in the journal.
    async fn apply(&mut self, transaction: &Transaction) -> Result<Vec<Event>> {
        let snapshot = self.pending.clone();
        match self
            .dispatch(
                &transaction.public,
                transaction.value,
                &transaction.instruction,
            )
            .await?
        {
            Ok(events) => Ok(events),
            Err(error) => {
                self.pending = snapshot;
                if transaction.value > 0 {
                    self.bank
                        .refund(&transaction.public, transaction.value)
                        .await
                        .context("refund rejected instruction")?;
                }
                debug!(
                    public = ?transaction.public,
                    code = error.code(),
                    %error,
                    "instruction rejected"
                );
                Ok(vec![Event::SpinRejected {
                    player: transaction.public.clone(),
                    error_code: error.code(),
                    message: error.to_string(),
                }])
            }
        }
    }

    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> Result<(Vec<Output>, BTreeMap<PublicKey, u64>)> {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            if !tx.verify() {
                debug!(public = ?tx.public, nonce = tx.nonce, "invalid signature; dropping transaction");
                continue;
            }
            let prior = self.pending.clone();
            match self.prepare(&tx).await {
                Ok(()) => {}
                Err(PrepareError::NonceMismatch { expected, got }) => {
                    debug!(
                        public = ?tx.public,
                        expected,
                        got,
                        "nonce mismatch; dropping transaction"
                    );
                    continue;
                }
                Err(PrepareError::State(err)) => {
                    return Err(err).context("state error during prepare");
                }
            }
            if tx.value > 0
                && !self
                    .bank
                    .collect(&tx.public, tx.value)
                    .await
                    .context("collect attached value")?
            {
                self.pending = prior;
                debug!(
                    public = ?tx.public,
                    value = tx.value,
                    "attached value not covered; dropping transaction"
                );
                continue;
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));
            outputs.extend(self.apply(&tx).await?.into_iter().map(Output::Event));
            outputs.push(Output::Transaction(tx));
        }

        Ok((outputs, processed_nonces))
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State, B: Bank> State for Layer<'a, S, B> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await?,
        })
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.pending.insert(key, Status::Update(value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.pending.insert(key.clone(), Status::Delete);
        Ok(())
    }
}
