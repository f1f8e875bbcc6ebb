use super::super::*;
use super::ensure_unpayable;

impl<'a, S: State, B: Bank> Layer<'a, S, B> {
    /// Shared admission control for both spin protocols: exact payment, house
    /// solvency, then per-player cooldown.
    ///
    /// Solvency is checked against the pre-wager balance, so every admitted
    /// spin can pay [MAX_PRIZE] even before its wager joins the pool.
    async fn admit_spin(
        &self,
        public: &PublicKey,
        value: u64,
        house: &House,
    ) -> anyhow::Result<Result<PlayerRecord, SpinError>> {
        if value != SPIN_COST {
            return Ok(Err(SpinError::WrongWager {
                sent: value,
                required: SPIN_COST,
            }));
        }
        if house.balance < MAX_PRIZE {
            return Ok(Err(SpinError::BankrollShort {
                required: MAX_PRIZE,
                available: house.balance,
            }));
        }
        let player = load_player(self, public).await?;
        let elapsed = self.ctx.timestamp.saturating_sub(player.last_spin);
        if elapsed < COOLDOWN_SECS {
            return Ok(Err(SpinError::Cooldown {
                remaining_secs: COOLDOWN_SECS - elapsed,
            }));
        }
        Ok(Ok(player))
    }

    /// Settle a draw against the bankroll and fold it into the running statistics.
    ///
    /// Solvency is re-checked against the exact prize; a shortfall rejects the
    /// instruction. A refused payout does not: the bankroll keeps the prize and
    /// the spin resolves as unpaid. Returns the amount actually paid.
    async fn settle_prize(
        &mut self,
        public: &PublicKey,
        house: &mut House,
        player: &mut PlayerRecord,
        draw: u64,
    ) -> anyhow::Result<Result<u64, SpinError>> {
        let prize = prize_for_draw(draw);
        let mut paid = 0;
        if prize > 0 {
            if house.balance < prize {
                return Ok(Err(SpinError::BankrollShort {
                    required: prize,
                    available: house.balance,
                }));
            }
            house.balance -= prize;
            house.total_paid_out = house.total_paid_out.saturating_add(prize);
            player.winnings = player.winnings.saturating_add(prize);
            if self.bank.transfer(public, prize).await? {
                paid = prize;
            } else {
                house.balance = house.balance.saturating_add(prize);
                house.total_paid_out = house.total_paid_out.saturating_sub(prize);
                player.winnings = player.winnings.saturating_sub(prize);
                tracing::debug!(player = ?public, prize, "payout refused; spin resolves unpaid");
            }
        }
        house.total_spins = house.total_spins.saturating_add(1);
        player.spins = player.spins.saturating_add(1);
        Ok(Ok(paid))
    }

    /// First half of a commit-reveal spin: escrow the wager and bind the
    /// player's hashed secret to commit-time state.
    pub(in crate::layer) async fn handle_commit_spin(
        &mut self,
        public: &PublicKey,
        value: u64,
        secret_hash: &Digest,
    ) -> anyhow::Result<Result<Vec<Event>, SpinError>> {
        let mut house = load_house(self).await?;
        if house.paused {
            return Ok(Err(SpinError::Paused));
        }
        let mut player = match self.admit_spin(public, value, &house).await? {
            Ok(player) => player,
            Err(err) => return Ok(Err(err)),
        };
        if let Some(CommitState::Committed(_)) = load_commit(self, public).await? {
            return Ok(Err(SpinError::CommitPending));
        }

        // The wager joins the pool and the cooldown opens regardless of the
        // eventual outcome.
        house.balance = house.balance.saturating_add(value);
        house.total_wagered = house.total_wagered.saturating_add(value);
        player.last_spin = self.ctx.timestamp;

        // The commitment binds the pre-advance counter.
        let nonce = house.nonce;
        house.nonce = house.nonce.saturating_add(1);
        let bound = commitment(secret_hash, public, self.ctx.timestamp, nonce);
        let record = SpinCommit {
            commitment: bound,
            height: self.ctx.height,
            timestamp: self.ctx.timestamp,
            nonce,
            wager: value,
        };

        self.insert(Key::House, Value::House(house));
        self.insert(Key::Player(public.clone()), Value::Player(player));
        self.insert(
            Key::Commit(public.clone()),
            Value::Commit(CommitState::Committed(record)),
        );

        tracing::info!(
            player = ?public,
            commitment = ?bound,
            height = self.ctx.height,
            wager = value,
            "spin committed"
        );
        Ok(Ok(vec![Event::SpinCommitted {
            player: public.clone(),
            commitment: bound,
            height: self.ctx.height,
            timestamp: self.ctx.timestamp,
            wager: value,
        }]))
    }

    pub(in crate::layer) async fn handle_reveal_spin(
        &mut self,
        public: &PublicKey,
        value: u64,
        secret: &Digest,
    ) -> anyhow::Result<Result<Vec<Event>, SpinError>> {
        if let Err(err) = ensure_unpayable(value) {
            return Ok(Err(err));
        }
        let mut house = load_house(self).await?;
        if house.paused {
            return Ok(Err(SpinError::Paused));
        }
        let record = match load_commit(self, public).await? {
            None => return Ok(Err(SpinError::NoCommit)),
            Some(CommitState::Revealed(_)) => return Ok(Err(SpinError::AlreadyRevealed)),
            Some(CommitState::Committed(record)) => record,
        };
        let wager = record.wager;

        let matured = record.height.saturating_add(REVEAL_DELAY);
        if self.ctx.height < matured {
            return Ok(Err(SpinError::RevealTooEarly {
                blocks_remaining: matured - self.ctx.height,
            }));
        }
        let expected = commitment(&secret_digest(secret), public, record.timestamp, record.nonce);
        if expected != record.commitment {
            return Ok(Err(SpinError::SecretMismatch));
        }

        let draw = reveal_draw(
            &self.ctx.seed,
            &self.ctx.parent,
            public,
            secret,
            &record.commitment,
        );
        let mut player = load_player(self, public).await?;
        let paid = match self
            .settle_prize(public, &mut house, &mut player, draw)
            .await?
        {
            Ok(paid) => paid,
            Err(err) => return Ok(Err(err)),
        };

        self.insert(Key::House, Value::House(house));
        self.insert(Key::Player(public.clone()), Value::Player(player));
        self.insert(
            Key::Commit(public.clone()),
            Value::Commit(CommitState::Revealed(record)),
        );

        tracing::info!(player = ?public, draw, prize = paid, wager, "spin revealed");
        Ok(Ok(vec![Event::SpinResolved {
            player: public.clone(),
            wager,
            prize: paid,
            draw,
            timestamp: self.ctx.timestamp,
        }]))
    }

    pub(in crate::layer) async fn handle_quick_spin(
        &mut self,
        public: &PublicKey,
        value: u64,
    ) -> anyhow::Result<Result<Vec<Event>, SpinError>> {
        let mut house = load_house(self).await?;
        if house.paused {
            return Ok(Err(SpinError::Paused));
        }
        let mut player = match self.admit_spin(public, value, &house).await? {
            Ok(player) => player,
            Err(err) => return Ok(Err(err)),
        };

        house.balance = house.balance.saturating_add(value);
        house.total_wagered = house.total_wagered.saturating_add(value);
        player.last_spin = self.ctx.timestamp;

        // The draw observes the post-advance counter and the balance with the
        // wager already folded in.
        house.nonce = house.nonce.saturating_add(1);
        let draw = quick_draw(
            &self.ctx.seed,
            &self.ctx.parent,
            public,
            self.ctx.timestamp,
            house.nonce,
            house.balance,
        );
        let paid = match self
            .settle_prize(public, &mut house, &mut player, draw)
            .await?
        {
            Ok(paid) => paid,
            Err(err) => return Ok(Err(err)),
        };

        self.insert(Key::House, Value::House(house));
        self.insert(Key::Player(public.clone()), Value::Player(player));

        tracing::info!(player = ?public, draw, prize = paid, "quick spin resolved");
        Ok(Ok(vec![Event::SpinResolved {
            player: public.clone(),
            wager: value,
            prize: paid,
            draw,
            timestamp: self.ctx.timestamp,
        }]))
    }
}
