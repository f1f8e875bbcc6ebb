use super::super::*;
use super::{ensure_owner, ensure_unpayable};

impl<'a, S: State, B: Bank> Layer<'a, S, B> {
    pub(in crate::layer) async fn handle_deposit(
        &mut self,
        public: &PublicKey,
        value: u64,
    ) -> anyhow::Result<Result<Vec<Event>, SpinError>> {
        if let Err(err) = ensure_owner(&self.owner, public) {
            return Ok(Err(err));
        }
        if value == 0 {
            return Ok(Err(SpinError::ZeroAmount));
        }

        let mut house = load_house(self).await?;
        house.balance = house.balance.saturating_add(value);
        let balance = house.balance;
        self.insert(Key::House, Value::House(house));

        tracing::info!(from = ?public, amount = value, balance, "deposit");
        Ok(Ok(vec![Event::Deposited {
            from: public.clone(),
            amount: value,
            balance,
        }]))
    }

    /// Bare top-up: any caller, any amount, folded into the bankroll so custody and the
    /// pool never drift apart.
    pub(in crate::layer) async fn handle_fund(
        &mut self,
        public: &PublicKey,
        value: u64,
    ) -> anyhow::Result<Result<Vec<Event>, SpinError>> {
        let mut house = load_house(self).await?;
        house.balance = house.balance.saturating_add(value);
        let balance = house.balance;
        self.insert(Key::House, Value::House(house));

        tracing::info!(from = ?public, amount = value, balance, "bankroll funded");
        Ok(Ok(vec![Event::Deposited {
            from: public.clone(),
            amount: value,
            balance,
        }]))
    }

    pub(in crate::layer) async fn handle_withdraw(
        &mut self,
        public: &PublicKey,
        value: u64,
        amount: u64,
    ) -> anyhow::Result<Result<Vec<Event>, SpinError>> {
        if let Err(err) = ensure_owner(&self.owner, public) {
            return Ok(Err(err));
        }
        if let Err(err) = ensure_unpayable(value) {
            return Ok(Err(err));
        }
        if amount == 0 {
            return Ok(Err(SpinError::ZeroAmount));
        }

        let mut house = load_house(self).await?;
        if amount > house.balance {
            return Ok(Err(SpinError::BankrollShort {
                required: amount,
                available: house.balance,
            }));
        }
        house.balance -= amount;
        let balance = house.balance;
        self.insert(Key::House, Value::House(house));

        // Transfer last: a refusal rejects the instruction and the overlay restore
        // undoes the decrement.
        if !self.bank.transfer(public, amount).await? {
            return Ok(Err(SpinError::TransferFailed { amount }));
        }

        tracing::info!(to = ?public, amount, balance, "withdrawal");
        Ok(Ok(vec![Event::Withdrawn {
            to: public.clone(),
            amount,
            balance,
        }]))
    }

    pub(in crate::layer) async fn handle_pause(
        &mut self,
        public: &PublicKey,
        value: u64,
    ) -> anyhow::Result<Result<Vec<Event>, SpinError>> {
        if let Err(err) = ensure_owner(&self.owner, public) {
            return Ok(Err(err));
        }
        if let Err(err) = ensure_unpayable(value) {
            return Ok(Err(err));
        }

        let mut house = load_house(self).await?;
        if house.paused {
            return Ok(Err(SpinError::Paused));
        }
        house.paused = true;
        self.insert(Key::House, Value::House(house));

        tracing::info!(owner = ?public, "paused");
        Ok(Ok(vec![Event::PauseChanged { paused: true }]))
    }

    pub(in crate::layer) async fn handle_unpause(
        &mut self,
        public: &PublicKey,
        value: u64,
    ) -> anyhow::Result<Result<Vec<Event>, SpinError>> {
        if let Err(err) = ensure_owner(&self.owner, public) {
            return Ok(Err(err));
        }
        if let Err(err) = ensure_unpayable(value) {
            return Ok(Err(err));
        }

        let mut house = load_house(self).await?;
        if !house.paused {
            return Ok(Err(SpinError::NotPaused));
        }
        house.paused = false;
        self.insert(Key::House, Value::House(house));

        tracing::info!(owner = ?public, "unpaused");
        Ok(Ok(vec![Event::PauseChanged { paused: false }]))
    }

    pub(in crate::layer) async fn handle_emergency_withdraw(
        &mut self,
        public: &PublicKey,
        value: u64,
    ) -> anyhow::Result<Result<Vec<Event>, SpinError>> {
        if let Err(err) = ensure_owner(&self.owner, public) {
            return Ok(Err(err));
        }
        if let Err(err) = ensure_unpayable(value) {
            return Ok(Err(err));
        }

        let mut house = load_house(self).await?;
        if !house.paused {
            return Ok(Err(SpinError::NotPaused));
        }

        // Drain full custody, not just the accounted bankroll, so value forced into
        // custody outside any instruction is recovered too.
        let held = self.bank.held().await?;
        if held > 0 && !self.bank.transfer(public, held).await? {
            return Ok(Err(SpinError::TransferFailed { amount: held }));
        }
        house.balance = 0;
        self.insert(Key::House, Value::House(house));

        tracing::info!(to = ?public, amount = held, "emergency withdrawal");
        Ok(Ok(vec![Event::Withdrawn {
            to: public.clone(),
            amount: held,
            balance: 0,
        }]))
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::*;
    use crate::bank::MockBank;
    use crate::mocks::{create_account_keypair, create_context, create_network_keypair};
    use crate::state::{load_house, Memory};
    use commonware_runtime::deterministic::Runner;
    use commonware_runtime::Runner as _;
    use wheelhouse_types::spin::{
        ERROR_BANKROLL_SHORT, ERROR_NOT_OWNER, ERROR_NOT_PAUSED, ERROR_PAUSED,
        ERROR_TRANSFER_FAILED, ERROR_UNEXPECTED_VALUE, ERROR_ZERO_AMOUNT, UNIT,
    };

    fn events_of(outputs: &[Output]) -> Vec<Event> {
        outputs
            .iter()
            .filter_map(|output| match output {
                Output::Event(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    fn rejection_codes(outputs: &[Output]) -> Vec<u8> {
        events_of(outputs)
            .into_iter()
            .filter_map(|event| match event {
                Event::SpinRejected { error_code, .. } => Some(error_code),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_deposit_and_fund_grow_the_pool() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let mut bank = MockBank::default();
            let (network_secret, _) = create_network_keypair();
            let (owner_signer, owner) = create_account_keypair(0);
            let (alice_signer, alice) = create_account_keypair(1);
            bank.credit(&owner, 10 * UNIT);
            bank.credit(&alice, 5 * UNIT);

            let ctx = create_context(&network_secret, 1, 100);
            let mut layer = Layer::new(&state, &mut bank, owner.clone(), ctx);
            let (outputs, _) = layer
                .execute(vec![
                    Transaction::sign(&owner_signer, 0, 10 * UNIT, Instruction::Deposit),
                    Transaction::sign(&alice_signer, 0, 5 * UNIT, Instruction::Fund),
                    // Zero-value funding is a no-op top-up but still observable.
                    Transaction::sign(&alice_signer, 1, 0, Instruction::Fund),
                ])
                .await
                .unwrap();

            let events = events_of(&outputs);
            assert_eq!(
                events[0],
                Event::Deposited {
                    from: owner.clone(),
                    amount: 10 * UNIT,
                    balance: 10 * UNIT,
                }
            );
            assert_eq!(
                events[1],
                Event::Deposited {
                    from: alice.clone(),
                    amount: 5 * UNIT,
                    balance: 15 * UNIT,
                }
            );
            assert_eq!(
                events[2],
                Event::Deposited {
                    from: alice.clone(),
                    amount: 0,
                    balance: 15 * UNIT,
                }
            );

            let house = load_house(&layer).await.unwrap();
            assert_eq!(house.balance, 15 * UNIT);
            drop(layer);
            assert_eq!(bank.held().await.unwrap(), 15 * UNIT);
        });
    }

    #[test]
    fn test_deposit_rejects_zero_value() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let mut bank = MockBank::default();
            let (network_secret, _) = create_network_keypair();
            let (owner_signer, owner) = create_account_keypair(0);

            let ctx = create_context(&network_secret, 1, 100);
            let mut layer = Layer::new(&state, &mut bank, owner, ctx);
            let (outputs, _) = layer
                .execute(vec![Transaction::sign(
                    &owner_signer,
                    0,
                    0,
                    Instruction::Deposit,
                )])
                .await
                .unwrap();

            assert_eq!(rejection_codes(&outputs), vec![ERROR_ZERO_AMOUNT]);
            assert_eq!(load_house(&layer).await.unwrap().balance, 0);
        });
    }

    #[test]
    fn test_withdraw_moves_balance_to_owner() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let mut bank = MockBank::default();
            let (network_secret, _) = create_network_keypair();
            let (owner_signer, owner) = create_account_keypair(0);
            bank.credit(&owner, 10 * UNIT);

            let ctx = create_context(&network_secret, 1, 100);
            let mut layer = Layer::new(&state, &mut bank, owner.clone(), ctx);
            let (outputs, _) = layer
                .execute(vec![
                    Transaction::sign(&owner_signer, 0, 10 * UNIT, Instruction::Deposit),
                    Transaction::sign(
                        &owner_signer,
                        1,
                        0,
                        Instruction::Withdraw { amount: 4 * UNIT },
                    ),
                ])
                .await
                .unwrap();

            let events = events_of(&outputs);
            assert_eq!(
                events[1],
                Event::Withdrawn {
                    to: owner.clone(),
                    amount: 4 * UNIT,
                    balance: 6 * UNIT,
                }
            );

            let house = load_house(&layer).await.unwrap();
            assert_eq!(house.balance, 6 * UNIT);
            drop(layer);
            assert_eq!(bank.held().await.unwrap(), 6 * UNIT);
            assert_eq!(bank.balance(&owner), 4 * UNIT);
        });
    }

    #[test]
    fn test_withdraw_guards() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let mut bank = MockBank::default();
            let (network_secret, _) = create_network_keypair();
            let (owner_signer, owner) = create_account_keypair(0);
            let (alice_signer, _) = create_account_keypair(1);
            bank.credit(&owner, 11 * UNIT);

            let ctx = create_context(&network_secret, 1, 100);
            let mut layer = Layer::new(&state, &mut bank, owner, ctx);
            let (outputs, _) = layer
                .execute(vec![
                    Transaction::sign(&owner_signer, 0, 10 * UNIT, Instruction::Deposit),
                    // Over the balance.
                    Transaction::sign(
                        &owner_signer,
                        1,
                        0,
                        Instruction::Withdraw { amount: 11 * UNIT },
                    ),
                    // Zero amount.
                    Transaction::sign(&owner_signer, 2, 0, Instruction::Withdraw { amount: 0 }),
                    // Not the owner.
                    Transaction::sign(&alice_signer, 0, 0, Instruction::Withdraw { amount: UNIT }),
                    // Withdrawals are not payable.
                    Transaction::sign(
                        &owner_signer,
                        3,
                        UNIT,
                        Instruction::Withdraw { amount: UNIT },
                    ),
                    Transaction::sign(
                        &owner_signer,
                        4,
                        0,
                        Instruction::Withdraw { amount: UNIT },
                    ),
                ])
                .await
                .unwrap();

            // The final well-formed withdrawal goes through; everything before it is a
            // rejection that leaves the balance alone.
            assert_eq!(
                rejection_codes(&outputs),
                vec![
                    ERROR_BANKROLL_SHORT,
                    ERROR_ZERO_AMOUNT,
                    ERROR_NOT_OWNER,
                    ERROR_UNEXPECTED_VALUE
                ]
            );
            assert_eq!(load_house(&layer).await.unwrap().balance, 9 * UNIT);
        });
    }

    #[test]
    fn test_withdraw_transfer_refusal_reverts() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let mut bank = MockBank::default();
            let (network_secret, _) = create_network_keypair();
            let (owner_signer, owner) = create_account_keypair(0);
            bank.credit(&owner, 10 * UNIT);
            bank.refuse(&owner);

            let ctx = create_context(&network_secret, 1, 100);
            let mut layer = Layer::new(&state, &mut bank, owner.clone(), ctx);
            let (outputs, _) = layer
                .execute(vec![
                    Transaction::sign(&owner_signer, 0, 10 * UNIT, Instruction::Deposit),
                    Transaction::sign(
                        &owner_signer,
                        1,
                        0,
                        Instruction::Withdraw { amount: 4 * UNIT },
                    ),
                ])
                .await
                .unwrap();

            assert_eq!(rejection_codes(&outputs), vec![ERROR_TRANSFER_FAILED]);
            let house = load_house(&layer).await.unwrap();
            assert_eq!(house.balance, 10 * UNIT);
            drop(layer);
            assert_eq!(bank.held().await.unwrap(), 10 * UNIT);
            assert_eq!(bank.balance(&owner), 0);
        });
    }

    #[test]
    fn test_pause_flips_are_owner_only_and_observable() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let mut bank = MockBank::default();
            let (network_secret, _) = create_network_keypair();
            let (owner_signer, owner) = create_account_keypair(0);
            let (alice_signer, _) = create_account_keypair(1);

            let ctx = create_context(&network_secret, 1, 100);
            let mut layer = Layer::new(&state, &mut bank, owner, ctx);
            let (outputs, _) = layer
                .execute(vec![
                    Transaction::sign(&alice_signer, 0, 0, Instruction::Pause),
                    Transaction::sign(&owner_signer, 0, 0, Instruction::Pause),
                    // Already paused.
                    Transaction::sign(&owner_signer, 1, 0, Instruction::Pause),
                    Transaction::sign(&owner_signer, 2, 0, Instruction::Unpause),
                    // Already active.
                    Transaction::sign(&owner_signer, 3, 0, Instruction::Unpause),
                ])
                .await
                .unwrap();

            let events = events_of(&outputs);
            assert!(matches!(
                events[0],
                Event::SpinRejected {
                    error_code: ERROR_NOT_OWNER,
                    ..
                }
            ));
            assert_eq!(events[1], Event::PauseChanged { paused: true });
            assert!(matches!(
                events[2],
                Event::SpinRejected {
                    error_code: ERROR_PAUSED,
                    ..
                }
            ));
            assert_eq!(events[3], Event::PauseChanged { paused: false });
            assert!(matches!(
                events[4],
                Event::SpinRejected {
                    error_code: ERROR_NOT_PAUSED,
                    ..
                }
            ));
            assert!(!load_house(&layer).await.unwrap().paused);
        });
    }

    #[test]
    fn test_emergency_withdraw_requires_pause_and_drains_custody() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            let mut bank = MockBank::default();
            let (network_secret, _) = create_network_keypair();
            let (owner_signer, owner) = create_account_keypair(0);
            bank.credit(&owner, 11 * UNIT);
            // Custody beyond the accounted bankroll, as if value was forced in.
            bank.force_custody(2 * UNIT);

            let ctx = create_context(&network_secret, 1, 100);
            let mut layer = Layer::new(&state, &mut bank, owner.clone(), ctx);
            let (outputs, _) = layer
                .execute(vec![
                    Transaction::sign(&owner_signer, 0, 10 * UNIT, Instruction::Deposit),
                    // Not paused yet.
                    Transaction::sign(&owner_signer, 1, 0, Instruction::EmergencyWithdraw),
                    Transaction::sign(&owner_signer, 2, 0, Instruction::Pause),
                    // Attached value is refused even when paused.
                    Transaction::sign(&owner_signer, 3, UNIT, Instruction::EmergencyWithdraw),
                    Transaction::sign(&owner_signer, 4, 0, Instruction::EmergencyWithdraw),
                ])
                .await
                .unwrap();

            assert_eq!(
                rejection_codes(&outputs),
                vec![ERROR_NOT_PAUSED, ERROR_UNEXPECTED_VALUE]
            );
            let events = events_of(&outputs);
            assert_eq!(
                events[events.len() - 1],
                Event::Withdrawn {
                    to: owner.clone(),
                    amount: 12 * UNIT,
                    balance: 0,
                }
            );

            let house = load_house(&layer).await.unwrap();
            assert_eq!(house.balance, 0);
            assert!(house.paused);
            drop(layer);
            assert_eq!(bank.held().await.unwrap(), 0);
            // 11 to start, 10 deposited, 12 drained back (the deposit plus the forced 2).
            assert_eq!(bank.balance(&owner), 13 * UNIT);
        });
    }
}
