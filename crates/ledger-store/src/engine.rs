//! The transaction engine — the unified twelve-step pipeline behind
//! every money movement: validate everything into a staged, in-memory
//! set of mutations, then flush them sequentially into the store under
//! the locks acquired for the whole call. There's no named staging
//! struct because each operation only ever stages one transaction and
//! its postings, never a batch — the local `postings`/`tx` values built
//! up before `append_transaction` are enough.

use std::sync::Arc;

use tracing::{info, warn};

use ledger_core::{
    Account, AccountId, AccountType, AlertKind, Config, FraudContext, FraudOutcome, LedgerError,
    LimitKind, Metrics, Money, OperationType, PixKey, PixKeyType, Posting, Transaction, TxId,
};
use ledger_core::{AlertRouter, FraudEngine, OtpVerifier};

use crate::idempotency::IdempotencyCache;
use crate::lock::LockManager;
use crate::store::{LedgerStore, StatementFilters};

/// Everything the engine needs beyond the store: the collaborators
/// injected by the caller (§6.2) and its own concurrency primitives.
pub struct TransactionEngine {
    store: Arc<LedgerStore>,
    locks: LockManager,
    idempotency_cache: IdempotencyCache,
    config: Config,
    fraud_engine: Arc<dyn FraudEngine>,
    otp_verifier: Arc<dyn OtpVerifier>,
    alert_router: Arc<dyn AlertRouter>,
    metrics: Arc<Metrics>,
}

/// Step-up material supplied for a debit (§4.9 step 6): a TOTP code, an
/// unused backup code, or both — either one satisfies the gate.
#[derive(Clone, Debug, Default)]
pub struct StepUp {
    pub otp: Option<String>,
    pub backup_code: Option<String>,
}

/// Request-scoped extras common to every write operation.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub fraud_ctx: Option<FraudContext>,
    pub step_up: StepUp,
}

enum Outcome {
    Fresh(Transaction),
    IdempotentReplay(Transaction),
}

impl TransactionEngine {
    pub fn new(
        store: Arc<LedgerStore>,
        config: Config,
        fraud_engine: Arc<dyn FraudEngine>,
        otp_verifier: Arc<dyn OtpVerifier>,
        alert_router: Arc<dyn AlertRouter>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            locks: LockManager::new(),
            idempotency_cache: IdempotencyCache::new(std::time::Duration::from_secs(
                config.idempotency_ttl_secs.max(0) as u64,
            )),
            config,
            fraud_engine,
            otp_verifier,
            alert_router,
            metrics,
        }
    }

    /// Shared handle for the node binary's integrity monitor and the
    /// RPC status surface (§6.3) to read alongside the engine's own counters.
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Looks up the treasury account, auto-provisioning it on first use
    /// (§4.9 "Treasury account").
    fn treasury_account(&self, now: ledger_core::Timestamp) -> Result<Account, LedgerError> {
        let _ = now;
        if let Some(acc) = self.store.find_treasury_account()? {
            return Ok(acc);
        }
        let treasury = Account::new_treasury(AccountId(0));
        self.store.create_account(treasury)
    }

    // ── Shared pipeline steps ─────────────────────────────────────────────────

    /// Steps 1–2: authoritative idempotency check against the store, then
    /// the non-authoritative cache probe for an in-flight conflict.
    fn idempotency_precheck(
        &self,
        account_id: AccountId,
        idempotency_key: &str,
    ) -> Result<Option<Transaction>, LedgerError> {
        if let Some(existing) = self.store.find_by_idempotency(account_id, idempotency_key)? {
            return Ok(Some(existing));
        }
        if self
            .idempotency_cache
            .get(account_id, idempotency_key)
            .is_some()
        {
            return Err(LedgerError::InFlightConflict);
        }
        Ok(None)
    }

    /// Step 3: the optional fraud hook.
    fn fraud_gate(&self, ctx: &RequestContext) -> Result<(), LedgerError> {
        let Some(fraud_ctx) = &ctx.fraud_ctx else {
            return Ok(());
        };
        let outcome = self.fraud_engine.evaluate(fraud_ctx);
        self.metrics.record_fraud_outcome(outcome);
        match outcome {
            FraudOutcome::Allow => Ok(()),
            FraudOutcome::Verify => {
                if ctx.step_up.otp.is_some() {
                    Ok(())
                } else {
                    Err(LedgerError::FraudVerificationRequired)
                }
            }
            FraudOutcome::Block => {
                self.alert_router.notify(
                    AlertKind::FraudBlocked,
                    serde_json::json!({ "reason": "fraud_engine_block" }),
                );
                Err(LedgerError::FraudBlocked)
            }
        }
    }

    /// Step 5: reject if any locked account is not active.
    fn require_active(&self, account: &Account) -> Result<(), LedgerError> {
        if account.is_active() {
            Ok(())
        } else {
            Err(LedgerError::AccountNotActive(account.id))
        }
    }

    /// Step 6 (debit side only): KYC, per-operation limit cap, step-up MFA.
    fn policy_gates(
        &self,
        debit_account: &Account,
        amount: Money,
        limit_kind: LimitKind,
        ctx: &RequestContext,
        now: ledger_core::Timestamp,
    ) -> Result<(), LedgerError> {
        let Some(user_id) = debit_account.user_id else {
            // The treasury account is never the debit side of a
            // user-initiated operation, so this path is unreachable in
            // practice; guard anyway rather than unwrap.
            return Ok(());
        };

        if amount >= self.config.kyc_required_threshold {
            let status = self
                .store
                .get_kyc_profile(user_id)?
                .map(|p| p.status)
                .unwrap_or(ledger_core::KycStatus::Pending);
            if status != ledger_core::KycStatus::Verified {
                return Err(LedgerError::KycRequired);
            }
        }

        if let Some(limits) = self.store.get_limit_config(user_id)? {
            let limit = match limit_kind {
                LimitKind::Withdrawal => limits.withdrawal_limit,
                LimitKind::InternalTransfer => limits.internal_transfer_limit,
                LimitKind::Ted => limits.ted_limit,
                LimitKind::Pix => limits.pix_per_tx_limit,
            };
            if !limit.is_zero() && amount > limit {
                return Err(LedgerError::LimitExceeded {
                    limit_kind,
                    limit,
                    requested: amount,
                });
            }
        }

        if amount >= self.config.mfa_threshold {
            let user = self
                .store
                .get_user(user_id)?
                .ok_or(LedgerError::AccountNotFound(debit_account.id))?;
            if !user.mfa_enabled {
                return Err(LedgerError::MfaSetupRequired);
            }

            let otp_ok = matches!(
                &ctx.step_up.otp,
                Some(code) if self.otp_verifier.validate_second_factor(user_id, code)
            );
            // A matched backup code is consumed atomically — `consume_backup_code`
            // only returns `true` the first time a given code is presented, so
            // reusing it never satisfies the gate a second time (§8 scenario 5).
            let backup_code_ok = match &ctx.step_up.backup_code {
                Some(code) => {
                    let hash = ledger_crypto::sha256_hex(code);
                    self.store.consume_backup_code(user_id, &hash, now)?
                }
                None => false,
            };
            if !otp_ok && !backup_code_ok {
                return Err(LedgerError::MfaRequired);
            }
        }

        Ok(())
    }

    /// Step 7: `available = derived_balance − blocked_balance +
    /// overdraft_limit` must be at least `amount`.
    fn require_available(&self, account: &Account, amount: Money) -> Result<(), LedgerError> {
        let derived = self.store.derive_balance(account.id)?;
        let available = account.available(derived);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Steps 8–11: allocate sequence + hash, build the transaction and its
    /// postings, append, update cached balances, and retry once by
    /// idempotency re-resolution on a uniqueness conflict.
    fn allocate_and_append(
        &self,
        account_id: AccountId,
        idempotency_key: &str,
        amount: Money,
        operation_type: OperationType,
        description: Option<String>,
        now: ledger_core::Timestamp,
        postings_for: impl Fn(TxId) -> Vec<(AccountId, Money)>,
        balance_deltas: &[(AccountId, Money)],
    ) -> Result<Outcome, LedgerError> {
        let tx_id = self.store.next_tx_id()?;
        let sequence = self.store.allocate_sequence()?;
        let prev_hash = if sequence > 1 {
            self.store
                .get_transaction_at_sequence(sequence - 1)?
                .map(|t| t.record_hash)
                .unwrap_or_default()
        } else {
            String::new()
        };

        let record_hash = ledger_crypto::record_hash(
            sequence,
            account_id,
            amount,
            operation_type,
            description.as_deref(),
            &ledger_core::timestamp_to_rfc3339(now),
            &prev_hash,
        );

        let tx = Transaction {
            id: tx_id,
            account_id,
            idempotency_key: idempotency_key.to_string(),
            amount,
            operation_type,
            timestamp: now,
            sequence,
            prev_hash,
            record_hash,
            description,
        };

        let raw_postings: Vec<Posting> = postings_for(tx_id)
            .into_iter()
            .map(|(acc, amt)| Posting {
                id: 0,
                transaction_id: tx_id,
                account_id: acc,
                amount: amt,
                timestamp: now,
            })
            .collect();

        let postings_sum = ledger_core::transaction::postings_sum(&raw_postings);
        if !postings_sum.is_zero() {
            return Err(LedgerError::PostingImbalance(format!(
                "tx {tx_id:?}: postings sum to {postings_sum}, expected zero"
            )));
        }

        self.idempotency_cache
            .insert(account_id, idempotency_key, tx_id);

        match self.store.append_transaction(tx, raw_postings) {
            Ok(committed) => {
                for (acc_id, delta) in balance_deltas {
                    if let Some(mut account) = self.store.get_account(*acc_id)? {
                        account.balance = account.balance + *delta;
                        self.store.put_account(&account)?;
                    }
                }
                Ok(Outcome::Fresh(committed))
            }
            Err(LedgerError::InFlightConflict) => {
                match self.store.find_by_idempotency(account_id, idempotency_key)? {
                    Some(existing) => Ok(Outcome::IdempotentReplay(existing)),
                    None => Err(LedgerError::InFlightConflict),
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Step 12: AML alerting for large transactions. Best-effort; never
    /// fails the already-committed operation.
    fn post_commit_alert(&self, tx: &Transaction) {
        if tx.amount >= self.config.aml_large_tx_threshold {
            self.alert_router.notify(
                AlertKind::AmlLargeTransaction,
                serde_json::json!({
                    "transaction_id": tx.id.0,
                    "account_id": tx.account_id.0,
                    "amount": tx.amount.to_canonical_string(),
                }),
            );
        }
    }

    // ── Public operations ─────────────────────────────────────────────────────

    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount: Money,
        idempotency_key: &str,
        ctx: RequestContext,
        now: ledger_core::Timestamp,
    ) -> Result<Transaction, LedgerError> {
        amount.require_positive().map_err(|_| LedgerError::NonPositiveAmount)?;

        if let Some(existing) = self.idempotency_precheck(account_id, idempotency_key)? {
            return Ok(existing);
        }
        self.fraud_gate(&ctx)?;

        let treasury = self.treasury_account(now)?;
        let guard = self
            .locks
            .lock_accounts_ascending(&[account_id, treasury.id])
            .await;
        let _guard = guard;

        let account = self
            .store
            .get_account(account_id)?
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        self.require_active(&account)?;

        let outcome = self.allocate_and_append(
            account_id,
            idempotency_key,
            amount,
            OperationType::Deposit,
            None,
            now,
            |_| vec![(account_id, amount), (treasury.id, amount.neg())],
            &[(account_id, amount), (treasury.id, amount.neg())],
        )?;

        match outcome {
            Outcome::Fresh(tx) => {
                self.metrics.record_transaction(tx.operation_type);
                self.post_commit_alert(&tx);
                info!(tx_id = tx.id.0, "deposit committed");
                Ok(tx)
            }
            Outcome::IdempotentReplay(tx) => Ok(tx),
        }
    }

    pub async fn withdraw(
        &self,
        account_id: AccountId,
        amount: Money,
        idempotency_key: &str,
        ctx: RequestContext,
        now: ledger_core::Timestamp,
    ) -> Result<Transaction, LedgerError> {
        amount.require_positive().map_err(|_| LedgerError::NonPositiveAmount)?;

        if let Some(existing) = self.idempotency_precheck(account_id, idempotency_key)? {
            return Ok(existing);
        }
        self.fraud_gate(&ctx)?;

        let treasury = self.treasury_account(now)?;
        let _guard = self
            .locks
            .lock_accounts_ascending(&[account_id, treasury.id])
            .await;

        let account = self
            .store
            .get_account(account_id)?
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        self.require_active(&account)?;
        self.policy_gates(&account, amount, LimitKind::Withdrawal, &ctx, now)?;
        self.require_available(&account, amount)?;

        let outcome = self.allocate_and_append(
            account_id,
            idempotency_key,
            amount,
            OperationType::Withdraw,
            None,
            now,
            |_| vec![(account_id, amount.neg()), (treasury.id, amount)],
            &[(account_id, amount.neg()), (treasury.id, amount)],
        )?;

        match outcome {
            Outcome::Fresh(tx) => {
                self.metrics.record_transaction(tx.operation_type);
                self.post_commit_alert(&tx);
                info!(tx_id = tx.id.0, "withdraw committed");
                Ok(tx)
            }
            Outcome::IdempotentReplay(tx) => Ok(tx),
        }
    }

    pub async fn internal_transfer(
        &self,
        from_id: AccountId,
        to_id: AccountId,
        amount: Money,
        idempotency_key: &str,
        ctx: RequestContext,
        now: ledger_core::Timestamp,
    ) -> Result<Transaction, LedgerError> {
        amount.require_positive().map_err(|_| LedgerError::NonPositiveAmount)?;
        if from_id == to_id {
            return Err(LedgerError::SameAccount);
        }

        if let Some(existing) = self.idempotency_precheck(from_id, idempotency_key)? {
            return Ok(existing);
        }
        self.fraud_gate(&ctx)?;

        let _guard = self.locks.lock_accounts_ascending(&[from_id, to_id]).await;

        let from_account = self
            .store
            .get_account(from_id)?
            .ok_or(LedgerError::AccountNotFound(from_id))?;
        let to_account = self
            .store
            .get_account(to_id)?
            .ok_or(LedgerError::AccountNotFound(to_id))?;
        self.require_active(&from_account)?;
        self.require_active(&to_account)?;
        self.policy_gates(&from_account, amount, LimitKind::InternalTransfer, &ctx, now)?;
        self.require_available(&from_account, amount)?;

        let outcome = self.allocate_and_append(
            from_id,
            idempotency_key,
            amount,
            OperationType::Transfer,
            None,
            now,
            |_| vec![(from_id, amount.neg()), (to_id, amount)],
            &[(from_id, amount.neg()), (to_id, amount)],
        )?;

        match outcome {
            Outcome::Fresh(tx) => {
                self.metrics.record_transaction(tx.operation_type);
                self.post_commit_alert(&tx);
                info!(tx_id = tx.id.0, "internal transfer committed");
                Ok(tx)
            }
            Outcome::IdempotentReplay(tx) => Ok(tx),
        }
    }

    /// Resolves `pix_key` to a destination account, then reduces to an
    /// internal transfer using the same pipeline, with an added per-tx and
    /// per-day Pix cap pre-check (§4.9 "Pix routing").
    pub async fn pix_transfer(
        &self,
        from_id: AccountId,
        pix_key: &str,
        amount: Money,
        idempotency_key: &str,
        ctx: RequestContext,
        now: ledger_core::Timestamp,
    ) -> Result<Transaction, LedgerError> {
        amount.require_positive().map_err(|_| LedgerError::NonPositiveAmount)?;

        if let Some(existing) = self.idempotency_precheck(from_id, idempotency_key)? {
            return Ok(existing);
        }
        self.fraud_gate(&ctx)?;

        let key = self
            .store
            .find_pix_key(pix_key)?
            .ok_or_else(|| LedgerError::PixKeyNotFound(pix_key.to_string()))?;
        let to_id = key.account_id;
        if to_id == from_id {
            return Err(LedgerError::SameAccount);
        }

        let _guard = self.locks.lock_accounts_ascending(&[from_id, to_id]).await;

        let from_account = self
            .store
            .get_account(from_id)?
            .ok_or(LedgerError::AccountNotFound(from_id))?;
        let to_account = self
            .store
            .get_account(to_id)?
            .ok_or(LedgerError::AccountNotFound(to_id))?;
        self.require_active(&from_account)?;
        self.require_active(&to_account)?;
        self.policy_gates(&from_account, amount, LimitKind::Pix, &ctx, now)?;
        self.require_available(&from_account, amount)?;

        if let Some(user_id) = from_account.user_id {
            if let Some(limits) = self.store.get_limit_config(user_id)? {
                let utc_date = ledger_core::timestamp_to_rfc3339(now)[..10].to_string();
                let mut usage = self.store.get_pix_daily_usage(from_id, &utc_date)?;
                let projected = usage.total + amount;
                if !limits.pix_daily_limit.is_zero() && projected > limits.pix_daily_limit {
                    return Err(LedgerError::LimitExceeded {
                        limit_kind: LimitKind::Pix,
                        limit: limits.pix_daily_limit,
                        requested: projected,
                    });
                }
                usage.total = projected;
                self.store.put_pix_daily_usage(from_id, &usage)?;
            }
        }

        let outcome = self.allocate_and_append(
            from_id,
            idempotency_key,
            amount,
            OperationType::Pix,
            Some(format!("pix:{pix_key}")),
            now,
            |_| vec![(from_id, amount.neg()), (to_id, amount)],
            &[(from_id, amount.neg()), (to_id, amount)],
        )?;

        match outcome {
            Outcome::Fresh(tx) => {
                self.metrics.record_transaction(tx.operation_type);
                self.post_commit_alert(&tx);
                info!(tx_id = tx.id.0, "pix transfer committed");
                Ok(tx)
            }
            Outcome::IdempotentReplay(tx) => Ok(tx),
        }
    }

    /// `get_balance`: derives from postings and cross-checks against the
    /// cached value, logging a warning on mismatch rather than trusting the
    /// cache blindly (resolves Open Question 2, §4.7).
    pub fn get_balance(&self, account_id: AccountId) -> Result<Money, LedgerError> {
        let account = self
            .store
            .get_account(account_id)?
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        let derived = self.store.derive_balance(account_id)?;
        if derived != account.balance {
            warn!(
                account_id = account_id.0,
                cached = %account.balance,
                derived = %derived,
                "cached balance diverged from derived balance"
            );
        }
        Ok(derived)
    }

    pub fn get_statement(
        &self,
        account_id: AccountId,
        filters: &StatementFilters,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.store.list_statement(account_id, filters)
    }

    pub fn verify_integrity(&self) -> Result<crate::store::IntegrityReport, LedgerError> {
        self.store.verify_integrity()
    }

    /// Total derived balance across every account (§6.3 "total balance gauge").
    pub fn total_balance(&self) -> Result<Money, LedgerError> {
        self.store.total_balance()
    }

    /// `create_pix_key` (§4.9 "[NEW] Pix key registration & lookup"):
    /// validates `key_value` format per `key_type`, rejects duplicates, and
    /// records the mapping.
    pub fn create_pix_key(
        &self,
        account_id: AccountId,
        key_type: PixKeyType,
        key_value: String,
    ) -> Result<PixKey, LedgerError> {
        validate_pix_key_format(key_type, &key_value)?;
        let key = PixKey {
            key_value,
            key_type,
            account_id,
        };
        self.store.insert_pix_key(&key)?;
        Ok(key)
    }

    pub fn resolve_pix_key(&self, key_value: &str) -> Result<AccountId, LedgerError> {
        self.store
            .find_pix_key(key_value)?
            .map(|k| k.account_id)
            .ok_or_else(|| LedgerError::PixKeyNotFound(key_value.to_string()))
    }
}

fn validate_pix_key_format(key_type: PixKeyType, key_value: &str) -> Result<(), LedgerError> {
    let ok = match key_type {
        PixKeyType::Cpf => key_value.len() == 11 && key_value.chars().all(|c| c.is_ascii_digit()),
        PixKeyType::Email => key_value.contains('@'),
        PixKeyType::Phone => {
            key_value.starts_with('+') && key_value[1..].chars().all(|c| c.is_ascii_digit())
        }
        PixKeyType::Evp => uuid_like(key_value),
    };
    if ok {
        Ok(())
    } else {
        Err(LedgerError::InvalidPixKeyFormat(key_value.to_string()))
    }
}

fn uuid_like(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    parts.len() == 5
        && parts
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(part, len)| part.len() == len && part.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{AccountStatus, AllowAllFraudEngine, StaticOtpVerifier, TracingAlertRouter};

    fn test_engine() -> (TransactionEngine, Arc<LedgerStore>) {
        let store = Arc::new(LedgerStore::open_temporary().unwrap());
        let engine = TransactionEngine::new(
            store.clone(),
            Config::default(),
            Arc::new(AllowAllFraudEngine),
            Arc::new(StaticOtpVerifier::new("123456")),
            Arc::new(TracingAlertRouter),
            Arc::new(Metrics::new()),
        );
        (engine, store)
    }

    fn open_account(store: &LedgerStore, number: &str) -> Account {
        store
            .create_account(Account {
                id: AccountId(0),
                account_number: number.to_string(),
                user_id: None,
                balance: Money::ZERO,
                blocked_balance: Money::ZERO,
                overdraft_limit: Money::ZERO,
                account_type: AccountType::Checking,
                status: AccountStatus::Active,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn deposit_then_withdraw_round_trips_balance() {
        let (engine, store) = test_engine();
        let acc = open_account(&store, "1-1");
        engine
            .deposit(
                acc.id,
                Money::from_decimal_str("100.00").unwrap(),
                "dep-1",
                RequestContext::default(),
                0,
            )
            .await
            .unwrap();
        engine
            .withdraw(
                acc.id,
                Money::from_decimal_str("40.00").unwrap(),
                "wd-1",
                RequestContext::default(),
                1,
            )
            .await
            .unwrap();
        assert_eq!(
            engine.get_balance(acc.id).unwrap().to_canonical_string(),
            "60.00"
        );
    }

    #[tokio::test]
    async fn repeated_deposit_with_same_idempotency_key_is_a_no_op() {
        let (engine, store) = test_engine();
        let acc = open_account(&store, "1-1");
        let amount = Money::from_decimal_str("10.00").unwrap();
        let first = engine
            .deposit(acc.id, amount, "dup", RequestContext::default(), 0)
            .await
            .unwrap();
        let second = engine
            .deposit(acc.id, amount, "dup", RequestContext::default(), 0)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(
            engine.get_balance(acc.id).unwrap().to_canonical_string(),
            "10.00"
        );
    }

    #[tokio::test]
    async fn withdraw_beyond_available_balance_is_rejected() {
        let (engine, store) = test_engine();
        let acc = open_account(&store, "1-1");
        let err = engine
            .withdraw(
                acc.id,
                Money::from_decimal_str("1.00").unwrap(),
                "wd-1",
                RequestContext::default(),
                0,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    }

    #[tokio::test]
    async fn transfer_to_self_is_rejected() {
        let (engine, store) = test_engine();
        let acc = open_account(&store, "1-1");
        let err = engine
            .internal_transfer(
                acc.id,
                acc.id,
                Money::from_decimal_str("1.00").unwrap(),
                "tx-1",
                RequestContext::default(),
                0,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::SameAccount));
    }

    #[tokio::test]
    async fn pix_transfer_resolves_key_and_moves_funds() {
        let (engine, store) = test_engine();
        let from = open_account(&store, "1-1");
        let to = open_account(&store, "2-2");
        engine
            .create_pix_key(to.id, PixKeyType::Email, "dest@example.com".to_string())
            .unwrap();
        engine
            .deposit(
                from.id,
                Money::from_decimal_str("50.00").unwrap(),
                "seed",
                RequestContext::default(),
                0,
            )
            .await
            .unwrap();
        engine
            .pix_transfer(
                from.id,
                "dest@example.com",
                Money::from_decimal_str("20.00").unwrap(),
                "pix-1",
                RequestContext::default(),
                1,
            )
            .await
            .unwrap();
        assert_eq!(
            engine.get_balance(to.id).unwrap().to_canonical_string(),
            "20.00"
        );
    }

    #[test]
    fn pix_key_format_validation_rejects_malformed_cpf() {
        assert!(validate_pix_key_format(PixKeyType::Cpf, "123").is_err());
        assert!(validate_pix_key_format(PixKeyType::Cpf, "12345678901").is_ok());
    }

    #[tokio::test]
    async fn backup_code_satisfies_step_up_once_then_is_exhausted() {
        use ledger_core::{BackupCode, User};

        let (engine, store) = test_engine();
        let user = store
            .create_user(User {
                id: ledger_core::UserId(0),
                email: "alice@example.com".to_string(),
                cpf_hash: "hash".to_string(),
                cpf_ciphertext: "v1:stub".to_string(),
                cpf_last4: "1234".to_string(),
                password_hash: "hash".to_string(),
                mfa_secret: Some("seed".to_string()),
                mfa_enabled: true,
                is_anonymized: false,
            })
            .unwrap();
        let mut acc = open_account(&store, "1-1");
        acc.user_id = Some(user.id);
        store.put_account(&acc).unwrap();

        let code_hash = ledger_crypto::sha256_hex("one-time-code");
        store
            .add_backup_code(&BackupCode {
                user_id: user.id,
                code_hash,
                used_at: None,
            })
            .unwrap();

        engine
            .deposit(
                acc.id,
                Money::from_decimal_str("5000.00").unwrap(),
                "seed-deposit",
                RequestContext::default(),
                0,
            )
            .await
            .unwrap();

        let ctx = RequestContext {
            fraud_ctx: None,
            step_up: StepUp {
                otp: None,
                backup_code: Some("one-time-code".to_string()),
            },
        };
        engine
            .withdraw(
                acc.id,
                Money::from_decimal_str("1500.00").unwrap(),
                "wd-backup-1",
                ctx.clone(),
                1,
            )
            .await
            .unwrap();
        assert_eq!(
            engine.get_balance(acc.id).unwrap().to_canonical_string(),
            "3500.00"
        );

        let err = engine
            .withdraw(
                acc.id,
                Money::from_decimal_str("1500.00").unwrap(),
                "wd-backup-2",
                ctx,
                2,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::MfaRequired));
    }
}
