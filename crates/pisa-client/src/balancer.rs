//! Balancing session orchestrator.
//!
//! A [`Balancer`] owns at most one balancer session and drives the full
//! negotiation for each call:
//!
//! 1. resolve the strategy (fake input unless told otherwise)
//! 2. acquire the session, connecting on first use
//! 3. prepare the skeleton on snapshots of the caller's builder
//! 4. build and send the request, validate the reply and its request id
//! 5. decode the balanced transaction and bind it to the wallet
//! 6. recompute the script-data and auxiliary-data hashes
//!
//! Lifecycle:
//!
//! ```text
//! Idle ──connect──▶ Ready ⇄ RequestInFlight
//!                     │
//!                     ├──finalize──▶ Closing ──▶ Closed
//!                     └──transport failure──▶ Failed (terminal)
//! ```

use crate::config::{BalanceOptions, BalancerConfig};
use crate::error::BalanceError;
use futures::FutureExt;
use pisa_rpc::{parse_success, BalanceRequest, BalancerSession, SessionState};
use pisa_tx::builder::require_wallet;
use pisa_tx::{prepare_skeleton, repair_hashes, Transaction, TxBuilder, TxSignBuilder};
use pisa_types::{AssetUnit, BalanceMode, OutRef};
use std::any::Any;
use std::panic::AssertUnwindSafe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalancerState {
    /// No session opened yet.
    Idle,
    Ready,
    RequestInFlight,
    Closing,
    Closed,
    /// The transport failed. No further calls succeed.
    Failed,
}

enum Lifecycle {
    Idle,
    Open(BalancerSession),
    Failed(String),
    Closed,
}

/// Client for a Pisa balancer.
pub struct Balancer {
    config: BalancerConfig,
    lifecycle: Lifecycle,
}

impl Balancer {
    /// A balancer that connects on first use.
    pub fn new(config: BalancerConfig) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::Idle,
        }
    }

    /// A balancer with its session already open.
    pub async fn connect(config: BalancerConfig) -> Result<Self, BalanceError> {
        let mut balancer = Self::new(config);
        balancer.acquire().await?;
        Ok(balancer)
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    pub fn state(&self) -> BalancerState {
        match &self.lifecycle {
            Lifecycle::Idle => BalancerState::Idle,
            Lifecycle::Open(session) => match session.state() {
                SessionState::Ready => BalancerState::Ready,
                SessionState::InFlight => BalancerState::RequestInFlight,
                SessionState::Closing => BalancerState::Closing,
                SessionState::Closed => BalancerState::Closed,
                SessionState::Failed => BalancerState::Failed,
            },
            Lifecycle::Failed(_) => BalancerState::Failed,
            Lifecycle::Closed => BalancerState::Closed,
        }
    }

    /// Balance the transaction described by `builder` through the remote
    /// balancer and return it sign-ready, bound to the builder's wallet.
    ///
    /// The builder itself is never mutated. Every failure, a panic in a
    /// builder or wallet implementation included, comes back as a
    /// [`BalanceError`].
    pub async fn complete<B: TxBuilder>(
        &mut self,
        builder: &B,
        position: &OutRef,
        swap_assets: &[AssetUnit],
        options: BalanceOptions,
    ) -> Result<TxSignBuilder, BalanceError> {
        let outcome = AssertUnwindSafe(self.run(builder, position, swap_assets, options))
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(result) => result,
            Err(panic) => Err(BalanceError::Runtime(panic_message(panic).into())),
        };
        if let Err(e) = &result {
            log::warn!("balancing failed: {}", e);
        }
        result
    }

    /// Close the session. Idempotent. A failed balancer stays failed.
    pub async fn finalize(&mut self) {
        self.observe();
        match std::mem::replace(&mut self.lifecycle, Lifecycle::Closed) {
            Lifecycle::Open(session) => {
                session.close().await;
                // the peer may have dropped us while the close was queued
                if session.state() == SessionState::Failed {
                    self.lifecycle = Lifecycle::Failed("closed unexpectedly".to_string());
                }
            }
            Lifecycle::Failed(reason) => self.lifecycle = Lifecycle::Failed(reason),
            Lifecycle::Idle | Lifecycle::Closed => {}
        }
    }

    /// Open a session, balance once, and close the session again whatever
    /// the outcome.
    pub async fn complete_once<B: TxBuilder>(
        config: BalancerConfig,
        builder: &B,
        position: &OutRef,
        swap_assets: &[AssetUnit],
        options: BalanceOptions,
    ) -> Result<TxSignBuilder, BalanceError> {
        let mut balancer = Self::new(config);
        let result = balancer.complete(builder, position, swap_assets, options).await;
        balancer.finalize().await;
        result
    }

    async fn run<B: TxBuilder>(
        &mut self,
        builder: &B,
        position: &OutRef,
        swap_assets: &[AssetUnit],
        options: BalanceOptions,
    ) -> Result<TxSignBuilder, BalanceError> {
        let mode = BalanceMode::resolve(options.mode);
        require_wallet(builder)?;
        let params = self.config.skeleton;

        let session = self.acquire().await?;
        let skeleton =
            prepare_skeleton(builder, mode, options.change_address.as_deref(), &params).await?;

        let request = BalanceRequest::new(
            mode,
            position,
            swap_assets,
            skeleton.transaction.to_cbor_hex()?,
            &skeleton.wallet_address,
            &skeleton.change_address,
            options.collateral.as_ref(),
        );
        log::info!("sending {} request {}", mode, request.request_id);

        let sent = session.send(&request).await;
        let raw = match sent {
            Ok(raw) => raw,
            Err(e) => {
                self.observe();
                return Err(e.into());
            }
        };

        let balanced = parse_success(&raw)?;
        if let Err(e) = balanced.check_correlation(request.request_id) {
            log::warn!("discarding reply: {}", e);
            return Err(e.into());
        }

        let tx = Transaction::from_cbor_hex(&balanced.balanced_cbor).map_err(|e| {
            BalanceError::Protocol(format!("malformed balanced transaction: {}", e))
        })?;
        let bound = TxSignBuilder::new(skeleton.wallet.clone(), tx).complete().await?;
        let repaired = repair_hashes(bound.to_transaction(), builder.cost_models())?;
        log::info!("request {} balanced", request.request_id);

        Ok(TxSignBuilder::new(skeleton.wallet, repaired))
    }

    /// The open session, connecting first when idle.
    async fn acquire(&mut self) -> Result<&BalancerSession, BalanceError> {
        self.observe();
        if matches!(self.lifecycle, Lifecycle::Idle) {
            match BalancerSession::connect(&self.config.session).await {
                Ok(session) => self.lifecycle = Lifecycle::Open(session),
                Err(e) => {
                    let err = BalanceError::from(e);
                    self.lifecycle = Lifecycle::Failed(err.to_string());
                    return Err(err);
                }
            }
        }
        match &self.lifecycle {
            Lifecycle::Open(session) => Ok(session),
            Lifecycle::Failed(reason) => Err(BalanceError::Connection(reason.clone())),
            Lifecycle::Closed => Err(BalanceError::Connection("balancer already finalized".into())),
            Lifecycle::Idle => Err(BalanceError::Connection("no open session".into())),
        }
    }

    /// Move to `Failed` if the session died underneath us.
    fn observe(&mut self) {
        let reason = match &self.lifecycle {
            Lifecycle::Open(session) => match session.state() {
                SessionState::Failed => "closed unexpectedly",
                SessionState::Closed => "session closed after request timeout",
                _ => return,
            },
            _ => return,
        };
        log::warn!("balancer session failed: {}", reason);
        self.lifecycle = Lifecycle::Failed(reason.to_string());
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic with non-string payload".to_string()
    }
}
