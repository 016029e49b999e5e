//! Damage resolution channel
//!
//! Damage math runs on its own thread behind a request/response channel
//! pair. The caller sends a fully-assembled request and blocks on the
//! corresponding reply, so from the turn timeline's perspective resolution
//! is a suspension point, never parallel mutation: one in-flight request
//! per target at a time, results applied only by the requester.
//!
//! A closed channel means requested damage can no longer be reconciled with
//! applied damage, so it surfaces as a battle-halting error instead of a
//! retry.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::battle::unit::UnitStats;
use crate::core::error::{Result, TacticsError};
use crate::core::types::UnitId;

/// Wire contract: everything the resolver needs, snapshotted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageRequest {
    pub target_unit_id: UnitId,
    pub attacker_stats: UnitStats,
    pub target_stats: UnitStats,
    pub current_target_hp: i32,
    pub current_target_barrier: i32,
    pub max_barrier: i32,
    /// Fixed damage (status ticks) bypasses defense and mitigation
    pub fixed_damage: bool,
    pub pre_calculated_damage_roll: f32,
    /// Mitigation fraction from the modifier pipeline
    pub damage_reduction: f32,
}

/// Wire contract: the split between shield-absorbed and health-applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResult {
    pub target_unit_id: UnitId,
    pub new_hp: i32,
    pub new_barrier: i32,
    pub hp_damage_dealt: i32,
    pub barrier_damage_dealt: i32,
}

/// Pure damage math, run by the resolver task.
///
/// Defense subtraction (floored at zero), multiplicative mitigation, integer
/// floor, shield-first absorption, health floored at zero.
fn compute(request: &DamageRequest) -> DamageResult {
    let raw = request.pre_calculated_damage_roll;

    let mitigated = if request.fixed_damage {
        raw
    } else {
        let after_defense = (raw - request.target_stats.defense as f32).max(0.0);
        let mitigation = request.damage_reduction.clamp(0.0, 1.0);
        after_defense - after_defense * mitigation
    };

    let total = (mitigated.floor() as i32).max(0);

    let barrier = request.current_target_barrier.max(0);
    let hp = request.current_target_hp.max(0);

    let barrier_damage_dealt = total.min(barrier);
    let hp_damage_dealt = (total - barrier_damage_dealt).min(hp);

    DamageResult {
        target_unit_id: request.target_unit_id,
        new_hp: hp - hp_damage_dealt,
        new_barrier: barrier - barrier_damage_dealt,
        hp_damage_dealt,
        barrier_damage_dealt,
    }
}

struct DamageJob {
    request: DamageRequest,
    reply: oneshot::Sender<DamageResult>,
}

/// Handle to the off-thread damage resolver
#[derive(Debug)]
pub struct DamageChannel {
    tx: mpsc::Sender<DamageJob>,
    // Owns the resolver task; dropping the channel shuts it down
    _runtime: tokio::runtime::Runtime,
}

impl DamageChannel {
    pub fn spawn() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("damage-resolver")
            .build()?;

        let (tx, mut rx) = mpsc::channel::<DamageJob>(16);
        runtime.spawn(async move {
            while let Some(job) = rx.recv().await {
                let result = compute(&job.request);
                // A dropped reply handle means the requester is gone;
                // nothing left to reconcile on this side
                let _ = job.reply.send(result);
            }
        });

        Ok(Self { tx, _runtime: runtime })
    }

    /// Send a request and wait for its result.
    ///
    /// Blocks the calling (turn) thread; channel faults are critical.
    pub fn resolve(&self, request: DamageRequest) -> Result<DamageResult> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .blocking_send(DamageJob {
                request,
                reply: reply_tx,
            })
            .map_err(|_| TacticsError::ChannelClosed("damage request channel".into()))?;
        reply_rx
            .blocking_recv()
            .map_err(|_| TacticsError::ChannelClosed("damage response channel".into()))
    }
}
