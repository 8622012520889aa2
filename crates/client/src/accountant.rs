//! Payment accounting for blob dispersals.
//!
//! The accountant decides how each blob is paid for: bandwidth is drawn from
//! a prepaid reservation's period bins when one covers the request, otherwise
//! the blob is charged against the account's on-demand deposit by advancing a
//! cumulative wei counter. Every successful allocation returns a [`Commit`]
//! that undoes the mutation if the network submission fails, and a sync from
//! the server's payment-state snapshot runs before each dispersal so the
//! local counter recovers from drift.

use alloy::primitives::U256;
use eigenda_core::{PeriodRecord, QuorumId, Reservation};
use std::collections::BTreeMap;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Bins per reservation: the current period plus two pre-allocated future
/// periods that absorb overflow.
pub const NUM_BINS: usize = 3;

/// Static pricing parameters, seeded from the network table and refreshed
/// from the server's global params on every sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentParams {
    /// Wei per symbol for on-demand payments.
    pub price_per_symbol: u64,
    /// Minimum symbols charged per blob.
    pub min_num_symbols: u64,
    /// Reservation period length in seconds.
    pub reservation_period_interval: u64,
}

/// Errors from payment allocation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountantError {
    /// no reservation covers the request and the deposit cannot absorb it
    #[error(
        "insufficient funds: no active reservation covers the request and the \
         on-demand deposit cannot absorb {cost} wei"
    )]
    InsufficientFunds { cost: U256 },
    /// the quorum is excluded from on-demand payments
    #[error("quorum {0} does not support on-demand payment")]
    OnDemandNotSupported(QuorumId),
}

/// How a dispersal is paid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payment {
    /// Bandwidth came out of reservation bins; the wire payment is empty.
    Reservation,
    /// On-demand: the new cumulative total for the payment header.
    OnDemand { total: U256 },
}

impl Payment {
    /// The cumulative payment value to put in the payment header.
    pub fn cumulative_payment(&self) -> U256 {
        match self {
            Self::Reservation => U256::ZERO,
            Self::OnDemand { total } => *total,
        }
    }
}

/// Undo token for one allocation. Hand it back to [`Accountant::rollback`]
/// if the submission the allocation paid for does not go through. At most one
/// commit is outstanding at a time: the caller holds the accountant lock from
/// allocation until the server's verdict.
#[derive(Debug)]
#[must_use = "rollback is impossible once the commit is dropped"]
pub struct Commit {
    undo: Undo,
}

#[derive(Debug)]
enum Undo {
    Simple([PeriodRecord; NUM_BINS]),
    PerQuorum(Vec<(QuorumId, [PeriodRecord; NUM_BINS])>),
    OnDemand { previous: U256 },
}

/// Server snapshot of an account-level payment state.
#[derive(Debug, Clone, Default)]
pub struct PaymentStateSnapshot {
    pub params: Option<PaymentParams>,
    pub reservation: Option<Reservation>,
    pub period_records: Vec<PeriodRecord>,
    pub cumulative_payment: U256,
    pub onchain_cumulative_payment: U256,
}

impl PaymentStateSnapshot {
    pub fn from_protobuf(reply: &eigenda_proto::disperser::v2::GetPaymentStateReply) -> Self {
        Self {
            params: reply.payment_global_params.as_ref().map(|params| PaymentParams {
                price_per_symbol: params.price_per_symbol,
                min_num_symbols: params.min_num_symbols,
                reservation_period_interval: params.reservation_window,
            }),
            reservation: reply.reservation.as_ref().map(reservation_from_protobuf),
            period_records: reply.period_records.iter().map(record_from_protobuf).collect(),
            cumulative_payment: U256::from_be_slice(&reply.cumulative_payment),
            onchain_cumulative_payment: U256::from_be_slice(&reply.onchain_cumulative_payment),
        }
    }
}

/// Server snapshot of a per-quorum payment state.
#[derive(Debug, Clone, Default)]
pub struct QuorumPaymentStateSnapshot {
    pub reservations: BTreeMap<QuorumId, Reservation>,
    pub period_records: BTreeMap<QuorumId, Vec<PeriodRecord>>,
    /// Per-quorum protocol overrides: (min_num_symbols, period interval).
    pub protocol: BTreeMap<QuorumId, (u64, u64)>,
    pub on_demand_quorums: Vec<QuorumId>,
    pub cumulative_payment: U256,
    pub onchain_cumulative_payment: U256,
}

impl QuorumPaymentStateSnapshot {
    pub fn from_protobuf(
        reply: &eigenda_proto::disperser::v2::GetPaymentStateForAllQuorumsReply,
    ) -> Self {
        let quorum = |id: &u32| *id as QuorumId;
        Self {
            reservations: reply
                .reservations
                .iter()
                .map(|(id, r)| {
                    (quorum(id), Reservation {
                        symbols_per_second: r.symbols_per_second,
                        start_ns: i64::from(r.start_timestamp) * NANOS_PER_SEC,
                        end_ns: i64::from(r.end_timestamp) * NANOS_PER_SEC,
                        quorum_numbers: vec![quorum(id)],
                        quorum_splits: vec![100],
                    })
                })
                .collect(),
            period_records: reply
                .period_records
                .iter()
                .map(|(id, records)| {
                    (quorum(id), records.records.iter().map(record_from_protobuf).collect())
                })
                .collect(),
            protocol: reply
                .payment_quorum_protocol_configs
                .iter()
                .map(|(id, config)| {
                    (quorum(id), (config.min_num_symbols, config.reservation_rate_limit_window))
                })
                .collect(),
            on_demand_quorums: reply.on_demand_quorum_numbers.iter().map(quorum).collect(),
            cumulative_payment: U256::from_be_slice(&reply.cumulative_payment),
            onchain_cumulative_payment: U256::from_be_slice(&reply.onchain_cumulative_payment),
        }
    }
}

fn reservation_from_protobuf(proto: &eigenda_proto::disperser::v2::Reservation) -> Reservation {
    Reservation {
        symbols_per_second: proto.symbols_per_second,
        start_ns: i64::from(proto.start_timestamp) * NANOS_PER_SEC,
        end_ns: i64::from(proto.end_timestamp) * NANOS_PER_SEC,
        quorum_numbers: proto.quorum_numbers.iter().map(|&q| q as QuorumId).collect(),
        quorum_splits: proto.quorum_splits.iter().map(|&s| s as u8).collect(),
    }
}

fn record_from_protobuf(proto: &eigenda_proto::disperser::v2::PeriodRecord) -> PeriodRecord {
    PeriodRecord { index: proto.index, usage_symbols: proto.usage }
}

/// Symbols charged for an encoded payload: the symbol count, floored at the
/// network minimum.
pub fn symbols_charged(encoded_len: usize, min_num_symbols: u64) -> u64 {
    (encoded_len.div_ceil(eigenda_codec::BYTES_PER_SYMBOL) as u64).max(min_num_symbols)
}

#[derive(Debug, Default)]
struct SimpleState {
    reservation: Option<Reservation>,
    records: [PeriodRecord; NUM_BINS],
}

#[derive(Debug)]
struct QuorumState {
    reservation: Reservation,
    records: [PeriodRecord; NUM_BINS],
    min_num_symbols: u64,
    interval: u64,
}

#[derive(Debug, Default)]
struct PerQuorumState {
    reservations: BTreeMap<QuorumId, QuorumState>,
    on_demand_quorums: Vec<QuorumId>,
}

#[derive(Debug)]
enum Mode {
    Simple(SimpleState),
    PerQuorum(PerQuorumState),
}

/// The dual-mode payment state machine.
#[derive(Debug)]
pub struct Accountant {
    params: PaymentParams,
    cumulative_payment: U256,
    onchain_cumulative_payment: U256,
    mode: Mode,
}

impl Accountant {
    /// Account-level mode: one reservation shared by all quorums.
    pub fn new_simple(params: PaymentParams) -> Self {
        Self {
            params,
            cumulative_payment: U256::ZERO,
            onchain_cumulative_payment: U256::ZERO,
            mode: Mode::Simple(SimpleState::default()),
        }
    }

    /// Per-quorum mode: every requested quorum needs its own reservation.
    pub fn new_per_quorum(params: PaymentParams) -> Self {
        Self {
            params,
            cumulative_payment: U256::ZERO,
            onchain_cumulative_payment: U256::ZERO,
            mode: Mode::PerQuorum(PerQuorumState::default()),
        }
    }

    /// The local cumulative payment counter.
    pub fn cumulative_payment(&self) -> U256 {
        self.cumulative_payment
    }

    /// Current period records, for inspection.
    pub fn period_records(&self, quorum: QuorumId) -> Option<[PeriodRecord; NUM_BINS]> {
        match &self.mode {
            Mode::Simple(state) => Some(state.records),
            Mode::PerQuorum(state) => state.reservations.get(&quorum).map(|s| s.records),
        }
    }

    /// Ingest an account-level server snapshot.
    pub fn sync(&mut self, snapshot: &PaymentStateSnapshot) {
        if let Some(params) = snapshot.params {
            self.params = params;
        }
        self.sync_cumulative(snapshot.cumulative_payment, snapshot.onchain_cumulative_payment);

        if let Mode::Simple(state) = &mut self.mode {
            state.reservation = snapshot.reservation.clone();
            merge_records(&mut state.records, &snapshot.period_records);
        }
    }

    /// Ingest a per-quorum server snapshot.
    pub fn sync_per_quorum(&mut self, snapshot: &QuorumPaymentStateSnapshot) {
        self.sync_cumulative(snapshot.cumulative_payment, snapshot.onchain_cumulative_payment);

        let params = self.params;
        if let Mode::PerQuorum(state) = &mut self.mode {
            state.on_demand_quorums = snapshot.on_demand_quorums.clone();

            state.reservations.retain(|quorum, _| snapshot.reservations.contains_key(quorum));
            for (&quorum, reservation) in &snapshot.reservations {
                let (min_num_symbols, interval) = snapshot
                    .protocol
                    .get(&quorum)
                    .copied()
                    .unwrap_or((params.min_num_symbols, params.reservation_period_interval));
                let entry = state.reservations.entry(quorum).or_insert_with(|| QuorumState {
                    reservation: reservation.clone(),
                    records: Default::default(),
                    min_num_symbols,
                    interval,
                });
                entry.reservation = reservation.clone();
                entry.min_num_symbols = min_num_symbols;
                entry.interval = interval;
                if let Some(records) = snapshot.period_records.get(&quorum) {
                    merge_records(&mut entry.records, records);
                }
            }
        }
    }

    fn sync_cumulative(&mut self, server_current: U256, server_onchain: U256) {
        if server_current > self.cumulative_payment {
            tracing::warn!(
                local = %self.cumulative_payment,
                server = %server_current,
                "cumulative payment drift detected; adopting server value"
            );
            self.cumulative_payment = server_current;
        }
        self.onchain_cumulative_payment = server_onchain;
    }

    /// Decide how a blob with the given encoded length is paid for, mutating
    /// the chosen budget. The returned [`Commit`] undoes the mutation.
    pub fn allocate(
        &mut self,
        encoded_len: usize,
        quorums: &[QuorumId],
        timestamp_ns: i64,
    ) -> Result<(Payment, Commit), AccountantError> {
        if let Some(commit) = self.try_reservation(encoded_len, quorums, timestamp_ns) {
            return Ok((Payment::Reservation, commit));
        }
        self.try_on_demand(encoded_len, quorums)
    }

    /// Undo a previous allocation after a failed submission.
    pub fn rollback(&mut self, commit: Commit) {
        match commit.undo {
            Undo::OnDemand { previous } => self.cumulative_payment = previous,
            Undo::Simple(records) => {
                if let Mode::Simple(state) = &mut self.mode {
                    state.records = records;
                }
            }
            Undo::PerQuorum(snapshots) => {
                if let Mode::PerQuorum(state) = &mut self.mode {
                    for (quorum, records) in snapshots {
                        if let Some(entry) = state.reservations.get_mut(&quorum) {
                            entry.records = records;
                        }
                    }
                }
            }
        }
    }

    fn try_reservation(
        &mut self,
        encoded_len: usize,
        quorums: &[QuorumId],
        timestamp_ns: i64,
    ) -> Option<Commit> {
        match &mut self.mode {
            Mode::Simple(state) => {
                let reservation = state.reservation.as_ref()?;
                if !reservation.is_active(timestamp_ns) {
                    return None;
                }
                if !quorums.iter().all(|&q| reservation.covers_quorum(q)) {
                    return None;
                }
                let interval = self.params.reservation_period_interval;
                if interval == 0 {
                    return None;
                }

                let symbols = symbols_charged(encoded_len, self.params.min_num_symbols);
                let cap = reservation.symbols_per_second * interval;
                let period = period_index(timestamp_ns, interval);

                let snapshot = state.records;
                let mut records = state.records;
                if !charge_bins(&mut records, period, symbols, cap) {
                    return None;
                }
                state.records = records;
                Some(Commit { undo: Undo::Simple(snapshot) })
            }
            Mode::PerQuorum(state) => {
                let mut snapshots = Vec::with_capacity(quorums.len());
                let mut updates = Vec::with_capacity(quorums.len());
                for &quorum in quorums {
                    let entry = state.reservations.get(&quorum)?;
                    if !entry.reservation.is_active(timestamp_ns) || entry.interval == 0 {
                        return None;
                    }

                    let symbols = symbols_charged(encoded_len, entry.min_num_symbols);
                    let cap = entry.reservation.symbols_per_second * entry.interval;
                    let period = period_index(timestamp_ns, entry.interval);

                    let mut records = entry.records;
                    if !charge_bins(&mut records, period, symbols, cap) {
                        return None;
                    }
                    snapshots.push((quorum, entry.records));
                    updates.push((quorum, records));
                }
                for (quorum, records) in updates {
                    if let Some(entry) = state.reservations.get_mut(&quorum) {
                        entry.records = records;
                    }
                }
                Some(Commit { undo: Undo::PerQuorum(snapshots) })
            }
        }
    }

    fn try_on_demand(
        &mut self,
        encoded_len: usize,
        quorums: &[QuorumId],
    ) -> Result<(Payment, Commit), AccountantError> {
        if let Mode::PerQuorum(state) = &self.mode {
            for &quorum in quorums {
                if !state.on_demand_quorums.contains(&quorum) {
                    return Err(AccountantError::OnDemandNotSupported(quorum));
                }
            }
        }

        let symbols = symbols_charged(encoded_len, self.params.min_num_symbols);
        let cost = U256::from(symbols) * U256::from(self.params.price_per_symbol);
        let total = self.cumulative_payment + cost;
        if self.onchain_cumulative_payment < total {
            return Err(AccountantError::InsufficientFunds { cost });
        }

        let previous = self.cumulative_payment;
        self.cumulative_payment = total;
        Ok((Payment::OnDemand { total }, Commit { undo: Undo::OnDemand { previous } }))
    }
}

fn period_index(timestamp_ns: i64, interval: u64) -> u32 {
    ((timestamp_ns.max(0) / NANOS_PER_SEC) as u64 / interval) as u32
}

/// Locate the bin for a period, re-keying a stale slot to the requested
/// index with zero usage.
fn bin_mut(records: &mut [PeriodRecord; NUM_BINS], period: u32) -> &mut PeriodRecord {
    let slot = &mut records[period as usize % NUM_BINS];
    if slot.index != period {
        *slot = PeriodRecord { index: period, usage_symbols: 0 };
    }
    slot
}

/// Charge `symbols` against the period's bin, spilling into the next
/// period's bin when the current one fills. Returns false without a
/// meaningful mutation when even the spill does not fit; callers operate on
/// a copy and discard it in that case.
fn charge_bins(records: &mut [PeriodRecord; NUM_BINS], period: u32, symbols: u64, cap: u64) -> bool {
    let usage = bin_mut(records, period).usage_symbols;
    if usage + symbols <= cap {
        bin_mut(records, period).usage_symbols += symbols;
        return true;
    }

    let head = cap.saturating_sub(usage);
    let overflow = symbols - head;
    let next = period.wrapping_add(1);
    if bin_mut(records, next).usage_symbols + overflow > cap {
        return false;
    }
    bin_mut(records, period).usage_symbols = cap;
    bin_mut(records, next).usage_symbols += overflow;
    true
}

fn merge_records(local: &mut [PeriodRecord; NUM_BINS], server: &[PeriodRecord]) {
    for record in server {
        let slot = &mut local[record.index as usize % NUM_BINS];
        if slot.index == record.index {
            // The server may have counted submissions we rolled back.
            slot.usage_symbols = slot.usage_symbols.max(record.usage_symbols);
        } else if record.index > slot.index {
            *slot = *record;
        }
    }
}
