//! The mixing coordinator.
//!
//! Runs on the masternode side only. One session at a time:
//!
//! ```text
//! Idle --(first accept)--> Queue --(enough participants)--> AcceptingEntries
//!                                                               |
//!                                           (entries full OR timeout & >= min)
//!                                                               v
//!                                                           Signing
//!                                                               |
//!                                             (final PSBT complete & accepted)
//!                                                               v
//!                                                             Idle
//! ```
//!
//! Any queue expiry, signing timeout, merge failure, mempool rejection or
//! loss of all participants resets the whole thing. Peers only ever see
//! status updates, completions, or rejects.

use crate::queues::{QueueObservation, QueuePool};
use crate::session::MixSession;
use keel_masternode::{ActiveMasternode, HostServices};
use keel_messages::{
    CoinJoinEntry, CoinJoinQueue, FinalTxBroadcast, Inventory, NetMessage, PeerAddr, PoolMessage,
    PoolState, PoolStatusUpdate, REJECT_OBSOLETE,
};
use keel_network::PeerInfo;
use keel_transactions::{PartialTransaction, Transaction, TxIn};
use keel_types::{is_denominated_amount, Amount, Denom, ProtocolParams};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

/// The masternode-side mixing coordinator.
pub struct CoinJoinServer {
    active: ActiveMasternode,
    params: ProtocolParams,
    session: MixSession,
    /// Admitted participants with the denom each brought.
    participants: Vec<(PeerAddr, Denom)>,
    /// Our own signed advertisement while a session runs.
    active_queue: Option<CoinJoinQueue>,
    /// Everyone's advertisements, gossip-fed.
    queue_pool: QueuePool,
    cached_height: u32,
}

impl CoinJoinServer {
    pub fn new(active: ActiveMasternode, params: ProtocolParams) -> Self {
        Self {
            active,
            params,
            session: MixSession::new(),
            participants: Vec::new(),
            active_queue: None,
            queue_pool: QueuePool::new(),
            cached_height: 0,
        }
    }

    pub fn state(&self) -> PoolState {
        self.session.state
    }

    pub fn session_id(&self) -> u32 {
        self.session.session_id
    }

    pub fn session_denom(&self) -> Denom {
        self.session.denom
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn entries_count(&self) -> usize {
        self.session.entries_count()
    }

    pub fn queue_pool_len(&self) -> usize {
        self.queue_pool.len()
    }

    pub fn active_queue(&self) -> Option<&CoinJoinQueue> {
        self.active_queue.as_ref()
    }

    fn is_session_ready(&self) -> bool {
        self.participants.len() >= self.params.min_pool_inputs
    }

    fn is_session_full(&self) -> bool {
        self.participants.len() >= self.params.max_pool_inputs
    }

    // ── inbound dispatch ───────────────────────────────────────────────

    pub fn handle_message(&mut self, peer: &PeerInfo, msg: NetMessage, services: &HostServices) {
        if services.chain.initial_block_download() {
            return;
        }
        if peer.version < self.params.min_protocol_version {
            debug!(peer = %peer.addr, version = peer.version, "peer using obsolete version");
            services.connman.push(
                &peer.addr,
                NetMessage::Reject {
                    command: msg.command().to_string(),
                    code: REJECT_OBSOLETE,
                    reason: format!(
                        "Version must be {} or greater",
                        self.params.min_protocol_version
                    ),
                },
            );
            return;
        }

        match msg {
            NetMessage::MixAccept { denom } => self.handle_accept(peer, denom, services),
            NetMessage::MixQueue(queue) => self.handle_queue(peer, queue, services),
            NetMessage::MixTxIn(entry) => self.handle_tx_in(peer, entry, services),
            NetMessage::MixSignFinal(psbt) => self.handle_sign_final(peer, psbt, services),
            _ => {}
        }
    }

    // ── CJACCEPT ───────────────────────────────────────────────────────

    pub fn handle_accept(&mut self, peer: &PeerInfo, denom: Denom, services: &HostServices) {
        if self.is_session_full() {
            // too many users in this session already, reject new ones
            warn!(peer = %peer.addr, "accept rejected, queue is already full");
            self.push_status(&peer.addr, PoolStatusUpdate::Rejected, PoolMessage::ErrQueueFull, services);
            return;
        }

        debug!(peer = %peer.addr, %denom, "accept request");

        if services.registry.lookup(&self.active.outpoint).is_none() {
            self.push_status(&peer.addr, PoolStatusUpdate::Rejected, PoolMessage::ErrMnList, services);
            return;
        }

        if self.participants.is_empty() && self.queue_pool.has_queue_from(&self.active.outpoint) {
            // refuse to create another queue this often
            debug!("last queue advertisement still listed, refusing to mix");
            self.push_status(&peer.addr, PoolStatusUpdate::Rejected, PoolMessage::ErrRecent, services);
            return;
        }

        let result = if self.session.session_id == 0 {
            self.create_new_session(denom, services)
        } else {
            self.add_user_to_existing_session(denom)
        };

        match result {
            Ok(message) => {
                info!(peer = %peer.addr, "accept is compatible, please submit");
                self.push_status(&peer.addr, PoolStatusUpdate::Accepted, message, services);
                self.participants.push((peer.addr.clone(), denom));
                if let Some(queue) = &self.active_queue {
                    if queue.status > PoolStatusUpdate::Open {
                        let msg = NetMessage::MixQueue(queue.clone());
                        services.connman.push(&peer.addr, msg);
                    }
                }
                self.check_for_complete_queue(services);
            }
            Err(message) => {
                info!(peer = %peer.addr, %message, "accept not compatible");
                self.push_status(&peer.addr, PoolStatusUpdate::Rejected, message, services);
            }
        }
    }

    fn create_new_session(
        &mut self,
        denom: Denom,
        services: &HostServices,
    ) -> Result<PoolMessage, PoolMessage> {
        if self.session.state != PoolState::Idle {
            warn!(state = %self.session.state, "new session in incompatible mode");
            return Err(PoolMessage::ErrMode);
        }
        if !denom.is_valid() {
            return Err(PoolMessage::ErrDenom);
        }

        self.session.session_id = rand::thread_rng().gen_range(1..1 << 20);
        self.session.denom = denom;
        self.session.state = PoolState::Queue;

        // broadcast that we're accepting entries
        let mut queue = CoinJoinQueue::new(
            denom,
            self.active.outpoint,
            self.cached_height,
            PoolStatusUpdate::Open,
        );
        queue.signature = Some(self.active.sign(&queue.signature_hash()));
        debug!(%queue, "signing and relaying new queue");
        self.active_queue = Some(queue.clone());
        self.queue_pool.push(queue.clone());
        services
            .connman
            .relay(NetMessage::MixQueue(queue), self.params.min_protocol_version);

        info!(
            session_id = self.session.session_id,
            denom = %self.session.denom,
            "new mixing session created"
        );
        Ok(PoolMessage::NoErr)
    }

    fn add_user_to_existing_session(&mut self, denom: Denom) -> Result<PoolMessage, PoolMessage> {
        if self.session.state != PoolState::Queue && self.session.state != PoolState::AcceptingEntries
        {
            warn!(state = %self.session.state, "join in incompatible mode");
            return Err(PoolMessage::ErrMode);
        }
        if !denom.is_valid() {
            return Err(PoolMessage::ErrDenom);
        }
        if !self.session.denom.compatible(denom) {
            info!(
                %denom,
                session_denom = %self.session.denom,
                "incompatible denomination"
            );
            return Err(PoolMessage::ErrDenom);
        }

        self.session.denom = self.session.denom.union(denom);
        info!(
            session_id = self.session.session_id,
            denom = %self.session.denom,
            participants = self.participants.len(),
            "new user accepted"
        );
        Ok(PoolMessage::NoErr)
    }

    // ── CJQUEUE ────────────────────────────────────────────────────────

    pub fn handle_queue(&mut self, peer: &PeerInfo, queue: CoinJoinQueue, services: &HostServices) {
        if queue.is_expired(self.cached_height, self.params.queue_ttl_blocks) {
            return;
        }
        if queue.height > self.cached_height + 1 {
            return;
        }

        let verified = services
            .registry
            .lookup(&queue.masternode_outpoint)
            .is_some_and(|info| queue.verify(&info.pubkey));
        if !verified {
            // we probably have outdated masternode info, request it
            info!(%queue, "masternode for queue not found, requesting");
            services
                .registry
                .ask_for(&peer.addr, &queue.masternode_outpoint);
            return;
        }

        match self.queue_pool.observe(&queue) {
            QueueObservation::Duplicate => {
                debug!(%queue, peer = %peer.addr, "queue seen");
            }
            QueueObservation::Updated => {}
            QueueObservation::New => {
                if queue.status <= PoolStatusUpdate::Open {
                    debug!(%queue, "new mixing queue");
                    self.queue_pool.push(queue.clone());
                    services
                        .connman
                        .relay(NetMessage::MixQueue(queue), self.params.min_protocol_version);
                }
            }
        }
    }

    // ── CJTXIN ─────────────────────────────────────────────────────────

    pub fn handle_tx_in(&mut self, peer: &PeerInfo, mut entry: CoinJoinEntry, services: &HostServices) {
        if !self.check_session_message(peer, services) {
            return;
        }

        entry.peer = Some(peer.addr.clone());

        debug!(
            peer = %peer.addr,
            vin = entry.psbt.tx.inputs.len(),
            vout = entry.psbt.tx.outputs.len(),
            "entry received"
        );

        if entry.psbt.tx.inputs.len() > self.params.entry_max_inputs {
            warn!(peer = %peer.addr, "entry has too many inputs");
            self.push_status(&peer.addr, PoolStatusUpdate::Rejected, PoolMessage::ErrMaximum, services);
            return;
        }
        if entry.psbt.tx.outputs.len() > self.params.entry_max_inputs * 3 {
            warn!(peer = %peer.addr, "entry has too many outputs");
            self.push_status(&peer.addr, PoolStatusUpdate::Rejected, PoolMessage::ErrMaximum, services);
            return;
        }

        let fee = match self.session.check_transaction(&entry.psbt, true, &self.params) {
            Ok(fee) => fee,
            Err(message) => {
                warn!(peer = %peer.addr, %message, "entry transaction check failed");
                self.push_status(&peer.addr, PoolStatusUpdate::Rejected, message, services);
                return;
            }
        };

        let Some(mn_fee) = self.compatible_tx_out(&entry.psbt.tx, services) else {
            warn!(peer = %peer.addr, "entry not compatible with existing transactions");
            self.push_status(&peer.addr, PoolStatusUpdate::Rejected, PoolMessage::ErrInvalidOut, services);
            return;
        };

        if mn_fee < fee {
            warn!(peer = %peer.addr, "entry missing masternode fees");
            self.push_status(&peer.addr, PoolStatusUpdate::Rejected, PoolMessage::ErrMnFees, services);
            return;
        }

        match self.add_entry(entry) {
            Ok(message) => {
                self.push_status(&peer.addr, PoolStatusUpdate::Accepted, message, services);
                self.relay_status(PoolStatusUpdate::Accepted, PoolMessage::NoErr, services);
                self.check_pool(services);
            }
            Err(message) => {
                self.push_status(&peer.addr, PoolStatusUpdate::Rejected, message, services);
            }
        }
    }

    /// There must be at least one output paying the masternode payee, and
    /// every output must be a clean denomination. Whether the payee really
    /// is who the entry claims is consensus's problem, not ours.
    fn compatible_tx_out(&self, tx: &Transaction, services: &HostServices) -> Option<Amount> {
        let payee = services.chain.block_payee(tx.lock_height);
        if let Some(script) = &payee {
            debug!(?script, "found masternode payee");
        }

        let mut mn_fee = Amount::ZERO;
        for output in &tx.outputs {
            if !is_denominated_amount(output.value) {
                warn!(value = output.value.units(), "non-denominated output");
                return None;
            }
            if payee.as_ref() == Some(&output.script) {
                mn_fee = mn_fee.saturating_add(output.value);
            }
        }
        Some(mn_fee)
    }

    fn add_entry(&mut self, entry: CoinJoinEntry) -> Result<PoolMessage, PoolMessage> {
        if self.session.entries_count() >= self.params.max_pool_inputs
            || self.session.state != PoolState::AcceptingEntries
        {
            debug!("entries are full");
            return Err(PoolMessage::ErrEntriesFull);
        }
        if self.session.entries.iter().any(|existing| *existing == entry) {
            return Err(PoolMessage::ErrAlreadyHave);
        }
        self.session.entries.push(entry);
        debug!(entries = self.session.entries_count(), "entry added");
        Ok(PoolMessage::EntriesAdded)
    }

    // ── CJSIGNFINALTX ──────────────────────────────────────────────────

    pub fn handle_sign_final(
        &mut self,
        peer: &PeerInfo,
        psbt: PartialTransaction,
        services: &HostServices,
    ) {
        if !self.check_session_message(peer, services) {
            return;
        }

        debug!(peer = %peer.addr, tx = %psbt.tx.hash(), "received signed final transaction");

        {
            let Some(final_psbt) = self.session.final_psbt.as_mut() else {
                return;
            };
            // wrong transaction? just ignore it
            if final_psbt.tx.hash() != psbt.tx.hash() {
                return;
            }
            if final_psbt.merge(&psbt).is_err() {
                // notify everyone else that this session should be terminated
                warn!("final transaction merge failed, terminating session");
                self.relay_status(PoolStatusUpdate::Rejected, PoolMessage::NoErr, services);
                self.set_null(services);
                return;
            }
        }

        // see if we are ready to submit
        let complete = {
            let final_psbt = self.session.final_psbt.as_ref().expect("merged above");
            self.session
                .check_transaction(final_psbt, false, &self.params)
                .is_ok()
        };
        if complete {
            self.commit_final_transaction(services);
        }
    }

    fn check_session_message(&mut self, peer: &PeerInfo, services: &HostServices) -> bool {
        // make sure it's really our session and it's open for business
        let queue_live = self.active_queue.as_ref().is_some_and(|queue| {
            queue.status >= PoolStatusUpdate::Ready && queue.status <= PoolStatusUpdate::Full
        });
        if !queue_live {
            warn!(peer = %peer.addr, "session message but queue not ready");
            self.push_status(&peer.addr, PoolStatusUpdate::Rejected, PoolMessage::ErrSession, services);
            return false;
        }
        if !self.is_session_ready() {
            warn!(peer = %peer.addr, "session message but session not ready");
            self.push_status(&peer.addr, PoolStatusUpdate::Rejected, PoolMessage::ErrSession, services);
            return false;
        }
        true
    }

    // ── progress checks ────────────────────────────────────────────────

    /// After enough accepts the queue flips to accepting entries.
    pub fn check_for_complete_queue(&mut self, services: &HostServices) {
        if self.session.state == PoolState::Queue && self.is_session_ready() {
            self.session.time_start = services.clock.now();
            self.session.state = PoolState::AcceptingEntries;
            let status = if self.is_session_full() {
                PoolStatusUpdate::Full
            } else {
                PoolStatusUpdate::Ready
            };
            self.update_queue(status, services);
            debug!("queue is ready, updating and relaying");
        }
    }

    /// Check mixing progress; finalize when every participant submitted or
    /// the accept window closed with enough entries.
    pub fn check_pool(&mut self, services: &HostServices) {
        debug!(entries = self.session.entries_count(), "checking pool");

        let mut ready = self.session.entries_count() >= self.participants.len();
        let window_closed = self
            .session
            .time_start
            .has_expired(self.params.accept_timeout_secs, services.clock.now());
        if window_closed && self.session.entries_count() >= self.params.min_pool_inputs {
            ready = true;
        }

        if self.session.state == PoolState::AcceptingEntries && ready {
            self.update_queue(PoolStatusUpdate::Ready, services);
            info!("finalizing transactions");
            self.session.time_start = services.clock.now();
            self.session.state = PoolState::Signing;
            self.create_final_transaction(services);
            return;
        }

        if self.session.state == PoolState::AcceptingEntries && self.is_session_full() {
            self.update_queue(PoolStatusUpdate::Full, services);
        }
    }

    // ── finalization & commit ──────────────────────────────────────────

    /// Concatenate all entries, strip signature data, shuffle, and hand
    /// the result to every participant for signing.
    fn create_final_transaction(&mut self, services: &HostServices) {
        debug!("building final transaction");

        let mut tx = Transaction::default();
        for entry in &self.session.entries {
            for txin in &entry.psbt.tx.inputs {
                tx.inputs.push(TxIn::new(txin.prevout));
            }
            for txout in &entry.psbt.tx.outputs {
                tx.outputs.push(txout.clone());
            }
        }

        let mut rng = rand::thread_rng();
        tx.inputs.shuffle(&mut rng);
        tx.outputs.shuffle(&mut rng);

        let mut final_psbt = PartialTransaction::from_unsigned(tx);
        final_psbt.fill_witness_utxos(|outpoint| services.chain.utxo(outpoint));

        info!(tx = %final_psbt.tx.hash(), "final transaction ready for signing");
        self.session.final_psbt = Some(final_psbt);
        self.relay_final_transaction(services);
    }

    /// Push the final transaction to every participant; any that
    /// disconnected are dropped, and finalization retries while enough
    /// remain.
    fn relay_final_transaction(&mut self, services: &HostServices) {
        let Some(final_psbt) = self.session.final_psbt.clone() else {
            return;
        };
        let mut broadcast = FinalTxBroadcast::new(
            self.session.session_id,
            final_psbt,
            self.active.outpoint,
            services.clock.adjusted(),
        );
        broadcast.signature = Some(self.active.sign(&broadcast.signature_hash()));

        let session_id = self.session.session_id;
        let denom = self.session.denom;
        let mut all_ok = true;
        let msg = NetMessage::MixFinalTx(broadcast);
        self.session.entries.retain(|entry| {
            let delivered = match &entry.peer {
                Some(addr) => services.connman.push(addr, msg.clone()),
                None => true,
            };
            if !delivered {
                // no such node? client disconnected or our own link dropped
                warn!(session_id, %denom, "participant disconnected, removing entry");
                all_ok = false;
            }
            delivered
        });

        if all_ok {
            return;
        }
        if self.session.entries_count() >= self.params.min_pool_inputs {
            self.create_final_transaction(services);
        } else {
            self.set_null(services);
        }
    }

    /// Extract the fully signed transaction and submit it to the mempool.
    /// Success is announced to the network and every participant; failure
    /// only to the participants.
    fn commit_final_transaction(&mut self, services: &HostServices) {
        let Some(final_psbt) = self.session.final_psbt.as_ref() else {
            return;
        };

        let final_tx = match final_psbt.finalize_and_extract() {
            Ok(tx) => tx,
            Err(err) => {
                // not much we can do in this case, just notify clients
                warn!(error = %err, "final transaction extraction failed");
                self.relay_completed(PoolMessage::ErrInvalidTx, services);
                self.set_null(services);
                return;
            }
        };

        let tx_hash = final_tx.hash();
        debug!(tx = %tx_hash, "committing final transaction");

        if !services.chain.accept_to_mempool(&final_tx) {
            warn!(tx = %tx_hash, "mempool rejected final transaction");
            self.relay_completed(PoolMessage::ErrInvalidTx, services);
            self.set_null(services);
            return;
        }

        info!(tx = %tx_hash, "transmitting final transaction");
        services
            .connman
            .relay_inv(Inventory::Transaction(tx_hash), self.params.min_protocol_version);
        self.relay_completed(PoolMessage::Success, services);

        debug!("mixing completed, resetting");
        self.set_null(services);
    }

    // ── timeouts & tip updates ─────────────────────────────────────────

    /// Check queue and session deadlines.
    pub fn check_timeout(&mut self, services: &HostServices) {
        self.queue_pool
            .check_expired(self.cached_height, self.params.queue_ttl_blocks);

        let queue_expired = self
            .active_queue
            .as_ref()
            .is_some_and(|queue| queue.is_expired(self.cached_height, self.params.queue_ttl_blocks));
        if queue_expired {
            info!("queue expired, resetting");
            self.set_null(services);
            return;
        }

        let now = services.clock.now();
        if self.session.state == PoolState::Signing
            && self
                .session
                .time_start
                .has_expired(self.params.signing_timeout_secs, now)
        {
            info!(
                timeout = self.params.signing_timeout_secs,
                "signing timed out, resetting"
            );
            self.set_null(services);
            return;
        }

        if self.session.state == PoolState::AcceptingEntries
            && self
                .session
                .time_start
                .has_expired(self.params.accept_timeout_secs, now)
            && self.session.entries_count() < self.params.min_pool_inputs
        {
            info!("accept window closed without enough entries, resetting");
            self.set_null(services);
        }
    }

    pub fn on_new_tip(&mut self, height: u32, services: &HostServices) {
        if services.chain.initial_block_download() {
            return;
        }
        self.cached_height = height;
        debug!(height, "mixing coordinator saw new tip");

        if self.session.state == PoolState::Queue {
            self.check_for_complete_queue(services);
        }
        if self.session.state == PoolState::AcceptingEntries {
            self.check_pool(services);
        }
        self.check_timeout(services);
    }

    // ── queue & status relay ───────────────────────────────────────────

    /// Re-sign the active queue with a new status. Status updates above
    /// `Open` go to participants only; unreachable participants are
    /// evicted, and losing everyone resets the session without penalizing
    /// anyone.
    fn update_queue(&mut self, update: PoolStatusUpdate, services: &HostServices) {
        let Some(queue) = self.active_queue.as_mut() else {
            return;
        };
        if queue.is_expired(self.cached_height, self.params.queue_ttl_blocks) {
            return;
        }
        if queue.status == update {
            return;
        }

        queue.height = self.cached_height;
        queue.status = update;
        let hash = queue.signature_hash();
        queue.signature = Some(self.active.sign(&hash));
        debug!(queue = %queue, "updating queue");

        let msg = NetMessage::MixQueue(queue.clone());
        if update > PoolStatusUpdate::Open {
            // session-private: participants only
            let session_id = self.session.session_id;
            self.participants.retain(|(addr, _)| {
                let delivered = services.connman.push(addr, msg.clone());
                if !delivered {
                    warn!(session_id, peer = %addr, "participant disconnected, removing");
                }
                delivered
            });
            if self.participants.is_empty() {
                // everyone is gone; probably our own connection. No bans.
                self.set_null(services);
            }
        } else {
            services
                .connman
                .relay(msg, self.params.min_protocol_version);
        }
    }

    /// Total cancellation: close and drop the queue, clear participants
    /// and entries, back to idle.
    pub fn set_null(&mut self, services: &HostServices) {
        if let Some(queue) = self.active_queue.as_mut() {
            if queue.status != PoolStatusUpdate::Closed && !queue.is_expired(self.cached_height, self.params.queue_ttl_blocks) {
                queue.height = self.cached_height;
                queue.status = PoolStatusUpdate::Closed;
                let hash = queue.signature_hash();
                queue.signature = Some(self.active.sign(&hash));
                debug!(queue = %queue, "closing queue");
                let msg = NetMessage::MixQueue(queue.clone());
                for (addr, _) in &self.participants {
                    services.connman.push(addr, msg.clone());
                }
            }
        }
        self.active_queue = None;
        self.participants.clear();
        self.session.set_null();
        self.queue_pool.clear();
    }

    fn push_status(
        &self,
        peer: &PeerAddr,
        update: PoolStatusUpdate,
        message: PoolMessage,
        services: &HostServices,
    ) {
        services.connman.push(
            peer,
            NetMessage::MixStatusUpdate {
                session_id: self.session.session_id,
                state: self.session.state,
                entry_count: self.session.entries_count() as u32,
                update,
                message,
            },
        );
    }

    /// Status update to every participant with an entry; unreachable ones
    /// are evicted. Losing every entry resets without bans.
    fn relay_status(&mut self, update: PoolStatusUpdate, message: PoolMessage, services: &HostServices) {
        let msg = NetMessage::MixStatusUpdate {
            session_id: self.session.session_id,
            state: self.session.state,
            entry_count: self.session.entries_count() as u32,
            update,
            message,
        };
        let session_id = self.session.session_id;
        self.session.entries.retain(|entry| {
            let delivered = match &entry.peer {
                Some(addr) => services.connman.push(addr, msg.clone()),
                None => true,
            };
            if !delivered {
                warn!(session_id, "participant disconnected, removing entry");
            }
            delivered
        });

        if self.session.entries.is_empty() && self.session.state != PoolState::Idle {
            // all clients disconnected, do not ban anyone, just reset
            self.set_null(services);
        }
    }

    fn relay_completed(&self, message: PoolMessage, services: &HostServices) {
        debug!(
            session_id = self.session.session_id,
            %message,
            "notifying participants of completion"
        );
        for entry in &self.session.entries {
            if let Some(addr) = &entry.peer {
                services.connman.push(
                    addr,
                    NetMessage::MixComplete {
                        session_id: self.session.session_id,
                        message,
                    },
                );
            }
        }
    }
}
