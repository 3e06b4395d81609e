//! The governance store and its ingestion paths.
//!
//! Everything gossip throws at the node lands here: objects it solicited,
//! votes for objects it may not have yet, objects whose masternode it has
//! never heard of, proposals whose collateral is still in the mempool. A
//! hash lives in exactly one of the primary stores (`objects`,
//! `postponed`, `mn_orphan_objects`, `erased`) at a time, and every vote
//! accepted is reachable through the bounded `vote_to_object` index.

use crate::cache_map::CacheMap;
use crate::cache_multimap::CacheMultiMap;
use crate::error::GovernanceError;
use crate::object::{LocalValidity, StoredObject, TimedVote};
use crate::rate_check::{MasternodeRateRecord, RateCheckBuffer};
use crate::triggers::TriggerManager;
use keel_masternode::HostServices;
use keel_messages::{
    GovObjectType, GovernanceObject, GovernanceVote, Inventory, NetMessage, PeerAddr,
    REJECT_OBSOLETE,
};
use keel_network::{FulfilledRequestTracker, PeerId, PeerInfo, MISBEHAVIOR_PENALTY};
use keel_types::{ObjectHash, Outpoint, ProtocolParams, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Version string embedded in store snapshots; a mismatch on load drops
/// everything and rebuilds from the network.
pub const SERIALIZATION_VERSION: &str = "GovernanceManager-Version-1";

/// An object waiting for its signing masternode to appear.
#[derive(Clone, Debug)]
struct OrphanObject {
    stored: StoredObject,
    expires: Timestamp,
    from_peer: PeerId,
}

/// Persistent image of the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub version: String,
    erased: BTreeMap<ObjectHash, Timestamp>,
    invalid_votes: CacheMap<ObjectHash, GovernanceVote>,
    orphan_votes: CacheMultiMap<ObjectHash, TimedVote>,
    objects: BTreeMap<ObjectHash, StoredObject>,
    rate_records: BTreeMap<Outpoint, MasternodeRateRecord>,
}

/// The governance engine.
pub struct GovernanceManager {
    pub(crate) params: ProtocolParams,
    pub(crate) cached_height: u32,

    /// Canonical object store.
    pub(crate) objects: BTreeMap<ObjectHash, StoredObject>,
    /// Tombstones: hash → expiry. Proposals never expire.
    erased: BTreeMap<ObjectHash, Timestamp>,
    /// Objects whose signing masternode is unknown.
    mn_orphan_objects: BTreeMap<ObjectHash, OrphanObject>,
    /// Orphaned objects per masternode, to bound the damage one identity
    /// can do.
    mn_orphan_counter: HashMap<Outpoint, u32>,
    /// Objects whose collateral is still gathering confirmations.
    postponed: BTreeMap<ObjectHash, StoredObject>,
    /// Objects created too close to the future-deviation horizon; relayed
    /// again once they are safely inside it.
    additional_relay: BTreeSet<ObjectHash>,

    /// vote hash → parent object hash. Bounded; back-references only ever
    /// point at live objects.
    vote_to_object: CacheMap<ObjectHash, ObjectHash>,
    /// Votes that failed signature verification, so repeats are cheap.
    invalid_votes: CacheMap<ObjectHash, GovernanceVote>,
    /// Votes whose parent object is unknown, keyed by parent hash.
    orphan_votes: CacheMultiMap<ObjectHash, TimedVote>,

    /// Per-masternode trigger rate state.
    rate_records: BTreeMap<Outpoint, MasternodeRateRecord>,
    pub(crate) rate_checks_enabled: bool,

    /// Hashes we solicited; unsolicited payloads are refused.
    requested_objects: HashSet<ObjectHash>,
    requested_votes: HashSet<ObjectHash>,

    pub(crate) trigger_manager: TriggerManager,
    pub(crate) fulfilled: FulfilledRequestTracker,
    /// object hash → peers asked for its votes recently, with re-ask time.
    pub(crate) asked_recently: HashMap<ObjectHash, HashMap<PeerAddr, Timestamp>>,
}

impl GovernanceManager {
    pub fn new(params: ProtocolParams) -> Self {
        let max_cache = params.max_cache_size;
        Self {
            params,
            cached_height: 0,
            objects: BTreeMap::new(),
            erased: BTreeMap::new(),
            mn_orphan_objects: BTreeMap::new(),
            mn_orphan_counter: HashMap::new(),
            postponed: BTreeMap::new(),
            additional_relay: BTreeSet::new(),
            vote_to_object: CacheMap::new(max_cache),
            invalid_votes: CacheMap::new(max_cache),
            orphan_votes: CacheMultiMap::new(max_cache),
            rate_records: BTreeMap::new(),
            rate_checks_enabled: true,
            requested_objects: HashSet::new(),
            requested_votes: HashSet::new(),
            trigger_manager: TriggerManager::new(),
            fulfilled: FulfilledRequestTracker::default(),
            asked_recently: HashMap::new(),
        }
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
            NetMessage::GovernanceSync { hash, filter } => {
                if hash.is_zero() {
                    self.sync_all(peer, services);
                } else {
                    self.sync_one(peer, &hash, filter.as_ref(), services);
                }
            }
            NetMessage::GovernanceObject(object) => self.handle_object(peer, object, services),
            NetMessage::GovernanceVote(vote) => self.handle_vote(peer, vote, services),
            _ => {}
        }
    }

    // ── solicitation gate ──────────────────────────────────────────────

    /// Called by the host's inventory handler. Returns `true` when the
    /// advertised item is unknown and we want it fetched; the hash then
    /// goes into the requested set that gates acceptance.
    pub fn confirm_inventory_request(&mut self, inv: &Inventory) -> bool {
        match inv {
            Inventory::GovernanceObject(hash) => {
                if self.objects.contains_key(hash) || self.postponed.contains_key(hash) {
                    return false;
                }
                self.requested_objects.insert(*hash);
                true
            }
            Inventory::GovernanceVote(hash) => {
                if self.vote_to_object.has_key(hash) {
                    return false;
                }
                self.requested_votes.insert(*hash);
                true
            }
            Inventory::Transaction(_) => false,
        }
    }

    /// One accept per request: present exactly once, then forgotten.
    fn accept_object_message(&mut self, hash: &ObjectHash) -> bool {
        self.requested_objects.remove(hash)
    }

    fn accept_vote_message(&mut self, hash: &ObjectHash) -> bool {
        self.requested_votes.remove(hash)
    }

    // ── object ingestion ───────────────────────────────────────────────

    pub fn handle_object(
        &mut self,
        peer: &PeerInfo,
        object: GovernanceObject,
        services: &HostServices,
    ) {
        let stored = StoredObject::new(object);
        let hash = stored.hash();

        if !self.accept_object_message(&hash) {
            warn!(%hash, peer = %peer.addr, "received unrequested object");
            return;
        }

        if self.objects.contains_key(&hash)
            || self.postponed.contains_key(&hash)
            || self.erased.contains_key(&hash)
            || self.mn_orphan_objects.contains_key(&hash)
        {
            debug!(%hash, "received already seen object");
            return;
        }

        let (rate_ok, bypassed) = self.masternode_rate_check(&stored, true, false, services);
        if !rate_ok {
            warn!(%hash, height = self.cached_height, "masternode rate check failed");
            return;
        }

        let validity = stored.validate(services, &self.params, true);

        // A bypassed first pass must be re-checked (forced) once the
        // expensive validation work is done.
        if bypassed
            && matches!(
                validity,
                LocalValidity::Valid | LocalValidity::MissingMasternode(_)
            )
        {
            let (rate_ok, _) = self.masternode_rate_check(&stored, true, true, services);
            if !rate_ok {
                warn!(%hash, "masternode rate check failed after signature verification");
                return;
            }
        }

        match validity {
            LocalValidity::Valid => self.add_object(stored, services, Some(peer)),
            LocalValidity::MissingMasternode(reason) => {
                info!(%hash, %reason, "parking object until masternode appears");
                let outpoint = stored.object.masternode_outpoint;
                let expires = services
                    .clock
                    .adjusted()
                    .saturating_add(self.params.orphan_ttl_secs);
                self.mn_orphan_objects.insert(
                    hash,
                    OrphanObject {
                        stored,
                        expires,
                        from_peer: peer.id,
                    },
                );
                *self.mn_orphan_counter.entry(outpoint).or_insert(0) += 1;
            }
            LocalValidity::MissingConfirmations(reason) => {
                info!(%hash, %reason, "postponing object until collateral confirms");
                self.postponed.insert(hash, stored);
            }
            LocalValidity::Invalid(reason) => {
                warn!(%hash, %reason, "governance object is invalid");
                services.connman.misbehaving(peer.id, MISBEHAVIOR_PENALTY);
            }
        }
    }

    /// Insert a locally-valid object, relay it, and replay queued votes.
    pub(crate) fn add_object(
        &mut self,
        mut stored: StoredObject,
        services: &HostServices,
        from: Option<&PeerInfo>,
    ) {
        let hash = stored.hash();
        let now = services.clock.adjusted();

        stored.update_sentinel_flags(services.registry.active_count(), &self.params, now);

        if !matches!(
            stored.validate(services, &self.params, true),
            LocalValidity::Valid
        ) {
            warn!(%hash, height = self.cached_height, "refusing to add invalid object");
            return;
        }

        if self.objects.contains_key(&hash) {
            debug!(%hash, "already have governance object");
            return;
        }

        let object_type = stored.object_type;
        let outpoint = stored.object.masternode_outpoint;
        let created_time = stored.object.created_time;
        self.objects.insert(hash, stored);

        if object_type == GovObjectType::Trigger {
            let registered = self.trigger_manager.add_new_trigger(
                hash,
                &self.objects[&hash],
                self.cached_height,
                &self.params,
            );
            if !registered {
                debug!(%hash, "undo adding invalid trigger object");
                if let Some(object) = self.objects.get_mut(&hash) {
                    object.mark_for_deletion(now);
                }
                return;
            }
        }

        info!(
            %hash,
            from = from.map(|p| p.addr.to_string()).unwrap_or_else(|| "local".into()),
            "new governance object"
        );
        services
            .connman
            .relay_inv(Inventory::GovernanceObject(hash), self.params.min_protocol_version);

        self.masternode_rate_update(object_type, outpoint, created_time, hash, services);
        self.check_orphan_votes_for(hash, services);
    }

    /// Track a trigger in its masternode's rate buffer, and schedule an
    /// extra relay when its timestamp sits too close to the future horizon
    /// to have propagated reliably.
    fn masternode_rate_update(
        &mut self,
        object_type: GovObjectType,
        outpoint: Outpoint,
        created_time: Timestamp,
        hash: ObjectHash,
        services: &HostServices,
    ) {
        if object_type != GovObjectType::Trigger {
            return;
        }
        let now = services.clock.adjusted();
        let horizon = now.as_secs() + self.params.max_future_deviation_secs
            - self.params.reliable_propagation_secs;
        let near_horizon = created_time.as_secs() > horizon;

        let record = self.rate_records.entry(outpoint).or_default();
        record.trigger_buffer.add_timestamp(created_time.as_secs());
        record.status_ok = true;

        if near_horizon {
            self.additional_relay.insert(hash);
        }
    }

    /// Rate-limit trigger creation per masternode.
    ///
    /// Returns `(passed, bypassed)`. A non-forced call on a masternode
    /// with a clean latch is bypassed; the caller must re-check (forced)
    /// after signature verification before trusting the result.
    pub fn masternode_rate_check(
        &mut self,
        stored: &StoredObject,
        update_fail_status: bool,
        force: bool,
        services: &HostServices,
    ) -> (bool, bool) {
        if !self.rate_checks_enabled {
            return (true, false);
        }
        if stored.object_type != GovObjectType::Trigger {
            return (true, false);
        }

        let outpoint = stored.object.masternode_outpoint;
        let timestamp = stored.object.created_time.as_secs();
        let now = services.clock.adjusted().as_secs();
        let cycle_secs = self.params.superblock_cycle_secs();

        if timestamp + 2 * cycle_secs < now {
            warn!(
                hash = %stored.hash(),
                masternode = %outpoint,
                timestamp,
                now,
                "object rejected, timestamp too old"
            );
            return (false, false);
        }
        if timestamp > now + self.params.max_future_deviation_secs {
            warn!(
                hash = %stored.hash(),
                masternode = %outpoint,
                timestamp,
                now,
                "object rejected, timestamp too far in the future"
            );
            return (false, false);
        }

        let Some(record) = self.rate_records.get_mut(&outpoint) else {
            // first trigger from this masternode
            return (true, false);
        };

        if record.status_ok && !force {
            return (true, true);
        }

        // two triggers per cycle, with 10% slack
        let max_rate = 2.0 * 1.1 / cycle_secs as f64;

        // prospective rate with this object's timestamp included
        let mut buffer: RateCheckBuffer = record.trigger_buffer.clone();
        buffer.add_timestamp(timestamp);
        let rate = buffer.rate();

        if rate < max_rate {
            return (true, false);
        }

        warn!(
            hash = %stored.hash(),
            masternode = %outpoint,
            rate,
            max_rate,
            "masternode trigger rate too high"
        );
        if update_fail_status {
            record.status_ok = false;
        }
        (false, false)
    }

    // ── vote ingestion ─────────────────────────────────────────────────

    pub fn handle_vote(&mut self, peer: &PeerInfo, vote: GovernanceVote, services: &HostServices) {
        let hash = vote.hash();
        if !self.accept_vote_message(&hash) {
            debug!(%hash, peer = %peer.addr, "received unrequested vote");
            return;
        }

        match self.process_vote(Some(peer), &vote, services) {
            Ok(()) => {
                debug!(%hash, "new governance vote");
                services
                    .connman
                    .relay_inv(Inventory::GovernanceVote(hash), self.params.min_protocol_version);
            }
            Err(err) => {
                debug!(%hash, error = %err, "rejected vote");
                if err.penalty() > 0 {
                    services.connman.misbehaving(peer.id, err.penalty());
                }
            }
        }
    }

    pub fn process_vote(
        &mut self,
        from: Option<&PeerInfo>,
        vote: &GovernanceVote,
        services: &HostServices,
    ) -> Result<(), GovernanceError> {
        let vote_hash = vote.hash();
        let parent_hash = vote.parent_hash;

        if self.vote_to_object.has_key(&vote_hash) {
            return Err(GovernanceError::Benign(format!(
                "skipping known valid vote {vote_hash:?}"
            )));
        }
        if self.invalid_votes.has_key(&vote_hash) {
            return Err(GovernanceError::Permanent {
                reason: format!(
                    "old invalid vote, masternode = {}, object = {:?}",
                    vote.masternode_outpoint, parent_hash
                ),
                penalty: MISBEHAVIOR_PENALTY,
            });
        }

        if !self.objects.contains_key(&parent_hash) {
            let expiry = services
                .clock
                .adjusted()
                .saturating_add(self.params.orphan_ttl_secs);
            let inserted = self.orphan_votes.insert(parent_hash, (vote.clone(), expiry));
            if inserted {
                if let Some(peer) = from {
                    self.request_object(&peer.addr, &parent_hash, services, false);
                }
            }
            return Err(GovernanceError::Warning(format!(
                "unknown parent object {:?}, masternode = {}",
                parent_hash, vote.masternode_outpoint
            )));
        }

        let result = {
            let object = self
                .objects
                .get_mut(&parent_hash)
                .expect("presence checked above");
            if object.is_marked_for_deletion() {
                return Err(GovernanceError::Benign(format!(
                    "ignoring vote for expired or deleted object {parent_hash:?}"
                )));
            }
            object.process_vote(from, vote, services, self.rate_checks_enabled, &self.params)
        };

        match result {
            Ok(()) => {
                self.vote_to_object.insert(vote_hash, parent_hash);
                Ok(())
            }
            Err(err) => {
                if matches!(err, GovernanceError::InvalidSignature(_)) {
                    self.invalid_votes.insert(vote_hash, vote.clone());
                }
                Err(err)
            }
        }
    }

    /// Replay votes that arrived before their parent object.
    fn check_orphan_votes_for(&mut self, parent_hash: ObjectHash, services: &HostServices) {
        let pairs = self.orphan_votes.get_all(&parent_hash);
        if pairs.is_empty() {
            return;
        }
        let now = services.clock.adjusted();
        let previous = self.rate_checks_enabled;
        self.rate_checks_enabled = false;

        for pair in pairs {
            let mut remove = pair.1 < now;
            if !remove {
                let result = {
                    let Some(object) = self.objects.get_mut(&parent_hash) else {
                        break;
                    };
                    object.process_vote(None, &pair.0, services, false, &self.params)
                };
                if result.is_ok() {
                    let vote_hash = pair.0.hash();
                    self.vote_to_object.insert(vote_hash, parent_hash);
                    services
                        .connman
                        .relay_inv(Inventory::GovernanceVote(vote_hash), self.params.min_protocol_version);
                    remove = true;
                }
            }
            if remove {
                self.orphan_votes.erase(&parent_hash, &pair);
            }
        }

        self.rate_checks_enabled = previous;
    }

    // ── housekeeping ───────────────────────────────────────────────────

    /// The ~5-minute maintenance pass.
    pub fn tick(&mut self, services: &HostServices) {
        if services.chain.initial_block_download() {
            return;
        }
        let now = services.clock.adjusted();
        self.clean_orphan_votes(now);
        self.request_orphan_objects(services);
        self.check_orphan_objects(services);
        self.update_caches_and_clean(services);
    }

    pub fn updated_block_tip(&mut self, height: u32, services: &HostServices) {
        if services.chain.initial_block_download() {
            return;
        }
        self.cached_height = height;
        debug!(height, "governance saw new tip");
        self.check_postponed_objects(services);
    }

    /// Drop expired orphan votes.
    pub fn clean_orphan_votes(&mut self, now: Timestamp) {
        self.orphan_votes.retain(|_, (_, expiry)| *expiry >= now);
    }

    /// Retry objects parked for a missing masternode; expired entries
    /// penalize whoever sent them.
    pub fn check_orphan_objects(&mut self, services: &HostServices) {
        let now = services.clock.adjusted();
        let previous = self.rate_checks_enabled;
        self.rate_checks_enabled = false;

        let hashes: Vec<ObjectHash> = self.mn_orphan_objects.keys().copied().collect();
        for hash in hashes {
            let (validity, alive, from_peer, outpoint) = {
                let orphan = &self.mn_orphan_objects[&hash];
                (
                    orphan.stored.validate(services, &self.params, true),
                    orphan.expires >= now,
                    orphan.from_peer,
                    orphan.stored.object.masternode_outpoint,
                )
            };

            if alive && matches!(validity, LocalValidity::MissingMasternode(_)) {
                continue;
            }

            let orphan = self
                .mn_orphan_objects
                .remove(&hash)
                .expect("key collected above");
            if let Some(count) = self.mn_orphan_counter.get_mut(&outpoint) {
                *count -= 1;
                if *count == 0 {
                    self.mn_orphan_counter.remove(&outpoint);
                }
            }

            if !alive {
                services.connman.misbehaving(from_peer, MISBEHAVIOR_PENALTY);
                continue;
            }
            if matches!(validity, LocalValidity::Valid) {
                self.add_object(orphan.stored, services, None);
            }
        }

        self.rate_checks_enabled = previous;
    }

    /// Promote postponed objects whose collateral has confirmed, and run
    /// scheduled additional relays.
    pub fn check_postponed_objects(&mut self, services: &HostServices) {
        let hashes: Vec<ObjectHash> = self.postponed.keys().copied().collect();
        for hash in hashes {
            let validity = self.postponed[&hash].validate(services, &self.params, true);
            match validity {
                LocalValidity::MissingConfirmations(_) => {}
                LocalValidity::Valid => {
                    let stored = self.postponed.remove(&hash).expect("key collected above");
                    self.add_object(stored, services, None);
                }
                _ => {
                    info!(%hash, "dropping postponed object, no longer valid");
                    self.postponed.remove(&hash);
                }
            }
        }

        let now = services.clock.adjusted().as_secs();
        let max_dev = self.params.max_future_deviation_secs;
        let cycle = self.params.superblock_cycle_secs();
        let relay_candidates: Vec<ObjectHash> = self.additional_relay.iter().copied().collect();
        for hash in relay_candidates {
            let mut remove = true;
            if let Some(object) = self.objects.get(&hash) {
                let ts = object.object.created_time.as_secs();
                let in_window = ts <= now + max_dev && ts + 2 * cycle >= now;
                let propagated = ts + self.params.reliable_propagation_secs <= now + max_dev;
                if in_window {
                    if propagated {
                        info!(%hash, "additional relay");
                        services.connman.relay_inv(
                            Inventory::GovernanceObject(hash),
                            self.params.min_protocol_version,
                        );
                    } else {
                        remove = false;
                    }
                }
            } else {
                debug!(%hash, "additional relay of unknown object");
            }
            if remove {
                self.additional_relay.remove(&hash);
            }
        }
    }

    /// Recompute derived state and evict what has been condemned long
    /// enough.
    pub fn update_caches_and_clean(&mut self, services: &HostServices) {
        debug!("governance cache maintenance");
        let now = services.clock.adjusted();

        for hash in services.registry.take_dirty_object_hashes() {
            if let Some(object) = self.objects.get_mut(&hash) {
                object.clear_removed_masternode_votes(services);
                object.dirty_cache = true;
            }
        }

        let previous = self.rate_checks_enabled;
        self.rate_checks_enabled = false;

        for hash in self.trigger_manager.clean_and_remove(self.cached_height) {
            if let Some(object) = self.objects.get_mut(&hash) {
                info!(%hash, "trigger past its event height, latching expired");
                object.mark_expired(now);
            }
        }

        let active = services.registry.active_count();
        let hashes: Vec<ObjectHash> = self.objects.keys().copied().collect();
        for hash in hashes {
            let mut evict = false;
            let mut tombstone_expiry = Timestamp::MAX;
            {
                let Some(object) = self.objects.get_mut(&hash) else {
                    continue;
                };

                if object.dirty_cache {
                    object.update_sentinel_flags(active, &self.params, now);
                }

                let since_deletion = object.deletion_time.elapsed_since(now);
                if object.is_marked_for_deletion()
                    && since_deletion >= self.params.deletion_delay_secs
                {
                    evict = true;
                    tombstone_expiry = match object.object_type {
                        // keep hashes of deleted proposals forever
                        GovObjectType::Proposal => Timestamp::MAX,
                        _ => object
                            .object
                            .created_time
                            .saturating_add(2 * self.params.superblock_cycle_secs())
                            .saturating_add(self.params.deletion_delay_secs),
                    };
                } else if object.object_type == GovObjectType::Proposal {
                    // proposals that stop validating are latched for
                    // deletion on the next pass
                    if !matches!(
                        object.validate(services, &self.params, false),
                        LocalValidity::Valid
                    ) {
                        info!(%hash, "proposal no longer valid, latching for deletion");
                        object.mark_for_deletion(now);
                    }
                }
            }

            if evict {
                info!(%hash, "erasing governance object");
                services.registry.remove_object_references(&hash);
                self.vote_to_object.retain(|_, parent| *parent != hash);
                self.erased.insert(hash, tombstone_expiry);
                self.objects.remove(&hash);
            }
        }

        self.erased.retain(|_, expiry| *expiry >= now);
        self.rate_checks_enabled = previous;

        info!(
            objects = self.objects.len(),
            erased = self.erased.len(),
            votes = self.vote_to_object.len(),
            "governance store state"
        );
    }

    // ── accessors ──────────────────────────────────────────────────────

    pub fn have_object(&self, hash: &ObjectHash) -> bool {
        self.objects.contains_key(hash) || self.postponed.contains_key(hash)
    }

    pub fn have_vote(&self, hash: &ObjectHash) -> bool {
        match self.vote_to_object.get(hash) {
            Some(parent) => self
                .objects
                .get(parent)
                .is_some_and(|object| object.has_vote(hash)),
            None => false,
        }
    }

    pub fn find_object(&self, hash: &ObjectHash) -> Option<&StoredObject> {
        self.objects.get(hash)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn vote_count(&self) -> usize {
        self.vote_to_object.len()
    }

    pub fn rate_record(&self, outpoint: &Outpoint) -> Option<&MasternodeRateRecord> {
        self.rate_records.get(outpoint)
    }

    pub fn is_erased(&self, hash: &ObjectHash) -> bool {
        self.erased.contains_key(hash)
    }

    pub fn is_postponed(&self, hash: &ObjectHash) -> bool {
        self.postponed.contains_key(hash)
    }

    pub fn orphan_vote_count(&self) -> usize {
        self.orphan_votes.len()
    }

    /// Parent hashes with at least one orphaned vote.
    pub(crate) fn orphan_vote_parent_hashes(&self) -> Vec<ObjectHash> {
        self.orphan_votes.keys()
    }

    /// All stored votes for an object.
    pub fn matching_votes(&self, parent: &ObjectHash) -> Vec<GovernanceVote> {
        self.objects
            .get(parent)
            .map(|object| object.votes())
            .unwrap_or_default()
    }

    /// Current (latest-per-signal) votes for an object, optionally for one
    /// masternode. Reconstructed from vote records, so unsigned.
    pub fn current_votes(
        &self,
        parent: &ObjectHash,
        outpoint_filter: Option<&Outpoint>,
    ) -> Vec<GovernanceVote> {
        let Some(object) = self.objects.get(parent) else {
            return Vec::new();
        };
        let outpoints: Vec<Outpoint> = match outpoint_filter {
            Some(outpoint) => vec![*outpoint],
            None => object.voting_outpoints(),
        };
        let mut votes = Vec::new();
        for outpoint in outpoints {
            let Some(record) = object.masternode_votes(&outpoint) else {
                continue;
            };
            for (signal, instance) in &record.instances {
                votes.push(GovernanceVote::new(
                    outpoint,
                    *parent,
                    *signal,
                    instance.outcome,
                    instance.creation_time,
                ));
            }
        }
        votes
    }

    // ── persistence ────────────────────────────────────────────────────

    pub fn snapshot(&self) -> GovernanceSnapshot {
        GovernanceSnapshot {
            version: SERIALIZATION_VERSION.to_string(),
            erased: self.erased.clone(),
            invalid_votes: self.invalid_votes.clone(),
            orphan_votes: self.orphan_votes.clone(),
            objects: self.objects.clone(),
            rate_records: self.rate_records.clone(),
        }
    }

    /// Load a snapshot. A version mismatch clears the store instead;
    /// rebuilding from the network beats guessing at a migration.
    pub fn restore(&mut self, snapshot: GovernanceSnapshot, services: &HostServices) -> bool {
        if snapshot.version != SERIALIZATION_VERSION {
            warn!(
                found = %snapshot.version,
                expected = SERIALIZATION_VERSION,
                "snapshot version mismatch, clearing governance store"
            );
            self.clear();
            return false;
        }
        self.erased = snapshot.erased;
        self.invalid_votes = snapshot.invalid_votes;
        self.orphan_votes = snapshot.orphan_votes;
        self.objects = snapshot.objects;
        self.rate_records = snapshot.rate_records;
        self.init_on_load(services);
        true
    }

    /// Rebuild derived indexes after a load: the vote index from each
    /// object's vote file, and trigger registrations (failures latch
    /// deletion as usual). Everything is marked dirty so the next
    /// maintenance pass revalidates.
    fn init_on_load(&mut self, services: &HostServices) {
        info!("rebuilding governance indexes and triggers");
        self.vote_to_object.clear();
        let now = services.clock.adjusted();

        let hashes: Vec<ObjectHash> = self.objects.keys().copied().collect();
        for hash in &hashes {
            let vote_hashes: Vec<ObjectHash> = {
                let object = &self.objects[hash];
                object.vote_hashes().copied().collect()
            };
            for vote_hash in vote_hashes {
                self.vote_to_object.insert(vote_hash, *hash);
            }
            self.objects
                .get_mut(hash)
                .expect("key collected above")
                .dirty_cache = true;
        }

        for hash in hashes {
            if self.objects[&hash].object_type != GovObjectType::Trigger {
                continue;
            }
            let registered = self.trigger_manager.add_new_trigger(
                hash,
                &self.objects[&hash],
                self.cached_height,
                &self.params,
            );
            if !registered {
                self.objects
                    .get_mut(&hash)
                    .expect("key collected above")
                    .mark_for_deletion(now);
            }
        }
    }

    pub fn clear(&mut self) {
        info!("governance store cleared");
        self.objects.clear();
        self.erased.clear();
        self.mn_orphan_objects.clear();
        self.mn_orphan_counter.clear();
        self.postponed.clear();
        self.additional_relay.clear();
        self.vote_to_object.clear();
        self.invalid_votes.clear();
        self.orphan_votes.clear();
        self.rate_records.clear();
        self.trigger_manager.clear();
        self.asked_recently.clear();
    }
}
