//! A governance object as the store holds it: the immutable wire record
//! plus vote state, derived sentinel flags, and local validity.

use crate::cache_multimap::CacheMultiMap;
use crate::error::GovernanceError;
use keel_masternode::HostServices;
use keel_messages::{
    GovObjectType, GovernanceObject, GovernanceVote, ObjectPayload, VoteOutcome, VoteSignal,
};
use keel_network::PeerInfo;
use keel_transactions::Script;
use keel_types::{Amount, ObjectHash, Outpoint, ProtocolParams, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Bound on per-object votes parked while their masternode is unknown.
const OBJECT_ORPHAN_VOTE_BOUND: usize = 10_000;

/// Outcome of checking an object against local state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocalValidity {
    Valid,
    /// The signing masternode is not in the registry yet.
    MissingMasternode(String),
    /// The collateral is real but too young; park and re-check.
    MissingConfirmations(String),
    Invalid(String),
}

/// Outcome of checking a proposal's collateral transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
enum CollateralStatus {
    Valid,
    MissingConfirmations(String),
    Invalid(String),
}

/// One masternode's latest vote for one signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoteInstance {
    pub outcome: VoteOutcome,
    /// When we last accepted an update for this (object, signal) pair;
    /// the throttle clock.
    pub vote_time: Timestamp,
    /// The vote's own timestamp; older submissions are obsolete.
    pub creation_time: Timestamp,
}

/// All signals one masternode has voted on for one object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub instances: BTreeMap<VoteSignal, VoteInstance>,
}

/// A vote waiting for its masternode to appear, with its expiry.
pub type TimedVote = (GovernanceVote, Timestamp);

/// A governance object held by the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredObject {
    pub object: GovernanceObject,
    pub object_type: GovObjectType,

    /// When the delete/expired latch was set; eviction happens
    /// `DELETION_DELAY` later.
    pub deletion_time: Timestamp,

    // Sentinel flags, recomputed from vote tallies.
    pub cached_funding: bool,
    pub cached_valid: bool,
    pub cached_delete: bool,
    pub cached_endorsed: bool,
    pub expired: bool,
    pub unparsable: bool,

    /// Set whenever vote state changes; cleared by sentinel recomputation.
    /// Not persisted: a reloaded store revalidates everything.
    #[serde(skip)]
    pub dirty_cache: bool,

    /// Latest vote per (masternode, signal).
    current_votes: BTreeMap<Outpoint, VoteRecord>,
    /// Every accepted vote by hash; what sync serves to peers.
    votes: BTreeMap<ObjectHash, GovernanceVote>,
    /// Votes whose masternode is unknown, keyed by that masternode.
    orphan_votes: CacheMultiMap<Outpoint, TimedVote>,
}

impl StoredObject {
    pub fn new(object: GovernanceObject) -> Self {
        let payload = object.payload();
        let object_type = payload
            .as_ref()
            .map(|p| p.object_type())
            .unwrap_or(GovObjectType::Unknown);
        let unparsable = payload.is_none();
        Self {
            object,
            object_type,
            deletion_time: Timestamp::EPOCH,
            cached_funding: false,
            cached_valid: true,
            cached_delete: false,
            cached_endorsed: false,
            expired: false,
            unparsable,
            dirty_cache: true,
            current_votes: BTreeMap::new(),
            votes: BTreeMap::new(),
            orphan_votes: CacheMultiMap::new(OBJECT_ORPHAN_VOTE_BOUND),
        }
    }

    pub fn hash(&self) -> ObjectHash {
        self.object.hash()
    }

    /// Delete/expired latch, used by sync and vote gating.
    pub fn is_marked_for_deletion(&self) -> bool {
        self.cached_delete || self.expired
    }

    /// Latch deletion; the first latch pins the deletion time.
    pub fn mark_for_deletion(&mut self, now: Timestamp) {
        self.cached_delete = true;
        if self.deletion_time == Timestamp::EPOCH {
            self.deletion_time = now;
        }
    }

    /// Latch expiry; same delay discipline as deletion.
    pub fn mark_expired(&mut self, now: Timestamp) {
        self.expired = true;
        if self.deletion_time == Timestamp::EPOCH {
            self.deletion_time = now;
        }
    }

    // ── votes ──────────────────────────────────────────────────────────

    pub fn has_vote(&self, hash: &ObjectHash) -> bool {
        self.votes.contains_key(hash)
    }

    pub fn get_vote(&self, hash: &ObjectHash) -> Option<&GovernanceVote> {
        self.votes.get(hash)
    }

    pub fn vote_hashes(&self) -> impl Iterator<Item = &ObjectHash> {
        self.votes.keys()
    }

    pub fn votes(&self) -> Vec<GovernanceVote> {
        self.votes.values().cloned().collect()
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    /// The vote record for one masternode, if it has voted.
    pub fn masternode_votes(&self, outpoint: &Outpoint) -> Option<&VoteRecord> {
        self.current_votes.get(outpoint)
    }

    /// Every masternode that has voted on this object.
    pub fn voting_outpoints(&self) -> Vec<Outpoint> {
        self.current_votes.keys().copied().collect()
    }

    /// Process one vote against this object.
    ///
    /// Ordering is deliberate: cheap drops first, the update-interval
    /// throttle next, signature verification last because it is the
    /// expensive step.
    pub fn process_vote(
        &mut self,
        from: Option<&PeerInfo>,
        vote: &GovernanceVote,
        services: &HostServices,
        rate_checks_enabled: bool,
        params: &ProtocolParams,
    ) -> Result<(), GovernanceError> {
        if self.votes.contains_key(&vote.hash()) {
            return Err(GovernanceError::Benign(format!(
                "already known valid vote {:?}",
                vote.hash()
            )));
        }

        let outpoint = vote.masternode_outpoint;
        let now = services.clock.adjusted();

        let Some(mn_info) = services.registry.lookup(&outpoint) else {
            let inserted = self
                .orphan_votes
                .insert(outpoint, (vote.clone(), now.saturating_add(params.orphan_ttl_secs)));
            if inserted {
                if let Some(peer) = from {
                    services.registry.ask_for(&peer.addr, &outpoint);
                }
            }
            return Err(GovernanceError::Warning(format!(
                "masternode {} not found",
                outpoint
            )));
        };

        let existing = self
            .current_votes
            .get(&outpoint)
            .and_then(|record| record.instances.get(&vote.signal))
            .cloned();

        if let Some(instance) = &existing {
            // Obsolete: strictly older than what we already hold.
            if vote.timestamp < instance.creation_time {
                return Err(GovernanceError::Benign("obsolete vote".into()));
            }
            if rate_checks_enabled {
                let delta = instance.vote_time.elapsed_since(now);
                if delta < params.update_min_secs {
                    return Err(GovernanceError::Temporary(format!(
                        "masternode {} voting too often, time delta = {}",
                        outpoint, delta
                    )));
                }
            }
        }

        // Expensive step last.
        if !vote.verify(&mn_info.pubkey) {
            return Err(GovernanceError::InvalidSignature(format!(
                "invalid vote signature, masternode = {}, vote = {:?}",
                outpoint,
                vote.hash()
            )));
        }

        if !services.registry.record_vote(&outpoint, &vote.parent_hash) {
            return Err(GovernanceError::Permanent {
                reason: format!("unable to record vote for masternode {}", outpoint),
                penalty: 0,
            });
        }

        self.current_votes
            .entry(outpoint)
            .or_default()
            .instances
            .insert(
                vote.signal,
                VoteInstance {
                    outcome: vote.outcome,
                    vote_time: now,
                    creation_time: vote.timestamp,
                },
            );
        self.votes.insert(vote.hash(), vote.clone());
        self.dirty_cache = true;
        Ok(())
    }

    /// Retry votes parked for a then-unknown masternode. Returns the votes
    /// that were accepted (the caller relays them).
    pub fn check_orphan_votes(
        &mut self,
        services: &HostServices,
        params: &ProtocolParams,
    ) -> Vec<GovernanceVote> {
        let now = services.clock.adjusted();
        let mut replayed = Vec::new();
        let mut resolved: Vec<(Outpoint, TimedVote)> = Vec::new();

        for outpoint in self.orphan_votes.keys() {
            for pair in self.orphan_votes.get_all(&outpoint) {
                if pair.1 < now {
                    resolved.push((outpoint, pair));
                    continue;
                }
                if !services.registry.has(&outpoint) {
                    continue;
                }
                // Rate checks stay off during replay; the votes were
                // throttle-checked when they first arrived.
                match self.process_vote(None, &pair.0, services, false, params) {
                    Ok(()) => {
                        replayed.push(pair.0.clone());
                        resolved.push((outpoint, pair));
                    }
                    Err(err) => {
                        debug!(error = %err, "failed to replay orphan vote");
                    }
                }
            }
        }

        for (outpoint, pair) in &resolved {
            self.orphan_votes.erase(outpoint, pair);
        }
        replayed
    }

    /// Drop votes from masternodes no longer in the registry.
    pub fn clear_removed_masternode_votes(&mut self, services: &HostServices) {
        let gone: Vec<Outpoint> = self
            .current_votes
            .keys()
            .filter(|outpoint| !services.registry.has(outpoint))
            .copied()
            .collect();
        if gone.is_empty() {
            return;
        }
        for outpoint in &gone {
            self.votes.retain(|_, vote| vote.masternode_outpoint != *outpoint);
            self.current_votes.remove(outpoint);
        }
        self.dirty_cache = true;
    }

    // ── tallies and sentinel flags ─────────────────────────────────────

    pub fn count_matching_votes(&self, signal: VoteSignal, outcome: VoteOutcome) -> isize {
        self.current_votes
            .values()
            .filter(|record| {
                record
                    .instances
                    .get(&signal)
                    .is_some_and(|instance| instance.outcome == outcome)
            })
            .count() as isize
    }

    pub fn yes_count(&self, signal: VoteSignal) -> isize {
        self.count_matching_votes(signal, VoteOutcome::Yes)
    }

    pub fn no_count(&self, signal: VoteSignal) -> isize {
        self.count_matching_votes(signal, VoteOutcome::No)
    }

    pub fn abstain_count(&self, signal: VoteSignal) -> isize {
        self.count_matching_votes(signal, VoteOutcome::Abstain)
    }

    pub fn absolute_yes_count(&self, signal: VoteSignal) -> isize {
        self.yes_count(signal) - self.no_count(signal)
    }

    pub fn absolute_no_count(&self, signal: VoteSignal) -> isize {
        self.no_count(signal) - self.yes_count(signal)
    }

    /// Recompute the sentinel flags from current tallies.
    ///
    /// `funding` and `endorsed` toggle with support; `delete` latches and
    /// pins the deletion time; `valid` defaults true and clears when the
    /// no-votes reach quorum.
    pub fn update_sentinel_flags(
        &mut self,
        active_masternodes: usize,
        params: &ProtocolParams,
        now: Timestamp,
    ) {
        if active_masternodes == 0 {
            return;
        }

        let abs_vote_req = params.min_quorum.max(active_masternodes / 10) as isize;
        let abs_delete_req = params.min_quorum.max(2 * active_masternodes / 3) as isize;

        self.cached_valid = true;
        self.cached_endorsed = false;

        self.cached_funding = self.absolute_yes_count(VoteSignal::Funding) >= abs_vote_req;

        if self.absolute_yes_count(VoteSignal::Delete) >= abs_delete_req && !self.cached_delete {
            self.mark_for_deletion(now);
        }

        self.cached_endorsed = self.absolute_yes_count(VoteSignal::Endorsed) >= abs_vote_req;

        if self.absolute_no_count(VoteSignal::Valid) >= abs_vote_req {
            self.cached_valid = false;
        }

        self.dirty_cache = false;
    }

    // ── local validity ─────────────────────────────────────────────────

    /// The burn fee this object's collateral must pay.
    pub fn min_collateral_fee(&self, params: &ProtocolParams) -> Amount {
        match self.object_type {
            GovObjectType::Proposal => params.proposal_fee,
            GovObjectType::Trigger => Amount::ZERO,
            GovObjectType::Unknown => Amount::new(i64::MAX),
        }
    }

    /// Check the object against local chain and registry state.
    pub fn validate(
        &self,
        services: &HostServices,
        params: &ProtocolParams,
        check_collateral: bool,
    ) -> LocalValidity {
        if self.unparsable {
            return LocalValidity::Invalid("object data unparsable".into());
        }

        match self.object_type {
            GovObjectType::Proposal => {
                let Some(ObjectPayload::Proposal(payload)) = self.object.payload() else {
                    return LocalValidity::Invalid("proposal payload missing".into());
                };
                if !payload.is_well_formed() {
                    return LocalValidity::Invalid("invalid proposal data".into());
                }
                if check_collateral {
                    match self.collateral_status(services, params) {
                        CollateralStatus::Valid => {}
                        CollateralStatus::MissingConfirmations(reason) => {
                            return LocalValidity::MissingConfirmations(reason)
                        }
                        CollateralStatus::Invalid(reason) => {
                            return LocalValidity::Invalid(format!(
                                "invalid proposal collateral: {reason}"
                            ))
                        }
                    }
                }
                LocalValidity::Valid
            }
            GovObjectType::Trigger => {
                if !check_collateral {
                    // nothing else checkable without the registry round trip
                    return LocalValidity::Valid;
                }
                let outpoint = self.object.masternode_outpoint;
                let Some(mn_info) = services.registry.lookup(&outpoint) else {
                    return LocalValidity::MissingMasternode(format!(
                        "masternode not found: {}",
                        outpoint
                    ));
                };
                if !self.object.verify(&mn_info.pubkey) {
                    return LocalValidity::Invalid(format!(
                        "invalid masternode signature for {}",
                        outpoint
                    ));
                }
                LocalValidity::Valid
            }
            GovObjectType::Unknown => LocalValidity::Invalid("invalid object type".into()),
        }
    }

    /// Proof-of-burn collateral check: the collateral transaction must pay
    /// at least the minimum fee into an OP_RETURN committing to this
    /// object's hash, and must be buried deep enough.
    fn collateral_status(
        &self,
        services: &HostServices,
        params: &ProtocolParams,
    ) -> CollateralStatus {
        let min_fee = self.min_collateral_fee(params);
        let expected_script = Script::burn_commitment(&self.hash());

        let Some((tx, tx_height)) = services.chain.get_transaction(&self.object.collateral_txid)
        else {
            return CollateralStatus::Invalid(format!(
                "can't find collateral tx {}",
                self.object.collateral_txid
            ));
        };

        if tx.outputs.is_empty() {
            return CollateralStatus::Invalid("collateral tx has no outputs".into());
        }

        let found = tx
            .outputs
            .iter()
            .any(|out| out.script == expected_script && out.value >= min_fee);
        if !found {
            return CollateralStatus::Invalid(format!(
                "couldn't find burn output for {:?}",
                self.hash()
            ));
        }

        let confirmations = match tx_height {
            Some(height) => services.chain.height().saturating_sub(height) + 1,
            None => 0,
        };

        if confirmations < params.collateral_confirmations {
            let reason = format!(
                "collateral requires at least {} confirmations (it has {})",
                params.collateral_confirmations, confirmations
            );
            if confirmations >= params.min_relay_confirmations {
                info!(%reason, "collateral pre-accepted, waiting for confirmations");
                return CollateralStatus::MissingConfirmations(reason);
            }
            return CollateralStatus::Invalid(reason);
        }

        CollateralStatus::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_crypto::keypair_from_seed;
    use keel_messages::{ProposalPayload, TriggerPayload};
    use keel_nullables::NullHosts;
    use keel_types::{TxHash, DENOM_LOW};

    fn mn_outpoint(byte: u8) -> Outpoint {
        Outpoint::new(TxHash::new([byte; 32]), 0)
    }

    fn proposal_object() -> GovernanceObject {
        GovernanceObject {
            parent_hash: ObjectHash::ZERO,
            revision: 1,
            created_time: Timestamp::new(1_700_000_000),
            collateral_txid: TxHash::new([9; 32]),
            data: ObjectPayload::Proposal(ProposalPayload {
                name: "relay-upgrade".into(),
                url: "https://forum.example/p/9".into(),
                payment_script: Script::PayToKeyHash([1; 20]),
                payment_amount: Amount::new(DENOM_LOW),
                start_time: Timestamp::new(1_700_000_000),
                end_time: Timestamp::new(1_800_000_000),
            })
            .encode(),
            masternode_outpoint: Outpoint::NULL,
            signature: None,
        }
    }

    fn trigger_object(outpoint: Outpoint) -> GovernanceObject {
        GovernanceObject {
            parent_hash: ObjectHash::ZERO,
            revision: 1,
            created_time: Timestamp::new(1_700_000_000),
            collateral_txid: TxHash::ZERO,
            data: ObjectPayload::Trigger(TriggerPayload {
                event_height: 1000,
                payments: vec![(Script::PayToKeyHash([2; 20]), Amount::new(10))],
            })
            .encode(),
            masternode_outpoint: outpoint,
            signature: None,
        }
    }

    fn signed_vote(
        seed: u8,
        outpoint: Outpoint,
        parent: ObjectHash,
        signal: VoteSignal,
        outcome: VoteOutcome,
        time: u64,
    ) -> GovernanceVote {
        let kp = keypair_from_seed(&[seed; 32]);
        let mut vote = GovernanceVote::new(outpoint, parent, signal, outcome, Timestamp::new(time));
        vote.sign(&kp.private);
        vote
    }

    fn register_mn(hosts: &NullHosts, seed: u8, outpoint: Outpoint) {
        let kp = keypair_from_seed(&[seed; 32]);
        hosts.registry.add(
            outpoint,
            keel_messages::PeerAddr::new(format!("10.0.0.{seed}"), 9999),
            kp.public,
        );
    }

    #[test]
    fn parses_object_type_on_construction() {
        let stored = StoredObject::new(proposal_object());
        assert_eq!(stored.object_type, GovObjectType::Proposal);
        assert!(!stored.unparsable);

        let mut garbage = proposal_object();
        garbage.data = vec![0xFF];
        let stored = StoredObject::new(garbage);
        assert_eq!(stored.object_type, GovObjectType::Unknown);
        assert!(stored.unparsable);
    }

    #[test]
    fn accepts_valid_vote() {
        let hosts = NullHosts::new();
        let services = hosts.services();
        let params = ProtocolParams::default();
        let outpoint = mn_outpoint(1);
        register_mn(&hosts, 1, outpoint);

        let mut stored = StoredObject::new(proposal_object());
        let vote = signed_vote(
            1,
            outpoint,
            stored.hash(),
            VoteSignal::Funding,
            VoteOutcome::Yes,
            1_700_000_100,
        );
        stored
            .process_vote(None, &vote, &services, true, &params)
            .unwrap();
        assert!(stored.has_vote(&vote.hash()));
        assert_eq!(stored.yes_count(VoteSignal::Funding), 1);
        assert_eq!(hosts.registry.recorded_votes().len(), 1);
    }

    #[test]
    fn duplicate_vote_is_benign() {
        let hosts = NullHosts::new();
        let services = hosts.services();
        let params = ProtocolParams::default();
        let outpoint = mn_outpoint(1);
        register_mn(&hosts, 1, outpoint);

        let mut stored = StoredObject::new(proposal_object());
        let vote = signed_vote(
            1,
            outpoint,
            stored.hash(),
            VoteSignal::Funding,
            VoteOutcome::Yes,
            1_700_000_100,
        );
        stored
            .process_vote(None, &vote, &services, true, &params)
            .unwrap();
        let err = stored
            .process_vote(None, &vote, &services, true, &params)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Benign(_)));
    }

    #[test]
    fn unknown_masternode_parks_vote_and_asks() {
        let hosts = NullHosts::new();
        let services = hosts.services();
        let params = ProtocolParams::default();
        let outpoint = mn_outpoint(1);

        let mut stored = StoredObject::new(proposal_object());
        let vote = signed_vote(
            1,
            outpoint,
            stored.hash(),
            VoteSignal::Funding,
            VoteOutcome::Yes,
            1_700_000_100,
        );
        let peer = PeerInfo::new(7, keel_messages::PeerAddr::new("10.1.1.1", 9999), 70017);
        let err = stored
            .process_vote(Some(&peer), &vote, &services, true, &params)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Warning(_)));
        assert_eq!(hosts.registry.asked_for().len(), 1);
        assert!(!stored.has_vote(&vote.hash()));
    }

    #[test]
    fn orphan_votes_replay_when_masternode_appears() {
        let hosts = NullHosts::new();
        let services = hosts.services();
        let params = ProtocolParams::default();
        let outpoint = mn_outpoint(1);

        let mut stored = StoredObject::new(proposal_object());
        let vote = signed_vote(
            1,
            outpoint,
            stored.hash(),
            VoteSignal::Funding,
            VoteOutcome::Yes,
            1_700_000_100,
        );
        stored
            .process_vote(None, &vote, &services, true, &params)
            .unwrap_err();

        register_mn(&hosts, 1, outpoint);
        let replayed = stored.check_orphan_votes(&services, &params);
        assert_eq!(replayed.len(), 1);
        assert!(stored.has_vote(&vote.hash()));

        // replay is one-shot
        assert!(stored.check_orphan_votes(&services, &params).is_empty());
    }

    #[test]
    fn obsolete_vote_dropped_without_penalty() {
        let hosts = NullHosts::new();
        let services = hosts.services();
        let mut params = ProtocolParams::default();
        params.update_min_secs = 0;
        let outpoint = mn_outpoint(1);
        register_mn(&hosts, 1, outpoint);

        let mut stored = StoredObject::new(proposal_object());
        let newer = signed_vote(
            1,
            outpoint,
            stored.hash(),
            VoteSignal::Funding,
            VoteOutcome::Yes,
            1_700_000_200,
        );
        stored
            .process_vote(None, &newer, &services, true, &params)
            .unwrap();

        let older = signed_vote(
            1,
            outpoint,
            stored.hash(),
            VoteSignal::Funding,
            VoteOutcome::No,
            1_700_000_100,
        );
        let err = stored
            .process_vote(None, &older, &services, true, &params)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Benign(_)));
        assert_eq!(err.penalty(), 0);
    }

    #[test]
    fn update_throttled_by_min_interval() {
        let hosts = NullHosts::new();
        let services = hosts.services();
        let params = ProtocolParams::default();
        let outpoint = mn_outpoint(1);
        register_mn(&hosts, 1, outpoint);

        let mut stored = StoredObject::new(proposal_object());
        let first = signed_vote(
            1,
            outpoint,
            stored.hash(),
            VoteSignal::Funding,
            VoteOutcome::Yes,
            1_700_000_100,
        );
        stored
            .process_vote(None, &first, &services, true, &params)
            .unwrap();

        let update = signed_vote(
            1,
            outpoint,
            stored.hash(),
            VoteSignal::Funding,
            VoteOutcome::No,
            1_700_000_200,
        );
        let err = stored
            .process_vote(None, &update, &services, true, &params)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Temporary(_)));

        // after the interval the update lands
        hosts.clock.advance(params.update_min_secs);
        stored
            .process_vote(None, &update, &services, true, &params)
            .unwrap();
        assert_eq!(stored.no_count(VoteSignal::Funding), 1);
        assert_eq!(stored.yes_count(VoteSignal::Funding), 0);
    }

    #[test]
    fn bad_signature_is_permanent() {
        let hosts = NullHosts::new();
        let services = hosts.services();
        let params = ProtocolParams::default();
        let outpoint = mn_outpoint(1);
        register_mn(&hosts, 1, outpoint);

        let mut stored = StoredObject::new(proposal_object());
        // signed with seed 2, registered under seed 1
        let vote = signed_vote(
            2,
            outpoint,
            stored.hash(),
            VoteSignal::Funding,
            VoteOutcome::Yes,
            1_700_000_100,
        );
        let err = stored
            .process_vote(None, &vote, &services, true, &params)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidSignature(_)));
        assert_eq!(err.penalty(), 20);
    }

    #[test]
    fn sentinel_funding_threshold() {
        let hosts = NullHosts::new();
        let services = hosts.services();
        let mut params = ProtocolParams::default();
        params.update_min_secs = 0;
        params.min_quorum = 2;

        let mut stored = StoredObject::new(proposal_object());
        for seed in 1..=3u8 {
            let outpoint = mn_outpoint(seed);
            register_mn(&hosts, seed, outpoint);
            let vote = signed_vote(
                seed,
                outpoint,
                stored.hash(),
                VoteSignal::Funding,
                VoteOutcome::Yes,
                1_700_000_100,
            );
            stored
                .process_vote(None, &vote, &services, true, &params)
                .unwrap();
        }

        stored.update_sentinel_flags(3, &params, Timestamp::new(1_700_000_500));
        assert!(stored.cached_funding);
        assert!(stored.cached_valid);
        assert!(!stored.dirty_cache);
    }

    #[test]
    fn sentinel_delete_latches() {
        let hosts = NullHosts::new();
        let services = hosts.services();
        let mut params = ProtocolParams::default();
        params.update_min_secs = 0;
        params.min_quorum = 1;

        let mut stored = StoredObject::new(proposal_object());
        let outpoint = mn_outpoint(1);
        register_mn(&hosts, 1, outpoint);
        let vote = signed_vote(
            1,
            outpoint,
            stored.hash(),
            VoteSignal::Delete,
            VoteOutcome::Yes,
            1_700_000_100,
        );
        stored
            .process_vote(None, &vote, &services, true, &params)
            .unwrap();

        stored.update_sentinel_flags(1, &params, Timestamp::new(1_700_000_500));
        assert!(stored.cached_delete);
        assert_eq!(stored.deletion_time, Timestamp::new(1_700_000_500));

        // latched: recomputing later never clears it or moves the time
        stored.update_sentinel_flags(1, &params, Timestamp::new(1_700_000_900));
        assert!(stored.cached_delete);
        assert_eq!(stored.deletion_time, Timestamp::new(1_700_000_500));
    }

    #[test]
    fn clear_removed_masternode_votes_drops_their_votes() {
        let hosts = NullHosts::new();
        let services = hosts.services();
        let mut params = ProtocolParams::default();
        params.update_min_secs = 0;

        let mut stored = StoredObject::new(proposal_object());
        let outpoint = mn_outpoint(1);
        register_mn(&hosts, 1, outpoint);
        let vote = signed_vote(
            1,
            outpoint,
            stored.hash(),
            VoteSignal::Funding,
            VoteOutcome::Yes,
            1_700_000_100,
        );
        stored
            .process_vote(None, &vote, &services, true, &params)
            .unwrap();

        hosts.registry.remove(&outpoint);
        stored.clear_removed_masternode_votes(&services);
        assert_eq!(stored.vote_count(), 0);
        assert!(stored.masternode_votes(&outpoint).is_none());
        assert!(stored.dirty_cache);
    }

    #[test]
    fn trigger_validation_requires_known_masternode_and_signature() {
        let hosts = NullHosts::new();
        let services = hosts.services();
        let params = ProtocolParams::default();
        let outpoint = mn_outpoint(1);

        let kp = keypair_from_seed(&[1; 32]);
        let mut object = trigger_object(outpoint);
        object.sign(&kp.private);
        let stored = StoredObject::new(object);

        assert!(matches!(
            stored.validate(&services, &params, true),
            LocalValidity::MissingMasternode(_)
        ));

        register_mn(&hosts, 1, outpoint);
        assert_eq!(stored.validate(&services, &params, true), LocalValidity::Valid);

        // re-signed under a different key → invalid
        let other = keypair_from_seed(&[2; 32]);
        let mut bad = trigger_object(outpoint);
        bad.sign(&other.private);
        let bad_stored = StoredObject::new(bad);
        assert!(matches!(
            bad_stored.validate(&services, &params, true),
            LocalValidity::Invalid(_)
        ));
    }
}
