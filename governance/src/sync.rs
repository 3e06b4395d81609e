//! Governance sync and vote solicitation.
//!
//! Two directions: serving sync requests from peers (everything, or one
//! object plus the votes the requester is missing), and actively chasing
//! votes for objects we track. Full syncs are expensive, so each peer
//! gets one per connection; repeats cost misbehavior score.

use crate::manager::GovernanceManager;
use keel_masternode::HostServices;
use keel_messages::{BloomFilter, Inventory, NetMessage, PeerAddr, SyncKind};
use keel_network::{PeerInfo, MISBEHAVIOR_PENALTY};
use keel_types::ObjectHash;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

/// False-positive rate for vote-sync bloom filters.
const GOVERNANCE_FILTER_FP_RATE: f64 = 0.001;

/// Concurrent peers asked for one object's votes.
const PEERS_PER_HASH_MAX: usize = 3;

/// Seconds before the same peer may be asked about the same object again.
const ASK_AGAIN_SECS: u64 = 60 * 60;

/// Objects requested from one peer per solicitation round.
const MAX_OBJ_REQUESTS_PER_ROUND: usize = 1;

impl GovernanceManager {
    /// Serve a full governance sync: advertise every live object, then
    /// send the two progress summaries.
    pub fn sync_all(&mut self, peer: &PeerInfo, services: &HostServices) {
        let now = services.clock.adjusted();
        if self.fulfilled.has_fulfilled(&peer.addr, "mngovernancesync", now) {
            // asking for the whole list repeatedly is no good
            debug!(peer = %peer.addr, "peer already asked for the full governance list");
            services.connman.misbehaving(peer.id, MISBEHAVIOR_PENALTY);
            return;
        }
        self.fulfilled.add_fulfilled(&peer.addr, "mngovernancesync", now);

        let mut object_count = 0u32;
        for (hash, object) in &self.objects {
            if object.is_marked_for_deletion() {
                debug!(%hash, "not syncing deleted/expired object");
                continue;
            }
            services
                .connman
                .push(&peer.addr, NetMessage::Inv(Inventory::GovernanceObject(*hash)));
            object_count += 1;
        }

        services.connman.push(
            &peer.addr,
            NetMessage::SyncStatusCount {
                kind: SyncKind::Objects,
                count: object_count,
            },
        );
        services.connman.push(
            &peer.addr,
            NetMessage::SyncStatusCount {
                kind: SyncKind::Votes,
                count: 0,
            },
        );
        info!(peer = %peer.addr, objects = object_count, "served full governance sync");
    }

    /// Serve one object and the votes the requester's filter is missing.
    pub fn sync_one(
        &mut self,
        peer: &PeerInfo,
        hash: &ObjectHash,
        filter: Option<&BloomFilter>,
        services: &HostServices,
    ) {
        let Some(object) = self.objects.get(hash) else {
            debug!(%hash, peer = %peer.addr, "no matching object for sync");
            return;
        };
        if object.is_marked_for_deletion() {
            debug!(%hash, peer = %peer.addr, "not syncing deleted/expired object");
            return;
        }

        services
            .connman
            .push(&peer.addr, NetMessage::Inv(Inventory::GovernanceObject(*hash)));

        let mut vote_count = 0u32;
        for vote in object.votes() {
            let vote_hash = vote.hash();
            if filter.is_some_and(|f| f.contains_hash(&vote_hash)) {
                continue;
            }
            // don't advertise votes that no longer verify
            let still_valid = services
                .registry
                .lookup(&vote.masternode_outpoint)
                .is_some_and(|info| vote.verify(&info.pubkey));
            if !still_valid {
                continue;
            }
            services
                .connman
                .push(&peer.addr, NetMessage::Inv(Inventory::GovernanceVote(vote_hash)));
            vote_count += 1;
        }

        services.connman.push(
            &peer.addr,
            NetMessage::SyncStatusCount {
                kind: SyncKind::Objects,
                count: 1,
            },
        );
        services.connman.push(
            &peer.addr,
            NetMessage::SyncStatusCount {
                kind: SyncKind::Votes,
                count: vote_count,
            },
        );
        info!(peer = %peer.addr, votes = vote_count, "served single-object sync");
    }

    /// Ask one peer for one object, optionally with a filter of the votes
    /// we already hold.
    pub(crate) fn request_object(
        &self,
        peer: &PeerAddr,
        hash: &ObjectHash,
        services: &HostServices,
        use_filter: bool,
    ) {
        let filter = if use_filter {
            self.objects.get(hash).map(|object| {
                let mut filter = BloomFilter::new(
                    self.params.governance_filter_elements,
                    GOVERNANCE_FILTER_FP_RATE,
                    rand::thread_rng().gen(),
                );
                for vote_hash in object.vote_hashes() {
                    filter.insert_hash(vote_hash);
                }
                filter
            })
        } else {
            None
        };
        debug!(%hash, peer = %peer, "requesting governance object");
        services
            .connman
            .push(peer, NetMessage::GovernanceSync { hash: *hash, filter });
    }

    /// Periodic vote solicitation across the peer snapshot.
    ///
    /// Triggers first, then other objects; at most `PEERS_PER_HASH_MAX`
    /// outstanding peers per object, and the same peer is not re-asked
    /// about the same object within `ASK_AGAIN_SECS`. Masternode-role and
    /// inbound peers are skipped to avoid amplification. Returns the
    /// number of tracked objects still unsolicited this round.
    pub fn request_votes(&mut self, services: &HostServices) -> usize {
        let peers = services.connman.peer_snapshot();
        if peers.is_empty() || self.objects.is_empty() {
            return 0;
        }

        let now = services.clock.adjusted();

        let mut trigger_hashes = Vec::new();
        let mut other_hashes = Vec::new();
        for (hash, object) in &self.objects {
            if let Some(asked) = self.asked_recently.get_mut(hash) {
                asked.retain(|_, re_ask_at| *re_ask_at >= now);
                if asked.len() >= PEERS_PER_HASH_MAX {
                    continue;
                }
            }
            if object.object_type == keel_messages::GovObjectType::Trigger {
                trigger_hashes.push(*hash);
            } else {
                other_hashes.push(*hash);
            }
        }

        let mut rng = rand::thread_rng();
        trigger_hashes.shuffle(&mut rng);
        other_hashes.shuffle(&mut rng);

        for _ in 0..MAX_OBJ_REQUESTS_PER_ROUND {
            // triggers first
            let hash = match trigger_hashes.last().or(other_hashes.last()) {
                Some(hash) => *hash,
                None => break,
            };

            for peer in &peers {
                if peer.masternode_conn || peer.inbound {
                    continue;
                }
                if peer.version < self.params.min_protocol_version {
                    continue;
                }
                let asked = self.asked_recently.entry(hash).or_default();
                if asked.contains_key(&peer.addr) {
                    continue;
                }
                self.request_object(&peer.addr, &hash, services, true);
                self.asked_recently
                    .entry(hash)
                    .or_default()
                    .insert(peer.addr.clone(), now.saturating_add(ASK_AGAIN_SECS));
                if self.asked_recently[&hash].len() >= PEERS_PER_HASH_MAX {
                    break;
                }
            }

            if trigger_hashes.pop().is_none() {
                other_hashes.pop();
            }
        }

        trigger_hashes.len() + other_hashes.len()
    }

    /// Ask regular peers for the parents of orphaned votes.
    pub fn request_orphan_objects(&mut self, services: &HostServices) {
        let peers = services.connman.peer_snapshot();
        let missing: Vec<ObjectHash> = self
            .orphan_vote_parent_hashes()
            .into_iter()
            .filter(|hash| !self.objects.contains_key(hash))
            .collect();

        debug!(count = missing.len(), "requesting orphan parent objects");
        for hash in missing {
            for peer in &peers {
                if peer.masternode_conn {
                    continue;
                }
                self.request_object(&peer.addr, &hash, services, false);
            }
        }
    }
}
