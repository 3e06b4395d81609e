//! End-to-end governance scenarios against the nullable hosts.

use keel_crypto::keypair_from_seed;
use keel_governance::{GovernanceManager, LocalValidity};
use keel_masternode::chain::Chain;
use keel_messages::{
    GovernanceObject, GovernanceVote, Inventory, NetMessage, ObjectPayload, PeerAddr,
    ProposalPayload, TriggerPayload, VoteOutcome, VoteSignal,
};
use keel_network::PeerInfo;
use keel_nullables::NullHosts;
use keel_transactions::{Script, Transaction, TxIn, TxOut};
use keel_types::{Amount, ObjectHash, Outpoint, ProtocolParams, Timestamp, TxHash};

const BASE_TIME: u64 = 1_700_000_000;

fn peer(n: u8) -> PeerInfo {
    PeerInfo::new(n as u64, PeerAddr::new(format!("10.0.0.{n}"), 9999), 70017)
}

fn mn_outpoint(seed: u8) -> Outpoint {
    Outpoint::new(TxHash::new([seed; 32]), 0)
}

fn register_mn(hosts: &NullHosts, seed: u8) -> Outpoint {
    let outpoint = mn_outpoint(seed);
    let kp = keypair_from_seed(&[seed; 32]);
    hosts
        .registry
        .add(outpoint, PeerAddr::new(format!("10.9.0.{seed}"), 9999), kp.public);
    outpoint
}

fn proposal_object(created: u64) -> GovernanceObject {
    GovernanceObject {
        parent_hash: ObjectHash::ZERO,
        revision: 1,
        created_time: Timestamp::new(created),
        collateral_txid: TxHash::ZERO,
        data: ObjectPayload::Proposal(ProposalPayload {
            name: "treasury-2026".into(),
            url: "https://forum.example/p/2026".into(),
            payment_script: Script::PayToKeyHash([5; 20]),
            payment_amount: Amount::new(1_000_000),
            start_time: Timestamp::new(created),
            end_time: Timestamp::new(created + 1_000_000),
        })
        .encode(),
        masternode_outpoint: Outpoint::NULL,
        signature: None,
    }
}

/// Mine a collateral transaction burning the proposal fee to the object's
/// hash, buried deep enough to confirm.
fn fund_collateral(hosts: &NullHosts, object: &mut GovernanceObject, params: &ProtocolParams) {
    let hash = object.hash();
    let collateral = Transaction {
        inputs: vec![TxIn::new(Outpoint::new(TxHash::new([0xCC; 32]), 0))],
        outputs: vec![TxOut::new(params.proposal_fee, Script::burn_commitment(&hash))],
        lock_height: 0,
    };
    object.collateral_txid = collateral.hash();
    let height = hosts.chain.height();
    let buried = height.saturating_sub(params.collateral_confirmations);
    hosts.chain.add_transaction(collateral, Some(buried));
}

fn trigger_object(outpoint: Outpoint, seed: u8, created: u64, event_height: u32) -> GovernanceObject {
    let kp = keypair_from_seed(&[seed; 32]);
    let mut object = GovernanceObject {
        parent_hash: ObjectHash::ZERO,
        revision: 1,
        created_time: Timestamp::new(created),
        collateral_txid: TxHash::ZERO,
        data: ObjectPayload::Trigger(TriggerPayload {
            event_height,
            payments: vec![(Script::PayToKeyHash([7; 20]), Amount::new(500))],
        })
        .encode(),
        masternode_outpoint: outpoint,
        signature: None,
    };
    object.sign(&kp.private);
    object
}

fn signed_vote(
    seed: u8,
    parent: ObjectHash,
    signal: VoteSignal,
    outcome: VoteOutcome,
    time: u64,
) -> GovernanceVote {
    let kp = keypair_from_seed(&[seed; 32]);
    let mut vote = GovernanceVote::new(mn_outpoint(seed), parent, signal, outcome, Timestamp::new(time));
    vote.sign(&kp.private);
    vote
}

fn setup() -> (NullHosts, GovernanceManager) {
    let hosts = NullHosts::new();
    hosts.clock.set(BASE_TIME);
    hosts.chain.set_height(1000);
    let mut manager = GovernanceManager::new(ProtocolParams::default());
    manager.updated_block_tip(1000, &hosts.services());
    (hosts, manager)
}

fn solicit_object(manager: &mut GovernanceManager, hash: ObjectHash) {
    assert!(manager.confirm_inventory_request(&Inventory::GovernanceObject(hash)));
}

fn solicit_vote(manager: &mut GovernanceManager, hash: ObjectHash) {
    assert!(manager.confirm_inventory_request(&Inventory::GovernanceVote(hash)));
}

#[test]
fn unsolicited_objects_are_refused() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    let mut object = proposal_object(BASE_TIME);
    fund_collateral(&hosts, &mut object, &ProtocolParams::default());

    manager.handle_object(&peer(1), object.clone(), &services);
    assert!(!manager.have_object(&object.hash()));
    // no penalty for the unsolicited drop itself
    assert_eq!(hosts.connman.penalty(1), 0);
}

#[test]
fn valid_proposal_is_added_and_relayed() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    register_mn(&hosts, 1);

    let mut object = proposal_object(BASE_TIME);
    fund_collateral(&hosts, &mut object, &ProtocolParams::default());
    let hash = object.hash();

    solicit_object(&mut manager, hash);
    manager.handle_object(&peer(1), object, &services);

    assert!(manager.have_object(&hash));
    assert!(hosts
        .connman
        .relayed_invs()
        .iter()
        .any(|(inv, _)| *inv == Inventory::GovernanceObject(hash)));
    // one accept per request: a re-send is unsolicited now
    assert!(manager.find_object(&hash).is_some());
}

#[test]
fn proposal_with_bad_collateral_penalizes_sender() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    register_mn(&hosts, 1);

    // collateral tx never lands on the chain
    let object = proposal_object(BASE_TIME);
    let hash = object.hash();

    solicit_object(&mut manager, hash);
    manager.handle_object(&peer(1), object, &services);

    assert!(!manager.have_object(&hash));
    assert_eq!(hosts.connman.penalty(1), 20);
}

#[test]
fn young_collateral_is_postponed_then_promoted() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    register_mn(&hosts, 1);
    let params = ProtocolParams::default();

    let mut object = proposal_object(BASE_TIME);
    // collateral confirmed in the previous block only
    let hash_before = object.hash();
    let collateral = Transaction {
        inputs: vec![TxIn::new(Outpoint::new(TxHash::new([0xCC; 32]), 0))],
        outputs: vec![TxOut::new(
            params.proposal_fee,
            Script::burn_commitment(&hash_before),
        )],
        lock_height: 0,
    };
    object.collateral_txid = collateral.hash();
    assert_eq!(object.hash(), hash_before);
    hosts.chain.add_transaction(collateral, Some(999));

    solicit_object(&mut manager, hash_before);
    manager.handle_object(&peer(1), object, &services);
    assert!(manager.is_postponed(&hash_before));
    assert!(manager.have_object(&hash_before));

    // chain advances past the confirmation requirement
    hosts.chain.set_height(1010);
    manager.updated_block_tip(1010, &services);
    assert!(!manager.is_postponed(&hash_before));
    assert!(manager.find_object(&hash_before).is_some());
}

#[test]
fn orphan_vote_parks_then_replays_on_object_arrival() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    register_mn(&hosts, 1);
    let sender = peer(3);
    hosts.connman.connect(sender.clone());

    let mut object = proposal_object(BASE_TIME);
    fund_collateral(&hosts, &mut object, &ProtocolParams::default());
    let parent = object.hash();

    let vote = signed_vote(1, parent, VoteSignal::Funding, VoteOutcome::Yes, BASE_TIME + 5);
    let vote_hash = vote.hash();

    // vote first: parked, parent requested from the sender
    solicit_vote(&mut manager, vote_hash);
    manager.handle_vote(&sender, vote, &services);
    assert!(!manager.have_vote(&vote_hash));
    assert_eq!(manager.orphan_vote_count(), 1);
    assert!(hosts
        .connman
        .pushed_to(&sender.addr)
        .iter()
        .any(|msg| matches!(msg, NetMessage::GovernanceSync { hash, .. } if *hash == parent)));

    // object arrives: parked vote is replayed, recorded and relayed once
    solicit_object(&mut manager, parent);
    manager.handle_object(&sender, object, &services);
    assert!(manager.have_object(&parent));
    assert!(manager.have_vote(&vote_hash));
    assert_eq!(manager.orphan_vote_count(), 0);
    let vote_relays = hosts
        .connman
        .relayed_invs()
        .iter()
        .filter(|(inv, _)| *inv == Inventory::GovernanceVote(vote_hash))
        .count();
    assert_eq!(vote_relays, 1);
}

#[test]
fn sixth_trigger_in_a_tight_window_is_rate_limited() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    let outpoint = register_mn(&hosts, 1);
    let params = ProtocolParams::default();
    let cycle = params.superblock_cycle_secs();

    // five triggers spread just wide enough to stay under the allowed
    // rate (five per 2.4 cycles)
    let spacing = cycle * 6 / 10;
    let mut accepted = 0;
    let mut last_time = 0;
    for i in 0..5u64 {
        let created = BASE_TIME + i * spacing;
        last_time = created;
        hosts.clock.set(created);
        let object = trigger_object(outpoint, 1, created, 1500 + i as u32);
        let hash = object.hash();
        solicit_object(&mut manager, hash);
        manager.handle_object(&peer(1), object, &services);
        if manager.have_object(&hash) {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 5);
    assert!(manager.rate_record(&outpoint).unwrap().status_ok);

    // the sixth lands right on top of the fifth: the window tightens to
    // under two cycles and the prospective rate blows the cap
    let created = last_time + 10;
    hosts.clock.set(created);
    let object = trigger_object(outpoint, 1, created, 1600);
    let hash = object.hash();
    solicit_object(&mut manager, hash);
    manager.handle_object(&peer(1), object, &services);

    assert!(!manager.have_object(&hash));
    let record = manager.rate_record(&outpoint).unwrap();
    assert!(!record.status_ok, "rate failure must latch the masternode");

    // latched: even a freshly spaced trigger now takes the full (forced)
    // check and keeps failing while the window stays dense
    let retry_time = created + 20;
    hosts.clock.set(retry_time);
    let retry = trigger_object(outpoint, 1, retry_time, 1601);
    let retry_hash = retry.hash();
    solicit_object(&mut manager, retry_hash);
    manager.handle_object(&peer(1), retry, &services);
    assert!(!manager.have_object(&retry_hash));
}

#[test]
fn repeated_full_sync_costs_misbehavior() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    let requester = peer(4);
    hosts.connman.connect(requester.clone());

    manager.handle_message(
        &requester,
        NetMessage::GovernanceSync {
            hash: ObjectHash::ZERO,
            filter: None,
        },
        &services,
    );
    assert_eq!(hosts.connman.penalty(4), 0);

    manager.handle_message(
        &requester,
        NetMessage::GovernanceSync {
            hash: ObjectHash::ZERO,
            filter: None,
        },
        &services,
    );
    assert_eq!(hosts.connman.penalty(4), 20);
}

#[test]
fn obsolete_peer_version_is_rejected() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    let mut old_peer = peer(5);
    old_peer.version = 1;
    hosts.connman.connect(old_peer.clone());

    manager.handle_message(
        &old_peer,
        NetMessage::GovernanceSync {
            hash: ObjectHash::ZERO,
            filter: None,
        },
        &services,
    );
    assert!(hosts
        .connman
        .pushed_to(&old_peer.addr)
        .iter()
        .any(|msg| matches!(msg, NetMessage::Reject { .. })));
}

#[test]
fn snapshot_round_trips_objects_and_votes() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    register_mn(&hosts, 1);

    let mut object = proposal_object(BASE_TIME);
    fund_collateral(&hosts, &mut object, &ProtocolParams::default());
    let parent = object.hash();
    solicit_object(&mut manager, parent);
    manager.handle_object(&peer(1), object, &services);

    let vote = signed_vote(1, parent, VoteSignal::Funding, VoteOutcome::Yes, BASE_TIME + 5);
    let vote_hash = vote.hash();
    solicit_vote(&mut manager, vote_hash);
    manager.handle_vote(&peer(1), vote, &services);
    assert!(manager.have_vote(&vote_hash));

    let bytes = bincode::serialize(&manager.snapshot()).unwrap();
    let snapshot = bincode::deserialize(&bytes).unwrap();

    let mut restored = GovernanceManager::new(ProtocolParams::default());
    restored.updated_block_tip(1000, &services);
    assert!(restored.restore(snapshot, &services));
    assert!(restored.have_object(&parent));
    assert!(restored.have_vote(&vote_hash));
    assert_eq!(restored.object_count(), 1);
}

#[test]
fn snapshot_version_mismatch_clears_store() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    register_mn(&hosts, 1);

    let mut object = proposal_object(BASE_TIME);
    fund_collateral(&hosts, &mut object, &ProtocolParams::default());
    let parent = object.hash();
    solicit_object(&mut manager, parent);
    manager.handle_object(&peer(1), object, &services);
    assert_eq!(manager.object_count(), 1);

    let mut snapshot = manager.snapshot();
    snapshot.version = "GovernanceManager-Version-0".into();
    assert!(!manager.restore(snapshot, &services));
    assert_eq!(manager.object_count(), 0);
}

#[test]
fn delete_quorum_evicts_after_delay_and_tombstones() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    let params = ProtocolParams::default();
    for seed in 1..=3u8 {
        register_mn(&hosts, seed);
    }

    let mut object = proposal_object(BASE_TIME);
    fund_collateral(&hosts, &mut object, &params);
    let parent = object.hash();
    solicit_object(&mut manager, parent);
    manager.handle_object(&peer(1), object, &services);

    // two thirds of three masternodes vote delete
    for seed in 1..=2u8 {
        let vote = signed_vote(seed, parent, VoteSignal::Delete, VoteOutcome::Yes, BASE_TIME + 5);
        solicit_vote(&mut manager, vote.hash());
        manager.handle_vote(&peer(seed), vote, &services);
    }

    manager.update_caches_and_clean(&services);
    assert!(manager.find_object(&parent).unwrap().cached_delete);
    // still present until the deletion delay passes
    assert!(manager.have_object(&parent));

    hosts.clock.advance(params.deletion_delay_secs + 1);
    manager.update_caches_and_clean(&services);
    assert!(!manager.have_object(&parent));
    assert!(manager.is_erased(&parent));
    assert_eq!(manager.vote_count(), 0);
    assert!(!hosts.registry.removed_objects().is_empty());
}

#[test]
fn validity_outcomes_cover_missing_masternode() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    // masternode NOT registered
    let outpoint = mn_outpoint(9);
    let object = trigger_object(outpoint, 9, BASE_TIME, 1500);
    let hash = object.hash();

    solicit_object(&mut manager, hash);
    manager.handle_object(&peer(2), object.clone(), &services);

    // parked as masternode-orphan, not added, not penalized
    assert!(!manager.have_object(&hash));
    assert_eq!(hosts.connman.penalty(2), 0);

    // registry learns the masternode; the orphan check promotes it
    register_mn(&hosts, 9);
    manager.check_orphan_objects(&services);
    assert!(manager.have_object(&hash));

    // sanity: a fresh copy of the object validates now
    let stored = keel_governance::StoredObject::new(object);
    assert_eq!(
        stored.validate(&services, &ProtocolParams::default(), true),
        LocalValidity::Valid
    );
}

#[test]
fn expired_masternode_orphan_penalizes_original_sender() {
    let (hosts, mut manager) = setup();
    let services = hosts.services();
    let params = ProtocolParams::default();
    let outpoint = mn_outpoint(9);
    let object = trigger_object(outpoint, 9, BASE_TIME, 1500);
    let hash = object.hash();

    solicit_object(&mut manager, hash);
    manager.handle_object(&peer(2), object, &services);
    assert_eq!(hosts.connman.penalty(2), 0);

    hosts.clock.advance(params.orphan_ttl_secs + 1);
    manager.check_orphan_objects(&services);
    assert!(!manager.have_object(&hash));
    assert_eq!(hosts.connman.penalty(2), 20);
}
