use crate::config::InitiationPolicy;
use meshcall_core::ParticipantId;
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub is_host: bool,
    pub is_self: bool,
    /// Cleared when negotiation with this participant failed.
    pub reachable: bool,
}

impl Participant {
    pub fn local(id: ParticipantId, display_name: String, is_host: bool) -> Self {
        Self {
            id,
            display_name,
            is_host,
            is_self: true,
            reachable: true,
        }
    }

    pub fn remote(id: ParticipantId, display_name: Option<String>) -> Self {
        let display_name = display_name.unwrap_or_else(|| format!("Participant {}", id));
        Self {
            id,
            display_name,
            is_host: false,
            is_self: false,
            reachable: true,
        }
    }
}

/// How a participant was first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sighting {
    /// A `user_joined` announcement.
    Joined,
    /// The roster of already-present participants.
    Roster,
    /// An offer, answer or candidate from someone not yet known.
    Negotiation,
}

/// A newly admitted participant and whether this side must offer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub participant: Participant,
    pub initiate: bool,
}

/// Departures remembered at most; the oldest is forgotten first.
pub const MAX_DEPARTED: usize = 256;

/// The participant table, keyed by id.
pub struct Membership {
    self_id: ParticipantId,
    policy: InitiationPolicy,
    participants: BTreeMap<ParticipantId, Participant>,
    pending_offers: HashSet<ParticipantId>,
    /// Left and not announced again; negotiation from them is stale.
    departed: HashSet<ParticipantId>,
    departed_order: VecDeque<ParticipantId>,
}

impl Membership {
    pub fn new(local: Participant, policy: InitiationPolicy) -> Self {
        let self_id = local.id.clone();
        let mut participants = BTreeMap::new();
        participants.insert(self_id.clone(), local);
        Self {
            self_id,
            policy,
            participants,
            pending_offers: HashSet::new(),
            departed: HashSet::new(),
            departed_order: VecDeque::new(),
        }
    }

    pub fn self_id(&self) -> &ParticipantId {
        &self.self_id
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.participants.values().cloned().collect()
    }

    pub fn remote_ids(&self) -> Vec<ParticipantId> {
        self.participants
            .keys()
            .filter(|id| **id != self.self_id)
            .cloned()
            .collect()
    }

    /// Records a sighting of `id`. Returns `None` for self and for ids that
    /// are already known, which makes duplicate announcements no-ops.
    pub fn sighted(
        &mut self,
        id: &ParticipantId,
        name: Option<String>,
        via: Sighting,
    ) -> Option<Admission> {
        if *id == self.self_id {
            return None;
        }
        if via == Sighting::Negotiation && self.departed.contains(id) {
            debug!("Ignoring negotiation from departed participant {}", id);
            return None;
        }
        self.forget_departure(id);
        if let Some(known) = self.participants.get_mut(id) {
            if let Some(name) = name {
                known.display_name = name;
            }
            debug!("Participant {} already known", id);
            return None;
        }

        let participant = Participant::remote(id.clone(), name);
        self.participants.insert(id.clone(), participant.clone());

        let initiate = via != Sighting::Negotiation
            && self
                .policy
                .should_initiate(&self.self_id, id, via == Sighting::Joined);
        if initiate {
            self.pending_offers.insert(id.clone());
        }
        info!("Participant {} joined (initiate={})", id, initiate);

        Some(Admission {
            participant,
            initiate,
        })
    }

    /// Claims the pending initiation toward `id`. `false` when the
    /// participant left meanwhile or the initiation was already claimed.
    pub fn take_initiation(&mut self, id: &ParticipantId) -> bool {
        self.pending_offers.remove(id) && self.participants.contains_key(id)
    }

    pub fn is_initiation_pending(&self, id: &ParticipantId) -> bool {
        self.pending_offers.contains(id)
    }

    pub fn left(&mut self, id: &ParticipantId) -> Option<Participant> {
        if *id == self.self_id {
            return None;
        }
        self.pending_offers.remove(id);
        self.remember_departure(id);
        let removed = self.participants.remove(id);
        if removed.is_some() {
            info!("Participant {} left", id);
        }
        removed
    }

    pub fn is_departed(&self, id: &ParticipantId) -> bool {
        self.departed.contains(id)
    }

    fn remember_departure(&mut self, id: &ParticipantId) {
        if !self.departed.insert(id.clone()) {
            return;
        }
        self.departed_order.push_back(id.clone());
        while self.departed.len() > MAX_DEPARTED {
            let Some(oldest) = self.departed_order.pop_front() else {
                break;
            };
            self.departed.remove(&oldest);
        }
    }

    fn forget_departure(&mut self, id: &ParticipantId) {
        if self.departed.remove(id) {
            self.departed_order.retain(|d| d != id);
        }
    }

    pub fn set_reachable(&mut self, id: &ParticipantId, reachable: bool) -> Option<&Participant> {
        let participant = self.participants.get_mut(id)?;
        participant.reachable = reachable;
        Some(participant)
    }

    /// Forgets every remote participant and every departure; used when the
    /// relay link is lost.
    pub fn retain_self(&mut self) -> Vec<ParticipantId> {
        let removed = self.remote_ids();
        self.participants.retain(|id, _| *id == self.self_id);
        self.pending_offers.clear();
        self.departed.clear();
        self.departed_order.clear();
        removed
    }
}
