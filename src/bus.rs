// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Message Bus
//
// Topic-addressed FIFO queues. Draining is competitive: whoever drains a
// topic first receives every queued message, later drains get nothing.
// Subscriptions are bookkeeping only and never gate delivery.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::pipeline::{PurchaseIntent, RejectReason};
use crate::types::EntityId;

/// Receiver named on every purchase request.
pub const CHECKOUT: &str = "checkout";

// ─── Topics ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Topic {
    PurchaseRequest,
    PurchaseCommit,
    PurchaseRejected,
    RestockDone,
}

// ─── Messages ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    PurchaseRequest {
        sender: EntityId,
        receiver: String,
        intent: PurchaseIntent,
    },
    PurchaseCommit {
        order: EntityId,
        intent: PurchaseIntent,
    },
    PurchaseRejected {
        reason: RejectReason,
        intent: PurchaseIntent,
    },
    RestockDone {
        inventory: EntityId,
        new_quantity: i64,
        employee: EntityId,
    },
}

impl Message {
    pub fn topic(&self) -> Topic {
        match self {
            Self::PurchaseRequest { .. } => Topic::PurchaseRequest,
            Self::PurchaseCommit { .. } => Topic::PurchaseCommit,
            Self::PurchaseRejected { .. } => Topic::PurchaseRejected,
            Self::RestockDone { .. } => Topic::RestockDone,
        }
    }
}

// ─── MessageBus ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MessageBus<M = Message> {
    queues: BTreeMap<Topic, VecDeque<M>>,
    subscribers: BTreeMap<Topic, Vec<String>>,
    published: u64,
}

impl<M> Default for MessageBus<M> {
    fn default() -> Self {
        Self {
            queues: BTreeMap::new(),
            subscribers: BTreeMap::new(),
            published: 0,
        }
    }
}

impl<M> MessageBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record interest in a topic. Returns `false` if already subscribed.
    pub fn subscribe(&mut self, topic: Topic, agent_id: &str) -> bool {
        let subs = self.subscribers.entry(topic).or_default();
        if subs.iter().any(|s| s == agent_id) {
            return false;
        }
        subs.push(agent_id.to_string());
        true
    }

    pub fn subscribers(&self, topic: Topic) -> &[String] {
        self.subscribers
            .get(&topic)
            .map(|subs| subs.as_slice())
            .unwrap_or(&[])
    }

    pub fn publish(&mut self, topic: Topic, message: M) {
        self.queues.entry(topic).or_default().push_back(message);
        self.published += 1;
    }

    /// Remove and return every queued message for `topic`, oldest first.
    pub fn drain(&mut self, topic: Topic) -> Vec<M> {
        self.queues
            .get_mut(&topic)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn pending(&self, topic: Topic) -> usize {
        self.queues.get(&topic).map_or(0, VecDeque::len)
    }

    pub fn peek(&self, topic: Topic) -> impl Iterator<Item = &M> + '_ {
        self.queues.get(&topic).into_iter().flat_map(|queue| queue.iter())
    }

    /// Messages published since construction, across all topics.
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl MessageBus<Message> {
    /// Publish on the topic the message belongs to.
    pub fn send(&mut self, message: Message) {
        let topic = message.topic();
        self.publish(topic, message);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
