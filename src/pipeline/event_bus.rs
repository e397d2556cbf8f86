// src/pipeline/event_bus.rs
//
// Decoupled event system. The detector publishes transitions instead of
// calling into the notification layer directly; main drains the queue
// once per frame.

use std::collections::VecDeque;
use tracing::warn;

use crate::types::Status;

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StatusChanged {
        from: Status,
        to: Status,
        t: f64,
        fall_confidence: f32,
    },

    FallWindowOpened {
        t: f64,
        confidence: f32,
    },

    FallWindowClosed {
        t: f64,
        duration_s: f64,
    },
}

pub struct EventBus {
    events: VecDeque<PipelineEvent>,
    max_pending: usize,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
        }
    }

    pub fn publish(&mut self, event: PipelineEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<PipelineEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}
