use crate::base_types::{local_transition_id, Clock, TransitionId};
use crate::config::Parameters;
use crate::error::{EngineError, EngineResult};
use crate::events::{Event, EventList, NullMessage};
use crate::lefs::Lefs;
use crate::messages::{NodeRef, OutboundMessage, OutboundPayload};
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tokio::sync::mpsc::{Sender, UnboundedReceiver};
use tokio::sync::watch;

#[cfg(test)]
#[path = "tests/core_tests.rs"]
pub mod core_tests;

/// One fired transition and the local clock at which it fired.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransitionResult {
    pub transition_id: TransitionId,
    pub clock: Clock,
}

/// Consumer-side state for one upstream neighbor: the last promised lower
/// bound on future events plus the two arrival channels. The event queue is
/// FIFO; the lookahead channel keeps only the most recent unread promise.
pub(crate) struct SegmentLink {
    clock: Clock,
    rx_event: UnboundedReceiver<Event>,
    rx_lookahead: watch::Receiver<Clock>,
}

impl SegmentLink {
    pub(crate) fn new(rx_event: UnboundedReceiver<Event>, rx_lookahead: watch::Receiver<Clock>) -> Self {
        Self {
            clock: Clock::ZERO,
            rx_event,
            rx_lookahead,
        }
    }
}

/// The simulation engine: the local scheduler plus the conservative
/// synchronization core. Owned exclusively by the simulator task once the
/// run starts; everything else talks to it through channels.
pub struct SimulationEngine {
    parameters: Parameters,
    clock: Clock,
    lefs: Lefs,
    event_list: EventList,
    external_events: EventList,
    transition_results: Vec<TransitionResult>,
    event_count: u64,
    links: BTreeMap<String, SegmentLink>,
    transition_nodes: HashMap<TransitionId, NodeRef>,
    notification_segments: Vec<NodeRef>,
    tx_outbound: Sender<OutboundMessage>,
}

impl SimulationEngine {
    pub(crate) fn new(
        parameters: Parameters,
        lefs: Lefs,
        links: BTreeMap<String, SegmentLink>,
        transition_nodes: HashMap<TransitionId, NodeRef>,
        notification_segments: Vec<NodeRef>,
        tx_outbound: Sender<OutboundMessage>,
    ) -> Self {
        Self {
            parameters,
            clock: Clock::ZERO,
            lefs,
            event_list: EventList::new(),
            external_events: EventList::new(),
            transition_results: Vec::new(),
            event_count: 0,
            links,
            transition_nodes,
            notification_segments,
            tx_outbound,
        }
    }

    /// Runs the step loop until the local clock reaches `end`, writes the
    /// result file and announces termination to every downstream neighbor.
    /// Dropping the outbound sender on return is what lets the outbound task
    /// drain and finish.
    pub async fn run(mut self, end: Clock) -> EngineResult<Vec<TransitionResult>> {
        let begin = Instant::now();
        self.clock = Clock::ZERO;
        while self.clock < end {
            self.simulate_step().await?;
        }
        let elapsed = begin.elapsed().as_secs_f64();
        info!(
            "Simulation reached {} after {} events ({:.0} events/s)",
            self.clock,
            self.event_count,
            self.event_count as f64 / elapsed.max(f64::EPSILON),
        );

        self.write_results()?;
        let lookahead = end + self.parameters.lookahead;
        for node in &self.notification_segments {
            let message = OutboundMessage {
                node: node.clone(),
                payload: OutboundPayload::NullMessage(NullMessage { lookahead }),
            };
            self.tx_outbound
                .send(message)
                .await
                .map_err(|_| EngineError::OutboundClosed)?;
        }
        Ok(self.transition_results)
    }

    /// One simulation step: sensitize and fire, emit the outbound traffic,
    /// advance the local clock, apply the events due at the new clock.
    async fn simulate_step(&mut self) -> EngineResult<()> {
        self.lefs.update_sensitized(self.clock);
        self.fire_enabled_transitions();
        debug!("Events: {:?}", self.event_list);
        debug!("External events: {:?}", self.external_events);

        self.send_external_events().await?;
        self.clock = self.forward_time().await?;
        debug!("Clock: {}", self.clock);
        self.handle_events();
        Ok(())
    }

    fn fire_enabled_transitions(&mut self) {
        while let Some(id) = self.lefs.get_sensitized() {
            self.fire_transition(id);
            self.transition_results.push(TransitionResult {
                transition_id: id,
                clock: self.clock,
            });
        }
    }

    /// Applies the instantaneous updates of `id` and schedules its
    /// propagated ones at `clock + duration`, splitting external targets off
    /// to the outbound event list.
    fn fire_transition(&mut self, id: TransitionId) {
        let (time, update, propagate) = {
            let transition = &self.lefs.network[&id];
            (
                transition.clock + transition.duration,
                transition.update.clone(),
                transition.propagate.clone(),
            )
        };
        for (target, constant) in update {
            self.lefs.apply_update(target, constant);
        }
        for (target, constant) in propagate {
            let event = Event {
                clock: time,
                destination: target,
                value: constant,
            };
            if target < 0 {
                self.external_events.insert(event);
            } else {
                self.event_list.insert(event);
            }
        }
    }

    /// Sends every pending external event to its owner node, then a null
    /// message to every downstream neighbor that received no event this
    /// step.
    async fn send_external_events(&mut self) -> EngineResult<()> {
        let mut silent: HashMap<String, NodeRef> = self
            .notification_segments
            .iter()
            .map(|node| (node.name.clone(), node.clone()))
            .collect();

        while let Some(event) = self.external_events.pop() {
            let node = self.transition_node(event.destination).clone();
            silent.remove(&node.name);
            debug!("Sending {:?} to {}", event, node.name);
            self.tx_outbound
                .send(OutboundMessage {
                    node,
                    payload: OutboundPayload::Event(event),
                })
                .await
                .map_err(|_| EngineError::OutboundClosed)?;
        }

        let lookahead = self.clock + self.parameters.lookahead;
        for (_, node) in silent {
            debug!("Sending null message {} to {}", lookahead, node.name);
            self.tx_outbound
                .send(OutboundMessage {
                    node,
                    payload: OutboundPayload::NullMessage(NullMessage { lookahead }),
                })
                .await
                .map_err(|_| EngineError::OutboundClosed)?;
        }
        Ok(())
    }

    /// Owner node of an external event's target, looked up by decoded id.
    fn transition_node(&self, id: TransitionId) -> &NodeRef {
        self.transition_nodes
            .get(&local_transition_id(id))
            .expect("external event targets a transition with no owner node")
    }

    /// Advances virtual time. The advance target is the soonest pending
    /// event, or an idle tick of one lookahead when nothing is pending. Any
    /// link whose promise is below the target blocks the step until its
    /// neighbor either delivers an event or raises the promise with a null
    /// message; the target is then re-evaluated, since a delivered event may
    /// lower it. Returns once every link promise covers the target, which
    /// becomes the new local clock.
    async fn forward_time(&mut self) -> EngineResult<Clock> {
        loop {
            let target = self
                .event_list
                .first_clock()
                .unwrap_or(self.clock + self.parameters.lookahead);

            let waiting: Vec<String> = self
                .links
                .iter()
                .filter(|(_, link)| link.clock < target)
                .map(|(name, _)| name.clone())
                .collect();
            if waiting.is_empty() {
                return Ok(target);
            }

            for name in waiting {
                let link = self.links.get_mut(&name).expect("waiting link exists");
                debug!("Waiting on segment {} (promised {})", name, link.clock);
                tokio::select! {
                    changed = link.rx_lookahead.changed() => match changed {
                        Ok(()) => link.clock = *link.rx_lookahead.borrow_and_update(),
                        Err(_) => return Err(EngineError::LinksClosed),
                    },
                    event = link.rx_event.recv() => match event {
                        Some(event) => self.event_list.insert(event),
                        None => return Err(EngineError::LinksClosed),
                    },
                }
            }

            // Pick up whatever else the links received in the meantime.
            for link in self.links.values_mut() {
                while let Ok(event) = link.rx_event.try_recv() {
                    self.event_list.insert(event);
                }
            }
        }
    }

    /// Applies every event scheduled exactly at the local clock: the target
    /// transition's value moves by the event's constant (which may be
    /// negative) and its clock records the event's timestamp.
    fn handle_events(&mut self) {
        while let Some(event) = self.event_list.pop_at(self.clock) {
            let id = local_transition_id(event.destination);
            debug!("Handling {:?} for transition {}", event, id);
            let transition = self
                .lefs
                .network
                .get_mut(&id)
                .expect("event targets an unknown transition");
            transition.update_value(event.value);
            transition.update_clock(event.clock);
            self.event_count += 1;
        }
    }

    fn write_results(&self) -> EngineResult<()> {
        let file = self.parameters.result_path.display().to_string();
        let fail = |message: String| EngineError::ResultWriteError {
            file: file.clone(),
            message,
        };
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.parameters.result_path)
            .map_err(|e| fail(e.to_string()))?;
        for result in &self.transition_results {
            writer
                .serialize((result.transition_id, result.clock))
                .map_err(|e| fail(e.to_string()))?;
        }
        writer.flush().map_err(|e| fail(e.to_string()))?;
        info!(
            "Wrote {} transition results to {}",
            self.transition_results.len(),
            file
        );
        Ok(())
    }
}
