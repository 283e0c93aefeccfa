use crate::base_types::{Clock, TransitionId};
use crate::config::Parameters;
use crate::core::{SegmentLink, SimulationEngine};
use crate::error::EngineError;
use crate::events::{Event, NullMessage};
use crate::lefs::Lefs;
use crate::messages::{
    NodeRef, OutboundMessage, OutboundPayload, SimulationRequest, SimulationResponse,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::SinkExt as _;
use log::{debug, error, info, warn};
use network::{MessageHandler, Receiver as NetworkReceiver, RequestClient, Writer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use tokio::sync::mpsc::{channel, unbounded_channel, Receiver, Sender, UnboundedSender};
use tokio::sync::{oneshot, watch};

#[cfg(test)]
#[path = "tests/worker_tests.rs"]
pub mod worker_tests;

/// The default channel capacity for each channel of the worker.
pub const CHANNEL_CAPACITY: usize = 1_000;

/// Handle to a spawned simulation worker. `done` yields one message when the
/// worker has finished its run and every upstream neighbor has announced its
/// own termination.
pub struct Worker {
    pub done: Receiver<()>,
}

impl Worker {
    /// Boots a worker listening on `address` under the sender id `pid`.
    pub fn spawn(pid: String, address: SocketAddr, parameters: Parameters) -> Worker {
        parameters.log();

        let (tx_request, rx_request) = channel(CHANNEL_CAPACITY);
        NetworkReceiver::spawn(address, RequestHandler { tx_request });

        let (tx_done, rx_done) = channel(1);
        Dispatch::spawn(pid.clone(), parameters, rx_request, tx_done);

        info!("Simulation node {} listening on {}", pid, address);
        Worker { done: rx_done }
    }
}

/// Decodes each inbound frame, forwards it to the dispatch task and writes
/// the response back on the connection once the request has been routed.
/// A neighbor sends its next message only after the acknowledgement, so
/// each upstream link stays FIFO.
#[derive(Clone)]
struct RequestHandler {
    tx_request: Sender<(SimulationRequest, oneshot::Sender<SimulationResponse>)>,
}

#[async_trait]
impl MessageHandler for RequestHandler {
    async fn dispatch(
        &self,
        writer: &mut Writer,
        serialized: Bytes,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let request = bincode::deserialize(&serialized)?;
        let (tx_reply, rx_reply) = oneshot::channel();
        self.tx_request
            .send((request, tx_reply))
            .await
            .expect("Failed to forward request to the dispatch task");
        let response = rx_reply.await?;
        let serialized = bincode::serialize(&response).expect("Failed to serialize response");
        writer.send(Bytes::from(serialized)).await?;
        Ok(())
    }
}

/// Producer-side endpoints for one inbound link.
struct LinkHandle {
    tx_event: UnboundedSender<Event>,
    tx_lookahead: watch::Sender<Clock>,
}

/// The message I/O adapter. Owns the worker state machine, routes inbound
/// traffic to the link channels and tracks how many parties are still
/// running: one credit per upstream link plus one for the worker's own
/// outbound queue. When the count reaches zero the worker is drained.
struct Dispatch {
    pid: String,
    parameters: Parameters,
    rx_request: Receiver<(SimulationRequest, oneshot::Sender<SimulationResponse>)>,
    tx_drained: Sender<()>,
    rx_drained: Receiver<()>,
    links: HashMap<String, LinkHandle>,
    link_lookahead: HashMap<String, Clock>,
    finished_links: HashSet<String>,
    prepared: Option<SimulationEngine>,
    initialized: bool,
    running: bool,
    end: Option<Clock>,
    running_nodes: usize,
    tx_done: Sender<()>,
}

impl Dispatch {
    fn spawn(
        pid: String,
        parameters: Parameters,
        rx_request: Receiver<(SimulationRequest, oneshot::Sender<SimulationResponse>)>,
        tx_done: Sender<()>,
    ) {
        let (tx_drained, rx_drained) = channel(1);
        tokio::spawn(async move {
            Self {
                pid,
                parameters,
                rx_request,
                tx_drained,
                rx_drained,
                links: HashMap::new(),
                link_lookahead: HashMap::new(),
                finished_links: HashSet::new(),
                prepared: None,
                initialized: false,
                running: false,
                end: None,
                running_nodes: 0,
                tx_done,
            }
            .run()
            .await;
        });
    }

    async fn run(&mut self) {
        loop {
            tokio::select! {
                request = self.rx_request.recv() => match request {
                    Some((request, reply)) => {
                        let response = self.handle_request(request);
                        let _ = reply.send(response);
                    }
                    None => break,
                },
                Some(()) = self.rx_drained.recv() => {
                    self.running_nodes = self.running_nodes.saturating_sub(1);
                }
            }
            if self.running && self.running_nodes == 0 {
                break;
            }
        }
        info!("Simulation node {} drained, closing", self.pid);
        let _ = self.tx_done.send(()).await;
    }

    fn handle_request(&mut self, request: SimulationRequest) -> SimulationResponse {
        match request {
            SimulationRequest::Prepare {
                lefs,
                transition_nodes,
                waiting_on_segments,
                notification_segments,
            } => SimulationResponse::Prepare {
                error: self
                    .handle_prepare(lefs, transition_nodes, waiting_on_segments, notification_segments)
                    .err()
                    .map(|e| e.to_string()),
            },
            SimulationRequest::Start { end } => SimulationResponse::Start {
                error: self.handle_start(end).err().map(|e| e.to_string()),
            },
            SimulationRequest::Event { pid, event } => {
                self.handle_event(&pid, event);
                SimulationResponse::Event { error: None }
            }
            SimulationRequest::NullMessage { pid, null_message } => {
                self.handle_null_message(&pid, null_message);
                SimulationResponse::NullMessage { error: None }
            }
        }
    }

    fn handle_prepare(
        &mut self,
        lefs: Lefs,
        transition_nodes: HashMap<TransitionId, NodeRef>,
        waiting_on_segments: Vec<String>,
        notification_segments: Vec<NodeRef>,
    ) -> Result<(), EngineError> {
        if self.initialized {
            return Err(EngineError::AlreadyInitialized);
        }

        let (tx_outbound, rx_outbound) = channel(CHANNEL_CAPACITY);
        OutboundSender::spawn(self.pid.clone(), rx_outbound, self.tx_drained.clone());

        let mut links = BTreeMap::new();
        for name in waiting_on_segments {
            let (tx_event, rx_event) = unbounded_channel();
            let (tx_lookahead, rx_lookahead) = watch::channel(Clock::ZERO);
            self.links.insert(
                name.clone(),
                LinkHandle {
                    tx_event,
                    tx_lookahead,
                },
            );
            links.insert(name, SegmentLink::new(rx_event, rx_lookahead));
        }
        self.running_nodes = self.links.len() + 1;

        self.prepared = Some(SimulationEngine::new(
            self.parameters.clone(),
            lefs,
            links,
            transition_nodes,
            notification_segments,
            tx_outbound,
        ));
        self.initialized = true;
        info!(
            "Initialized simulation engine on {} ({} inbound links)",
            self.pid,
            self.links.len()
        );
        Ok(())
    }

    fn handle_start(&mut self, end: Clock) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        if self.running {
            return Err(EngineError::AlreadyRunning);
        }
        let engine = self.prepared.take().expect("initialized engine is present");
        self.running = true;
        self.end = Some(end);
        // Terminal lookaheads may have arrived while we were not started yet.
        self.settle_finished_links();
        info!("Starting simulation on {} until {}", self.pid, end);
        tokio::spawn(async move {
            match engine.run(end).await {
                Ok(results) => info!("Simulation run complete: {} transitions fired", results.len()),
                Err(e) => {
                    error!("Simulation run failed: {}", e);
                    std::process::exit(1);
                }
            }
        });
        Ok(())
    }

    fn handle_event(&mut self, pid: &str, event: Event) {
        match self.links.get(pid) {
            Some(link) => {
                debug!("Enqueued event from segment {}: {:?}", pid, event);
                if link.tx_event.send(event).is_err() {
                    warn!("Simulation finished, dropping event from {}", pid);
                }
            }
            None => {
                error!("Event from unknown segment {}", pid);
                std::process::exit(1);
            }
        }
    }

    fn handle_null_message(&mut self, pid: &str, null_message: NullMessage) {
        match self.links.get(pid) {
            Some(link) => {
                debug!(
                    "Null message from segment {}: lookahead {}",
                    pid, null_message.lookahead
                );
                let _ = link.tx_lookahead.send(null_message.lookahead);
                let recorded = self
                    .link_lookahead
                    .entry(pid.to_string())
                    .or_insert(null_message.lookahead);
                if null_message.lookahead > *recorded {
                    *recorded = null_message.lookahead;
                }
                self.settle_finished_links();
            }
            None => {
                error!("Null message from unknown segment {}", pid);
                std::process::exit(1);
            }
        }
    }

    /// Releases the running-nodes credit of every link whose reported
    /// lookahead has passed the end clock, at most once per link.
    fn settle_finished_links(&mut self) {
        let end = match self.end {
            Some(end) => end,
            None => return,
        };
        for (name, lookahead) in &self.link_lookahead {
            if *lookahead > end && self.finished_links.insert(name.clone()) {
                debug!("Segment {} finished (lookahead {} > {})", name, lookahead, end);
                self.running_nodes = self.running_nodes.saturating_sub(1);
            }
        }
    }
}

/// Drains the outbound queue, delivering each payload to its neighbor and
/// waiting for the acknowledgement before taking the next entry, so every
/// neighbor stream stays FIFO. Any failure is fatal to the worker.
struct OutboundSender {
    pid: String,
    rx_outbound: Receiver<OutboundMessage>,
    client: RequestClient,
}

impl OutboundSender {
    fn spawn(pid: String, rx_outbound: Receiver<OutboundMessage>, tx_drained: Sender<()>) {
        tokio::spawn(async move {
            Self {
                pid,
                rx_outbound,
                client: RequestClient::new(),
            }
            .run()
            .await;
            let _ = tx_drained.send(()).await;
        });
    }

    async fn run(&mut self) {
        while let Some(OutboundMessage { node, payload }) = self.rx_outbound.recv().await {
            let request = match payload {
                OutboundPayload::Event(event) => SimulationRequest::Event {
                    pid: self.pid.clone(),
                    event,
                },
                OutboundPayload::NullMessage(null_message) => SimulationRequest::NullMessage {
                    pid: self.pid.clone(),
                    null_message,
                },
            };
            let serialized =
                bincode::serialize(&request).expect("Failed to serialize outbound request");
            match self.client.send(node.address, Bytes::from(serialized)).await {
                Ok(response) => match bincode::deserialize::<SimulationResponse>(&response) {
                    Ok(response) => match response.error() {
                        None => debug!("Received acknowledgement from {}", node.name),
                        Some(error) => {
                            error!("Peer {} rejected a message: {}", node.name, error);
                            std::process::exit(1);
                        }
                    },
                    Err(e) => {
                        error!("Malformed acknowledgement from {}: {}", node.name, e);
                        std::process::exit(1);
                    }
                },
                Err(e) => {
                    error!("Failed to deliver a message to {}: {}", node.name, e);
                    std::process::exit(1);
                }
            }
        }
        debug!("Outbound queue for {} drained", self.pid);
    }
}
