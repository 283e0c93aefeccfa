use crate::error::NetworkError;
use bytes::Bytes;
use futures::{SinkExt as _, StreamExt as _};
use log::debug;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

#[cfg(test)]
#[path = "tests/client_tests.rs"]
pub mod client_tests;

/// Sends one framed request to a peer and waits for the single framed
/// response. Connections are cached per address so that the stream of
/// requests to each peer is delivered in order. There are no retries; any
/// failure is surfaced to the caller.
pub struct RequestClient {
    connections: HashMap<SocketAddr, Framed<TcpStream, LengthDelimitedCodec>>,
}

impl Default for RequestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestClient {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    pub async fn send(&mut self, address: SocketAddr, data: Bytes) -> Result<Bytes, NetworkError> {
        if !self.connections.contains_key(&address) {
            let stream = TcpStream::connect(address)
                .await
                .map_err(|e| NetworkError::FailedToConnect(address, e))?;
            debug!("Outgoing connection established with {}", address);
            self.connections
                .insert(address, Framed::new(stream, LengthDelimitedCodec::new()));
        }

        let connection = self
            .connections
            .get_mut(&address)
            .expect("connection just inserted");
        connection
            .send(data)
            .await
            .map_err(|e| NetworkError::FailedToSendMessage(address, e))?;
        match connection.next().await {
            Some(Ok(response)) => Ok(response.freeze()),
            Some(Err(e)) => {
                self.connections.remove(&address);
                Err(NetworkError::FailedToReceiveMessage(address, e))
            }
            None => {
                self.connections.remove(&address);
                Err(NetworkError::DisconnectedPeer(address))
            }
        }
    }
}
