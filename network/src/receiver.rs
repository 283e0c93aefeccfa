use crate::error::NetworkError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::SplitSink;
use futures::{SinkExt as _, StreamExt as _};
use log::{debug, info, warn};
use std::error::Error;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

#[cfg(test)]
#[path = "tests/receiver_tests.rs"]
pub mod receiver_tests;

/// Writing half of an accepted connection, handed to the message handler so
/// it can reply on the same stream it was contacted on.
pub type Writer = SplitSink<Framed<TcpStream, LengthDelimitedCodec>, Bytes>;

/// Defines what to do with each incoming frame. A dispatch error closes the
/// connection; the peer is expected to reconnect if it has more to say.
#[async_trait]
pub trait MessageHandler: Clone + Send + Sync + 'static {
    async fn dispatch(&self, writer: &mut Writer, message: Bytes) -> Result<(), Box<dyn Error>>;
}

/// Listens on a TCP address and runs one handler loop per connection.
/// Frames are length-delimited; their interpretation is the handler's
/// business.
pub struct Receiver<Handler: MessageHandler> {
    address: SocketAddr,
    handler: Handler,
}

impl<Handler: MessageHandler> Receiver<Handler> {
    pub fn spawn(address: SocketAddr, handler: Handler) {
        tokio::spawn(async move {
            Self { address, handler }.run().await;
        });
    }

    async fn run(&self) {
        let listener = TcpListener::bind(&self.address)
            .await
            .expect("Failed to bind TCP address");
        info!("Listening on {}", self.address);

        loop {
            let (socket, peer) = match listener.accept().await {
                Ok(value) => value,
                Err(e) => {
                    warn!("{}", NetworkError::FailedToListen(e));
                    continue;
                }
            };
            debug!("Incoming connection established with {}", peer);
            Self::spawn_runner(socket, peer, self.handler.clone());
        }
    }

    fn spawn_runner(socket: TcpStream, peer: SocketAddr, handler: Handler) {
        tokio::spawn(async move {
            let framed = Framed::new(socket, LengthDelimitedCodec::new());
            let (mut writer, mut reader) = framed.split();
            while let Some(frame) = reader.next().await {
                match frame {
                    Ok(message) => {
                        if let Err(e) = handler.dispatch(&mut writer, message.freeze()).await {
                            warn!("{}", e);
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("{}", NetworkError::FailedToReceiveMessage(peer, e));
                        return;
                    }
                }
            }
            debug!("Connection closed by peer {}", peer);
        });
    }
}
