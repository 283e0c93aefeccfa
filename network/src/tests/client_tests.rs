use super::*;
use futures::sink::SinkExt as _;
use futures::stream::StreamExt as _;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};

fn spawn_ack_server(address: SocketAddr) {
    tokio::spawn(async move {
        let listener = TcpListener::bind(&address).await.unwrap();
        let (socket, _) = listener.accept().await.unwrap();
        let mut connection = Framed::new(socket, LengthDelimitedCodec::new());
        while let Some(Ok(_frame)) = connection.next().await {
            connection.send(Bytes::from("ack")).await.unwrap();
        }
    });
}

#[tokio::test]
async fn send_and_await_response() {
    let address: SocketAddr = "127.0.0.1:6200".parse().unwrap();
    spawn_ack_server(address);
    sleep(Duration::from_millis(50)).await;

    let mut client = RequestClient::new();
    let response = client.send(address, Bytes::from("one")).await.unwrap();
    assert_eq!(&response[..], b"ack");

    // The second request reuses the cached connection.
    let response = client.send(address, Bytes::from("two")).await.unwrap();
    assert_eq!(&response[..], b"ack");
}

#[tokio::test]
async fn connect_failure_is_an_error() {
    // Nothing listens here.
    let address: SocketAddr = "127.0.0.1:6201".parse().unwrap();
    let mut client = RequestClient::new();
    assert!(client.send(address, Bytes::from("lost")).await.is_err());
}
