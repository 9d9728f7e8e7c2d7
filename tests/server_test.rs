// End-to-end tests over a real TCP listener
//
// These cover what oneshot tests cannot: the peer address as client
// identifier and the limiter lifecycle around graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use spaceapi::document::SpaceApi;
use spaceapi::server::{ServerConfig, SpaceApiServer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn raw_request(addr: SocketAddr, request: String) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}

fn get_request(path: &str) -> String {
    format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
}

fn post_request(path: &str, key: &str, body: &str) -> String {
    format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
         Authorization: Bearer {key}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

#[tokio::test]
async fn test_serve_identifies_clients_by_peer_ip() {
    let config = ServerConfig::builder().api_key("secret").build();
    let server = Arc::new(SpaceApiServer::new(config, SpaceApi::default()));
    let limiter = server.limiter().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            server
                .serve(listener, async move {
                    let _ = shutdown_rx.await;
                })
                .await
        })
    };

    let response = raw_request(addr, get_request("/health")).await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("OK"));

    // Each request uses a fresh connection and source port; the bucket is the IP
    for _ in 0..5 {
        let response = raw_request(
            addr,
            post_request("/api/space/state", "wrong", r#"{"open":true}"#),
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 401"));
    }
    assert!(limiter.is_blocked("127.0.0.1").await);

    let response = raw_request(
        addr,
        post_request("/api/space/state", "secret", r#"{"open":true}"#),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 429"));
    assert!(response.to_ascii_lowercase().contains("retry-after:"));

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    assert!(limiter.is_stopped());
}

#[tokio::test]
async fn test_run_fails_on_invalid_address() {
    let config = ServerConfig::builder()
        .listen_address("no-port-given")
        .build();
    let server = SpaceApiServer::new(config, SpaceApi::default());

    let result = server.run(async {}).await;

    assert!(result.is_err());
    assert!(!server.limiter().is_stopped());
}
