//! Accept loop tests over real sockets

mod common;

use std::time::Duration;

use common::{Reply, site_with};
use porter::config::ServerConfig;
use porter::http::connection::{Connection, ConnectionLimits};
use porter::server::listener;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn fetch(addr: std::net::SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(raw).await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_bind_uses_all_interfaces() {
    let cfg = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let listener = listener::bind(&cfg).unwrap();
    let addr = listener.local_addr().unwrap();

    assert!(addr.ip().is_unspecified());
    assert_ne!(addr.port(), 0);
}

#[tokio::test]
async fn test_serve_handles_connections_one_after_another() {
    let site = site_with(&[("a.txt", b"first"), ("b.sh", b"printf second")], |_| {});
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let limits = ConnectionLimits::from_config(&site.cfg);

    let server = tokio::spawn(listener::serve(listener, site.site.clone(), limits));

    let first = Reply::parse(&fetch(addr, b"GET /a.txt HTTP/1.1\r\n\r\n").await);
    let missing = Reply::parse(&fetch(addr, b"GET /missing HTTP/1.1\r\n\r\n").await);
    let second = Reply::parse(&fetch(addr, b"GET /b.sh HTTP/1.1\r\n\r\n").await);

    assert_eq!(first.body, b"first".to_vec());
    assert_eq!(missing.status, 404);
    assert_eq!(second.body, b"second".to_vec());

    // A client that leaves without sending anything does not stop the loop.
    drop(TcpStream::connect(addr).await.unwrap());
    let again = Reply::parse(&fetch(addr, b"GET /a.txt HTTP/1.1\r\n\r\n").await);
    assert_eq!(again.status, 200);

    server.abort();
}

#[tokio::test]
async fn test_silent_client_gets_no_response() {
    let site = site_with(&[("index.html", b"x")], |_| {});
    let limits = ConnectionLimits::from_config(&site.cfg);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        Connection::new(socket, site.site.clone(), limits)
            .run()
            .await
    });

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.shutdown().await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();

    assert!(response.is_empty());
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_read_timeout_closes_idle_connection() {
    let site = site_with(&[("index.html", b"x")], |_| {});
    let limits = ConnectionLimits {
        read_timeout: Some(Duration::from_millis(100)),
        ..ConnectionLimits::from_config(&site.cfg)
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        Connection::new(socket, site.site.clone(), limits)
            .run()
            .await
    });

    let mut client = TcpStream::connect(addr).await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut response))
        .await
        .expect("server never closed the idle connection")
        .unwrap();

    assert!(response.is_empty());
    assert!(handle.await.unwrap().is_err());
}

#[tokio::test]
async fn test_small_buffer_limits_single_read() {
    let site = site_with(&[("index.html", b"root")], |cfg| cfg.server.buffer_size = 8);
    let limits = ConnectionLimits::from_config(&site.cfg);

    let (mut client, server) = tokio::io::duplex(64 * 1024);
    client.write_all(b"GET /long.html HTTP/1.1\r\n\r\n").await.unwrap();

    // Only "GET /lon" fits in the buffer: no terminating space, so "/" is served.
    Connection::new(server, site.site.clone(), limits).run().await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    assert_eq!(Reply::parse(&response).body, b"root".to_vec());
}
