//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use anymux::{BoxError, Config, Conn, ConnHandler, HandlerFactory, Routing, Service};

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anymux=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Handler that announces its tag, drains the client, and closes.
pub struct TagHandler(pub &'static str);

#[async_trait]
impl ConnHandler for TagHandler {
    async fn serve(&self, mut conn: Box<dyn Conn>, _peer: SocketAddr) -> io::Result<()> {
        conn.write_all(self.0.as_bytes()).await?;
        // Drain until the client half-closes so the socket closes with a
        // clean FIN instead of resetting unread bytes.
        let mut sink = Vec::new();
        conn.read_to_end(&mut sink).await?;
        conn.shutdown().await
    }
}

/// Factory mapping schemes to tag handlers with fixed routing.
pub struct TagFactory {
    services: HashMap<&'static str, Routing>,
}

impl TagFactory {
    pub fn new(services: impl IntoIterator<Item = (&'static str, Routing)>) -> Self {
        Self {
            services: services.into_iter().collect(),
        }
    }
}

#[async_trait]
impl HandlerFactory for TagFactory {
    async fn build(&self, scheme: &str, _host: &str, _conf: &Config) -> Result<Service, BoxError> {
        let (tag, routing) = self
            .services
            .get_key_value(scheme)
            .ok_or_else(|| format!("unknown scheme {scheme:?}"))?;
        Ok(Service {
            handler: Arc::new(TagHandler(*tag)),
            routing: routing.clone(),
            upstream_urls: Vec::new(),
        })
    }
}

/// Connect with retries so tests do not race listener startup.
pub async fn connect(addr: &str) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(addr).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("could not connect to {addr}");
}

/// Connect, send `payload`, and collect the full response.
pub async fn exchange(addr: &str, payload: &[u8]) -> Vec<u8> {
    let mut stream = connect(addr).await;
    if !payload.is_empty() {
        stream.write_all(payload).await.unwrap();
    }
    stream.shutdown().await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}
