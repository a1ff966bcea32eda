use crate::{config::Config, errors::WhoisError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::{timeout, timeout_at, Instant},
};
use tracing::debug;

/// One request/response exchange with a WHOIS server.
///
/// Implementations open a fresh connection per call and never retry; retry
/// policy belongs to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        server: &str,
        query: &str,
        timeout: Duration,
    ) -> Result<Vec<u8>, WhoisError>;
}

/// Plain TCP transport speaking the port 43 protocol.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    port: u16,
    buffer_size: usize,
    max_response_size: usize,
}

impl TcpTransport {
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.whois_port,
            buffer_size: config.buffer_size,
            max_response_size: config.max_response_size,
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(
        &self,
        server: &str,
        query: &str,
        query_timeout: Duration,
    ) -> Result<Vec<u8>, WhoisError> {
        let mut stream = match timeout(query_timeout, TcpStream::connect((server, self.port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                debug!("Failed to connect to whois server {}: {}", server, e);
                return Err(WhoisError::connect(server, e));
            }
            Err(_) => {
                debug!("Timeout connecting to whois server: {}", server);
                return Err(WhoisError::Timeout);
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }

        // Writing and reading share one deadline
        let deadline = Instant::now() + query_timeout;

        let query_line = format!("{}\r\n", query);
        timeout_at(deadline, stream.write_all(query_line.as_bytes()))
            .await?
            .map_err(|e| WhoisError::connect(server, e))?;

        let mut buffer = vec![0u8; self.buffer_size];
        let mut response = Vec::new();

        loop {
            match timeout_at(deadline, stream.read(&mut buffer)).await? {
                Ok(0) => break, // EOF
                Ok(n) => {
                    response.extend_from_slice(&buffer[..n]);
                    if response.len() > self.max_response_size {
                        return Err(WhoisError::ResponseTooLarge);
                    }
                }
                // Some servers reset instead of closing once they are done
                Err(e) if !response.is_empty() => {
                    debug!("Read from {} ended with {} after {} bytes", server, e, response.len());
                    break;
                }
                Err(e) => return Err(WhoisError::connect(server, e)),
            }
        }

        if response.is_empty() {
            return Err(WhoisError::EmptyResponse(server.to_string()));
        }

        debug!("Received {} bytes from {}", response.len(), server);
        Ok(response)
    }
}
