//! Shared HTTP client construction for the speech and completion services

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::{Error, Result};

/// Connection attempts give up well before the overall deadline
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a client whose requests fail once `timeout` elapses
///
/// # Errors
///
/// Returns error if the HTTP client cannot be built
pub fn client(timeout: Duration) -> Result<Client> {
    builder(timeout).build().map_err(Error::Http)
}

fn builder(timeout: Duration) -> ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .user_agent(concat!("pair-voice/", env!("CARGO_PKG_VERSION")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever answering
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let client = builder(Duration::from_millis(200))
            .no_proxy()
            .build()
            .unwrap();
        let err = client
            .get(format!("http://{addr}/"))
            .send()
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        server.abort();
    }
}
