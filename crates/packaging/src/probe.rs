use paperchef_models::AppError;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::debug;

/// Connects once and reports how long the handshake took.
pub async fn probe_tcp(addr: &str, timeout: Duration) -> Result<Duration, AppError> {
    let started = Instant::now();
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => Ok(started.elapsed()),
        Ok(Err(e)) => Err(AppError::Upstream {
            reason: format!("{addr} refused connection: {e}"),
        }),
        Err(_) => Err(AppError::Upstream {
            reason: format!("{addr} did not accept a connection within {timeout:?}"),
        }),
    }
}

const MIN_ATTEMPT: Duration = Duration::from_millis(50);

/// Probes repeatedly until the address is live or `deadline` passes. The last
/// attempt is made once the deadline is reached.
pub async fn wait_until_live(
    addr: &str,
    deadline: Duration,
    interval: Duration,
) -> Result<Duration, AppError> {
    let started = Instant::now();
    let attempt = interval.max(MIN_ATTEMPT);
    loop {
        let remaining = deadline.saturating_sub(started.elapsed());
        match probe_tcp(addr, remaining.min(attempt).max(MIN_ATTEMPT)).await {
            Ok(_) => return Ok(started.elapsed()),
            Err(e) => {
                let remaining = deadline.saturating_sub(started.elapsed());
                if remaining.is_zero() {
                    return Err(e);
                }
                debug!(error = %e, "Not live yet");
                tokio::time::sleep(interval.min(remaining)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn closed_port() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn open_port_is_live() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let elapsed = probe_tcp(&addr, Duration::from_secs(2)).await.unwrap();
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn closed_port_is_an_upstream_error() {
        let addr = closed_port().await;
        let err = probe_tcp(&addr, Duration::from_secs(2)).await.unwrap_err();
        assert_eq!(err.http_status(), 502);
        assert!(err.to_string().contains(&addr));
    }

    #[tokio::test]
    async fn waits_for_a_late_listener() {
        let addr = closed_port().await;
        let bind_addr = addr.clone();
        let server = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let listener = TcpListener::bind(&bind_addr).await.unwrap();
            let _ = listener.accept().await;
        });

        wait_until_live(&addr, Duration::from_secs(5), Duration::from_millis(50))
            .await
            .unwrap();
        server.abort();
    }

    #[tokio::test]
    async fn last_attempt_lands_on_the_deadline() {
        let addr = closed_port().await;
        let bind_addr = addr.clone();
        let server = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let listener = TcpListener::bind(&bind_addr).await.unwrap();
            let _ = listener.accept().await;
        });

        // Attempts at 0ms and 250ms fail; the one at 400ms finds the listener.
        let elapsed =
            wait_until_live(&addr, Duration::from_millis(400), Duration::from_millis(250))
                .await
                .unwrap();
        assert!(elapsed >= Duration::from_millis(300));
        server.abort();
    }

    #[tokio::test]
    async fn gives_up_after_deadline() {
        let addr = closed_port().await;
        let result =
            wait_until_live(&addr, Duration::from_millis(200), Duration::from_millis(50)).await;
        assert!(result.is_err());
    }
}
