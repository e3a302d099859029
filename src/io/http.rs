use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{anyhow, bail, Result};

/// Attempts per Range request before giving up on a flaky connection.
const MAX_ATTEMPTS: u32 = 10;

/// Positional reader over an HTTP URL, one Range request per read.
///
/// The server must advertise `Accept-Ranges: bytes` and a
/// `Content-Length`; both are checked once, up front.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    pub async fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let size = remote_size(&client, &url).await?;
        log::debug!("{} is {} bytes", url, size);

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Payload bytes received so far, across all reads.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// One Range request for `buf.len()` bytes at `start`, retried on
    /// timeouts and refused connections. Returns the bytes copied, `0`
    /// if the server sent an empty body.
    async fn fetch_into(&self, start: u64, buf: &mut [u8]) -> io::Result<usize> {
        let range = format!("bytes={}-{}", start, start + buf.len() as u64 - 1);
        let mut attempt = 0;
        loop {
            let err = match self.client.get(&self.url).header("Range", &range).send().await {
                Ok(resp) if resp.status() == StatusCode::PARTIAL_CONTENT => {
                    let body = resp.bytes().await.map_err(io::Error::other)?;
                    let n = body.len().min(buf.len());
                    buf[..n].copy_from_slice(&body[..n]);
                    self.transferred_bytes.fetch_add(n as u64, Ordering::Relaxed);
                    return Ok(n);
                }
                Ok(resp) => {
                    return Err(io::Error::other(format!(
                        "range {} of {} answered with {}",
                        range,
                        self.url,
                        resp.status()
                    )));
                }
                Err(e) if e.is_timeout() || e.is_connect() => e,
                Err(e) => return Err(io::Error::other(e)),
            };

            attempt += 1;
            if attempt >= MAX_ATTEMPTS {
                return Err(io::Error::new(io::ErrorKind::TimedOut, err));
            }
            log::warn!("range {} failed, retry {}/{}: {}", range, attempt, MAX_ATTEMPTS, err);
            tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
        }
    }
}

/// Size of the resource at `url`, from a HEAD request.
async fn remote_size(client: &Client, url: &str) -> Result<u64> {
    let resp = client.head(url).send().await?;
    if !resp.status().is_success() {
        bail!("HEAD {} failed with status {}", url, resp.status());
    }

    let headers = resp.headers();
    let ranges = headers
        .get(reqwest::header::ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");
    if !ranges.contains("bytes") {
        bail!("{} does not accept Range requests", url);
    }

    headers
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| anyhow!("{} sent no Content-Length", url))
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let want = buf.len().min(usize::try_from(self.size - offset).unwrap_or(usize::MAX));
        let mut received = 0;
        while received < want {
            let n = self
                .fetch_into(offset + received as u64, &mut buf[received..want])
                .await?;
            if n == 0 {
                break;
            }
            received += n;
        }
        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
