// SPDX-License-Identifier: Apache-2.0

use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::thread;
use tracing::{debug, warn};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportErrorKind {
    Connection,
    InvalidUrl,
    NotFound,
    Status,
    Io,
}

impl TransportErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::InvalidUrl => "invalid_url",
            Self::NotFound => "not_found",
            Self::Status => "http_status",
            Self::Io => "io",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for TransportError {}

/// Injected file transport: fetch `url` into `dest`.
pub trait Downloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), TransportError>;
}

impl<F> Downloader for F
where
    F: Fn(&str, &Path) -> Result<(), TransportError>,
{
    fn download(&self, url: &str, dest: &Path) -> Result<(), TransportError> {
        self(url, dest)
    }
}

/// Blocking HTTP(S) downloader; `file://` URLs are copied from disk.
#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
    retry: RetryPolicy,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder().build().map_err(|e| {
            TransportError::new(TransportErrorKind::Connection, format!("http client: {e}"))
        })?;
        Ok(Self {
            client,
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    fn copy_local(url: &reqwest::Url, dest: &Path) -> Result<(), TransportError> {
        let src = url
            .to_file_path()
            .map_err(|()| TransportError::new(TransportErrorKind::InvalidUrl, url.as_str()))?;
        fs::copy(&src, dest).map(|_| ()).map_err(|e| {
            let kind = if e.kind() == ErrorKind::NotFound {
                TransportErrorKind::NotFound
            } else {
                TransportErrorKind::Io
            };
            TransportError::new(kind, format!("{}: {e}", src.display()))
        })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), TransportError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| TransportError::new(TransportErrorKind::InvalidUrl, format!("{url}: {e}")))?;
        match parsed.scheme() {
            "file" => return Self::copy_local(&parsed, dest),
            "http" | "https" => {}
            other => {
                return Err(TransportError::new(
                    TransportErrorKind::InvalidUrl,
                    format!("unsupported scheme `{other}` in {url}"),
                ))
            }
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(url, attempt, "downloading");
            match self.client.get(parsed.clone()).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status == StatusCode::NOT_FOUND {
                        return Err(TransportError::new(
                            TransportErrorKind::NotFound,
                            format!("{url} returned 404"),
                        ));
                    }
                    if !status.is_success() {
                        return Err(TransportError::new(
                            TransportErrorKind::Status,
                            format!("{url} returned {status}"),
                        ));
                    }
                    let bytes = resp.bytes().map_err(|e| {
                        TransportError::new(TransportErrorKind::Connection, e.to_string())
                    })?;
                    return fs::write(dest, &bytes)
                        .map_err(|e| TransportError::new(TransportErrorKind::Io, e.to_string()));
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    let Some(delay) = self.retry.next_delay(attempt) else {
                        return Err(TransportError::new(
                            TransportErrorKind::Connection,
                            format!("{url}: gave up after {attempt} attempts: {e}"),
                        ));
                    };
                    warn!(url, attempt, delay_ms = delay.as_millis() as u64, error = %e, "download failed, retrying");
                    thread::sleep(delay);
                }
                Err(e) => {
                    return Err(TransportError::new(
                        TransportErrorKind::Connection,
                        e.to_string(),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Downloader, HttpDownloader, TransportError, TransportErrorKind};
    use crate::retry::RetryPolicy;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn closures_are_downloaders() {
        let fail = |url: &str, _dest: &Path| -> Result<(), TransportError> {
            Err(TransportError::new(TransportErrorKind::Connection, url))
        };
        let err = fail.download("https://example.org/x", Path::new("/nonexistent"))
            .expect_err("closure error");
        assert_eq!(err.kind, TransportErrorKind::Connection);
        assert_eq!(err.to_string(), "connection: https://example.org/x");
    }

    #[test]
    fn file_urls_are_copied_and_missing_files_are_not_found() {
        let tmp = tempdir().expect("tempdir");
        let src = tmp.path().join("comp_xref.tsv");
        fs::write(&src, "MNXC3\tMNXC3\n").expect("write");
        let dest = tmp.path().join("copy.tsv");
        let url = format!("file://{}", src.display());
        HttpDownloader::new().expect("http client").download(&url, &dest).expect("copy");
        assert_eq!(fs::read(&dest).expect("read"), b"MNXC3\tMNXC3\n");

        let missing = format!("file://{}", tmp.path().join("absent.tsv").display());
        let err = HttpDownloader::new()
            .expect("http client")
            .download(&missing, &dest)
            .expect_err("missing");
        assert_eq!(err.kind, TransportErrorKind::NotFound);
    }

    #[test]
    fn malformed_urls_are_invalid() {
        let err = HttpDownloader::new()
            .expect("http client")
            .download("not a url", Path::new("/tmp/never"))
            .expect_err("invalid");
        assert_eq!(err.kind, TransportErrorKind::InvalidUrl);
        let err = HttpDownloader::new()
            .expect("http client")
            .download("ftp://ftp.vital-it.ch/databases/", Path::new("/tmp/never"))
            .expect_err("scheme");
        assert_eq!(err.kind, TransportErrorKind::InvalidUrl);
    }

    #[test]
    fn client_construction_is_fallible_and_keeps_the_retry_policy() {
        let downloader = HttpDownloader::new().expect("http client");
        assert_eq!(downloader.retry(), RetryPolicy::default());
        let once = downloader.with_retry(RetryPolicy::once());
        assert_eq!(once.retry(), RetryPolicy::once());
    }

    #[test]
    fn refused_connection_without_retries_is_a_connection_error() {
        let err = HttpDownloader::new()
            .expect("http client")
            .with_retry(RetryPolicy::once())
            .download("http://127.0.0.1:9/chem_xref.tsv", Path::new("/tmp/never"))
            .expect_err("refused");
        assert_eq!(err.kind, TransportErrorKind::Connection);
    }
}
