use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::Digest as _;

use crate::foundation::error::{ReelError, ReelResult};
use crate::request::SourceRef;

/// A source resolved to a readable local file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedAsset {
    pub path: PathBuf,
    pub bytes: u64,
    /// `true` when the file was downloaded into the workspace.
    pub downloaded: bool,
}

/// Resolves a [`SourceRef`] to a local file. Every failure is an input error: the request
/// named something that cannot be read.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, source: &SourceRef, dest_dir: &Path) -> ReelResult<FetchedAsset>;
}

/// Local paths are used in place; URLs are downloaded with a blocking HTTP client.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new() -> ReelResult<Self> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> ReelResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sketchreel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReelError::input(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn download(&self, url: &str, dest_dir: &Path) -> ReelResult<FetchedAsset> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| ReelError::input(format!("unreachable source {url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ReelError::input(format!(
                "unreachable source {url}: HTTP {status}"
            )));
        }
        let body = resp
            .bytes()
            .map_err(|e| ReelError::input(format!("download {url}: {e}")))?;
        if body.is_empty() {
            return Err(ReelError::input(format!("download {url}: empty body")));
        }

        let path = dest_dir.join(cache_file_name(url));
        let mut file = std::fs::File::create(&path)
            .map_err(|e| ReelError::input(format!("store {url} at {}: {e}", path.display())))?;
        file.write_all(&body)
            .map_err(|e| ReelError::input(format!("store {url} at {}: {e}", path.display())))?;
        tracing::debug!(%url, path = %path.display(), bytes = body.len(), "downloaded");
        Ok(FetchedAsset {
            path,
            bytes: body.len() as u64,
            downloaded: true,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, source: &SourceRef, dest_dir: &Path) -> ReelResult<FetchedAsset> {
        match source {
            SourceRef::Path(p) => local_asset(p),
            SourceRef::Url(url) => self.download(url, dest_dir),
        }
    }
}

/// Check that `path` is a readable, non-empty file.
pub fn local_asset(path: &Path) -> ReelResult<FetchedAsset> {
    let meta = std::fs::metadata(path)
        .map_err(|e| ReelError::input(format!("source {} not found: {e}", path.display())))?;
    if !meta.is_file() {
        return Err(ReelError::input(format!(
            "source {} is not a file",
            path.display()
        )));
    }
    if meta.len() == 0 {
        return Err(ReelError::input(format!("source {} is empty", path.display())));
    }
    Ok(FetchedAsset {
        path: path.to_path_buf(),
        bytes: meta.len(),
        downloaded: false,
    })
}

/// Download file name: 16 hex chars of the URL's SHA-256 plus the URL path's extension.
pub fn cache_file_name(url: &str) -> String {
    let digest = sha2::Sha256::digest(url.as_bytes());
    let mut name = String::with_capacity(24);
    for b in &digest[..8] {
        name.push_str(&format!("{b:02x}"));
    }
    if let Some(ext) = url_extension(url) {
        name.push('.');
        name.push_str(&ext);
    }
    name
}

fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let after_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
    let (_, file) = after_scheme.rsplit_once('/')?;
    let (_, ext) = file.rsplit_once('.')?;
    let ok = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    ok.then(|| ext.to_ascii_lowercase())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
