use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Mirrors remote resources into the site tree, at most once per path.
pub struct ResourceFetcher {
    client: reqwest::blocking::Client,
    site_dir: PathBuf,
}

impl ResourceFetcher {
    pub fn new(site_dir: &Path) -> anyhow::Result<ResourceFetcher> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("build http client")?;
        Ok(ResourceFetcher {
            client,
            site_dir: site_dir.to_owned(),
        })
    }

    /// Ensures `local_file` (relative to the site directory) holds the
    /// resource at `remote_url`. Returns false without touching the
    /// network when the file is already present. A failed transfer
    /// leaves no file behind, so a later run retries it.
    pub fn ensure(&self, remote_url: &str, local_file: &str) -> anyhow::Result<bool> {
        let target = self.site_dir.join(local_file);
        if target.exists() {
            tracing::debug!(remote_url, local_file, "already mirrored");
            return Ok(false);
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }

        tracing::info!(remote_url, local_file, "fetching");
        let part = self.site_dir.join(format!("{local_file}.part"));
        self.download(remote_url, &part, &target)
            .with_context(|| format!("fetch {remote_url}"))?;
        Ok(true)
    }

    fn download(&self, remote_url: &str, part: &Path, target: &Path) -> anyhow::Result<()> {
        let mut response = self
            .client
            .get(remote_url)
            .send()
            .context("send request")?
            .error_for_status()
            .context("response status")?;

        let mut file = fs::File::create(part)
            .with_context(|| format!("create {}", part.display()))?;
        let copied = io::copy(&mut response, &mut file);
        drop(file);
        if let Err(err) = copied {
            let _ = fs::remove_file(part);
            return Err(err).context("stream response body");
        }

        if let Err(err) = fs::rename(part, target) {
            let _ = fs::remove_file(part);
            return Err(err).with_context(|| format!("move into place {}", target.display()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_file_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("gfx/posts/a")).unwrap();
        fs::write(dir.path().join("gfx/posts/a/pic.jpg"), b"old bytes").unwrap();

        // The URL is unroutable, so reaching the network would fail loudly.
        let fetcher = ResourceFetcher::new(dir.path()).unwrap();
        let fetched = fetcher
            .ensure("http://127.0.0.1:1/pic.jpg", "gfx/posts/a/pic.jpg")
            .unwrap();
        assert!(!fetched);
        assert_eq!(
            fs::read(dir.path().join("gfx/posts/a/pic.jpg")).unwrap(),
            b"old bytes"
        );
    }

    #[test]
    fn failed_fetch_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ResourceFetcher::new(dir.path()).unwrap();
        let err = fetcher
            .ensure("http://127.0.0.1:1/pic.jpg", "gfx/posts/a/pic.jpg")
            .unwrap_err();
        assert!(err.to_string().contains("http://127.0.0.1:1/pic.jpg"));
        assert!(!dir.path().join("gfx/posts/a/pic.jpg").exists());
        assert!(!dir.path().join("gfx/posts/a/pic.jpg.part").exists());
    }
}
