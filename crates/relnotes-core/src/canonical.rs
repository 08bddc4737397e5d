//! Canonical source-repository links for package-index release urls
//!
//! Manifests reference releases through a package index that redirects to
//! the release tarball, e.g.
//! `https://bosh.io/d/github.com/cloudfoundry/capi-release?v=1.2.3`.
//! Release notes want the tag page of the source repository instead:
//! `https://github.com/cloudfoundry/capi-release/releases/tag/1.2.3`.
//! Repositories disagree on whether tags carry a `v` prefix, so both forms
//! are probed.

use reqwest::blocking::Client;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_PACKAGE_INDEX_HOST: &str = "bosh.io";
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Request to {0} timed out")]
    Timeout(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// What a single GET against a candidate url answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 200 OK
    Found,
    /// 3xx with the raw `Location` header value
    Redirect(String),
    /// Any other status, including a redirect without a location
    Status(u16),
}

/// Issues a single request without following redirects
pub trait Probe {
    fn probe(&self, url: &Url) -> Result<ProbeOutcome, ProbeError>;
}

/// Blocking HTTP probe with redirects disabled
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Probe for HttpProbe {
    fn probe(&self, url: &Url) -> Result<ProbeOutcome, ProbeError> {
        let response = self.client.get(url.clone()).send().map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(url.to_string())
            } else {
                ProbeError::Http(e)
            }
        })?;
        let status = response.status();

        if status == StatusCode::OK {
            return Ok(ProbeOutcome::Found);
        }
        if status.is_redirection() {
            if let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
            {
                return Ok(ProbeOutcome::Redirect(location.to_string()));
            }
        }
        Ok(ProbeOutcome::Status(status.as_u16()))
    }
}

/// A release located through the package index
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceRelease {
    host: String,
    owner: String,
    repo: String,
    version: String,
}

impl SourceRelease {
    fn tag_url(&self, tag: &str) -> Option<Url> {
        Url::parse(&format!(
            "https://{}/{}/{}/releases/tag/{}",
            self.host, self.owner, self.repo, tag
        ))
        .ok()
    }
}

/// Rewrites package-index urls into source-repository tag urls
pub struct Canonicalizer<P = HttpProbe> {
    probe: P,
    index_host: String,
    max_redirects: usize,
}

impl<P: Probe> Canonicalizer<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            index_host: DEFAULT_PACKAGE_INDEX_HOST.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn with_index_host(mut self, host: impl Into<String>) -> Self {
        self.index_host = host.into();
        self
    }

    pub fn with_max_redirects(mut self, hops: usize) -> Self {
        self.max_redirects = hops;
        self
    }

    /// Canonical tag url for `raw`, or `None` when `raw` is not a
    /// package-index url or no tag page could be reached.
    pub fn canonicalize(&self, raw: &str) -> Option<String> {
        let source = self.parse_index_url(raw)?;

        for tag in [source.version.clone(), format!("v{}", source.version)] {
            let Some(candidate) = source.tag_url(&tag) else {
                continue;
            };
            if let Some(found) = self.resolve(candidate) {
                return Some(found.to_string());
            }
        }

        warn!(url = raw, "no release tag page found, version will not be linked");
        None
    }

    fn parse_index_url(&self, raw: &str) -> Option<SourceRelease> {
        let url = Url::parse(raw).ok()?;
        if !url.host_str()?.eq_ignore_ascii_case(&self.index_host) {
            return None;
        }

        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        let ["d", host, owner, repo] = segments.as_slice() else {
            debug!(url = raw, "unexpected package index path");
            return None;
        };
        let version = url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())?;

        Some(SourceRelease {
            host: host.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            version,
        })
    }

    /// Follow redirects from `url` until a 200, giving up after
    /// `max_redirects` hops or on any other answer.
    fn resolve(&self, mut url: Url) -> Option<Url> {
        for _ in 0..=self.max_redirects {
            match self.probe.probe(&url) {
                Ok(ProbeOutcome::Found) => return Some(url),
                Ok(ProbeOutcome::Redirect(location)) => match url.join(&location) {
                    Ok(next) => {
                        debug!(from = %url, to = %next, "following redirect");
                        url = next;
                    }
                    Err(e) => {
                        debug!(url = %url, %location, error = %e, "unparseable redirect");
                        return None;
                    }
                },
                Ok(ProbeOutcome::Status(status)) => {
                    debug!(url = %url, status, "candidate rejected");
                    return None;
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "candidate probe failed");
                    return None;
                }
            }
        }

        debug!(url = %url, hops = self.max_redirects, "too many redirects");
        None
    }
}
