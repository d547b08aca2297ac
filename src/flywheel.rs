/// # Data Service Client
///
/// Minimal blocking client for the data-management REST API. Only the three
/// calls the gear needs are implemented: fetch an acquisition, fetch a
/// session (for the subject code), and download an acquisition file.
///
/// ## API keys
///
/// Keys have the form `host:key` or `host:port:key`; the API root is derived
/// from the host part (`https://host[:port]/api`).

use std::fs::File;
use std::path::Path;

use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::errors::{GearError, Result};
use crate::types::acquisition::{Acquisition, Session};

/// Remote calls used by input staging.
pub trait DataService {
    fn acquisition(&self, id: &str) -> Result<Acquisition>;

    fn session(&self, id: &str) -> Result<Session>;

    /// Download `file_name` from acquisition `acquisition_id` to `dest`.
    fn download_file(&self, acquisition_id: &str, file_name: &str, dest: &Path) -> Result<()>;
}

pub struct FlywheelClient {
    base: Url,
    api_key: String,
    client: Client,
}

impl FlywheelClient {
    /// Client for an explicit API root, e.g. `http://127.0.0.1:8080/api`.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| GearError::InvalidConfig(format!("invalid API url {}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(GearError::InvalidConfig(format!(
                "invalid API url {}",
                base_url
            )));
        }
        // Trailing slash so relative segments append instead of replace.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            api_key: api_key.to_string(),
            client: Client::builder().user_agent("meica-gear").build()?,
        })
    }

    /// Client derived from a `host[:port]:key` API key.
    pub fn from_api_key(api_key: &str) -> Result<Self> {
        let (host, key) = split_api_key(api_key)?;
        Self::new(&format!("https://{}/api", host), key)
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| GearError::InvalidConfig(format!("invalid API url {}", self.base)))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    fn get(&self, segments: &[&str]) -> Result<Response> {
        let url = self.url(segments)?;
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url.clone())
            .header("Authorization", format!("scitran-user {}", self.api_key))
            .send()
            .map_err(|e| GearError::FetchFailed(format!("failed to fetch {}: {}", url, e)))?;
        if !resp.status().is_success() {
            return Err(GearError::FetchFailed(format!(
                "failed to fetch {}: HTTP {}",
                url,
                resp.status()
            )));
        }
        Ok(resp)
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let text = self.get(segments)?.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl DataService for FlywheelClient {
    fn acquisition(&self, id: &str) -> Result<Acquisition> {
        self.get_json(&["acquisitions", id])
    }

    fn session(&self, id: &str) -> Result<Session> {
        self.get_json(&["sessions", id])
    }

    fn download_file(&self, acquisition_id: &str, file_name: &str, dest: &Path) -> Result<()> {
        let mut resp = self.get(&["acquisitions", acquisition_id, "files", file_name])?;
        let mut file = File::create(dest)?;
        resp.copy_to(&mut file)?;
        Ok(())
    }
}

/// Split `host[:port]:key` into (`host[:port]`, `key`).
pub fn split_api_key(api_key: &str) -> Result<(&str, &str)> {
    match api_key.trim().rsplit_once(':') {
        Some((host, key)) if !host.is_empty() && !key.is_empty() => Ok((host, key)),
        _ => Err(GearError::InvalidApiKey(
            "expected <host>[:<port>]:<key>".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_api_key() {
        assert_eq!(split_api_key("example.io:abc").unwrap(), ("example.io", "abc"));
        assert_eq!(
            split_api_key("example.io:8443:abc").unwrap(),
            ("example.io:8443", "abc")
        );
        assert!(matches!(split_api_key("abc"), Err(GearError::InvalidApiKey(_))));
        assert!(matches!(split_api_key(":abc"), Err(GearError::InvalidApiKey(_))));
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let client = FlywheelClient::new("http://127.0.0.1:1/api", "k").unwrap();
        let url = client
            .url(&["acquisitions", "a1", "files", "echo 1#.nii.gz"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:1/api/acquisitions/a1/files/echo%201%23.nii.gz"
        );
    }

    #[test]
    fn test_from_api_key_base() {
        let client = FlywheelClient::from_api_key("example.io:8443:abc").unwrap();
        assert_eq!(client.base.as_str(), "https://example.io:8443/api/");
        assert_eq!(client.api_key, "abc");
    }
}
