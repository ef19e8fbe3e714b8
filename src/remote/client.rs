//! Protocol client for the remote file-hosting API.
//!
//! Every operation routes its egress through the proxy pool independently:
//! a fresh HTTP client is built per call around the next rotated endpoint,
//! so two consecutive calls on one pipeline item may leave through
//! different proxies. All calls are single-attempt; retry policy belongs to
//! the caller.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::{BytesCodec, FramedRead};
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::proxy::ProxyPool;
use crate::remote::types::{
    AccountData, Envelope, RemoteContent, ServerListData, UploadedFile,
};

const USER_AGENT: &str = "Mozilla/5.0";

/// Client for the remote file-hosting service.
pub struct RemoteHostClient {
    api_base: String,
    upload_host: String,
    site_token: String,
    api_timeout: Duration,
    download_timeout: Duration,
    upload_timeout: Duration,
    proxies: Arc<ProxyPool>,
}

impl RemoteHostClient {
    pub fn new(config: &RemoteConfig, proxies: Arc<ProxyPool>) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            upload_host: config.upload_host.clone(),
            site_token: config.site_token.clone(),
            api_timeout: config.api_timeout(),
            download_timeout: config.download_timeout(),
            upload_timeout: config.upload_timeout(),
            proxies,
        }
    }

    /// Build a client for one call, routed through the next proxy in the
    /// rotation (or direct when the pool is empty).
    fn http_client(&self, timeout: Duration) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT);

        if let Some(endpoint) = self.proxies.next_endpoint() {
            debug!("Routing call via socks5://{endpoint}");
            builder = builder.proxy(reqwest::Proxy::all(format!("socks5://{endpoint}"))?);
        }

        Ok(builder.build()?)
    }

    /// Issue a throwaway account and return its bearer token.
    pub async fn create_account(&self) -> Result<String> {
        let response = self
            .http_client(self.api_timeout)?
            .post(format!("{}/accounts", self.api_base))
            .send()
            .await?;

        let envelope: Envelope<AccountData> = response.json().await?;
        Ok(unwrap_envelope(envelope, "create account")?.token)
    }

    /// Resolve the content tree under a content id. Requires the bearer
    /// token plus the site-scoped credential.
    pub async fn get_content(&self, content_id: &str, token: &str) -> Result<RemoteContent> {
        let response = self
            .http_client(self.api_timeout)?
            .get(format!("{}/contents/{}", self.api_base, content_id))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header("X-Website-Token", &self.site_token)
            .send()
            .await?;

        let envelope: Envelope<RemoteContent> = response.json().await?;
        unwrap_envelope(envelope, "get content")
    }

    /// List upload server names; callers use the first.
    pub async fn list_upload_servers(&self) -> Result<Vec<String>> {
        let response = self
            .http_client(self.api_timeout)?
            .get(format!("{}/servers", self.api_base))
            .send()
            .await?;

        let envelope: Envelope<ServerListData> = response.json().await?;
        let data = unwrap_envelope(envelope, "list servers")?;
        Ok(data.servers.into_iter().map(|s| s.name).collect())
    }

    fn upload_url(&self, server: &str) -> String {
        format!("https://{server}.{}/contents/uploadfile", self.upload_host)
    }

    /// Upload a local file to the given upload server, streaming from disk.
    /// The file is published under `remote_name`, not the local scratch
    /// name. Uses the long upload timeout; body size is unbounded.
    pub async fn upload(&self, path: &Path, remote_name: &str, server: &str) -> Result<UploadedFile> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let stream = FramedRead::new(file, BytesCodec::new());
        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(stream),
            length,
        )
        .file_name(remote_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http_client(self.upload_timeout)?
            .post(self.upload_url(server))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_transfer_error(e, "upload", self.upload_timeout))?;

        let envelope: Envelope<UploadedFile> = response.json().await?;
        unwrap_envelope(envelope, "upload")
    }

    /// Stream a remote link to disk using a session cookie built from the
    /// token. On failure the partial file is left for the caller to delete.
    pub async fn download(&self, link: &str, token: &str, dest: &Path) -> Result<()> {
        let response = self
            .http_client(self.download_timeout)?
            .get(link)
            .header(header::COOKIE, format!("accountToken={token}"))
            .send()
            .await
            .map_err(|e| self.map_transfer_error(e, "download", self.download_timeout))?
            .error_for_status()?;

        let mut stream = response.bytes_stream();
        let mut file = tokio::fs::File::create(dest).await?;

        while let Some(chunk) = stream.next().await {
            let data = chunk
                .map_err(|e| self.map_transfer_error(e, "download", self.download_timeout))?;
            file.write_all(&data).await?;
        }

        file.flush().await?;
        Ok(())
    }

    fn map_transfer_error(&self, e: reqwest::Error, operation: &str, after: Duration) -> Error {
        if e.is_timeout() {
            Error::timeout(operation, after)
        } else {
            Error::from(e)
        }
    }
}

fn unwrap_envelope<T>(envelope: Envelope<T>, operation: &str) -> Result<T> {
    if envelope.status != "ok" {
        return Err(Error::remote_host(format!(
            "{operation}: service returned status '{}'",
            envelope.status
        )));
    }
    envelope
        .data
        .ok_or_else(|| Error::remote_host(format!("{operation}: response carried no data")))
}
