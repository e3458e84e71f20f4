//! Hosted media API client (Cloudinary-compatible upload endpoint).

use crate::traits::{HostError, HostResult, MediaHost, UploadRequest, UploadedMedia};
use async_trait::async_trait;
use bugmail_core::{MediaHostConfig, SignatureAlgorithm};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn hex_digest<D: Digest>(to_sign: &str, api_secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Signs `params` the way the upload API expects: sorted `key=value` pairs
/// joined with `&`, the API secret appended, hex digest of the result.
pub(crate) fn sign_params(
    params: &BTreeMap<&str, String>,
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    match algorithm {
        SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&to_sign, api_secret),
        SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&to_sign, api_secret),
    }
}

/// Half-open byte ranges covering `total` bytes in `chunk_size` steps.
fn chunk_ranges(total: usize, chunk_size: usize) -> Vec<(usize, usize)> {
    if total == 0 {
        return vec![(0, 0)];
    }
    (0..total)
        .step_by(chunk_size.max(1))
        .map(|start| (start, (start + chunk_size).min(total)))
        .collect()
}

/// Extract the host's diagnostic from an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

pub struct CloudinaryHost {
    client: Client,
    config: MediaHostConfig,
}

impl CloudinaryHost {
    pub fn new(config: MediaHostConfig) -> HostResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| HostError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn upload_url(&self, request: &UploadRequest) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            request.resource_type.as_str()
        )
    }

    fn signed_params(&self, timestamp: i64) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("timestamp", timestamp.to_string());
        params.insert("use_filename", "true".to_string());
        params.insert("unique_filename", "false".to_string());
        if !self.config.folder.is_empty() {
            params.insert("folder", self.config.folder.clone());
        }
        params
    }

    fn build_form(
        &self,
        filename: &str,
        chunk: Bytes,
        params: &BTreeMap<&'static str, String>,
        signature: &str,
    ) -> Form {
        let mut form = Form::new().part(
            "file",
            Part::bytes(chunk.to_vec()).file_name(filename.to_string()),
        );
        for (key, value) in params {
            form = form.text(*key, value.clone());
        }
        form.text("api_key", self.config.api_key.clone())
            .text("signature", signature.to_string())
    }

    async fn send_chunk(
        &self,
        url: &str,
        form: Form,
        upload_id: &str,
        range: Option<String>,
    ) -> HostResult<UploadResponse> {
        let mut builder = self.client.post(url).multipart(form);
        if let Some(range) = range {
            builder = builder
                .header("X-Unique-Upload-Id", upload_id)
                .header("Content-Range", range);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HostError::Rejected {
                status: status.as_u16(),
                message: error_message(&error_text),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| HostError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(&self, request: UploadRequest) -> HostResult<UploadedMedia> {
        let url = self.upload_url(&request);
        let total = request.data.len();
        let ranges = chunk_ranges(total, self.config.chunk_size_bytes);
        let chunked = ranges.len() > 1;
        let upload_id = Uuid::new_v4().simple().to_string();

        let timestamp = chrono::Utc::now().timestamp();
        let params = self.signed_params(timestamp);
        let signature = sign_params(
            &params,
            &self.config.api_secret,
            self.config.signature_algorithm,
        );

        tracing::debug!(
            filename = %request.filename,
            resource_type = %request.resource_type,
            size_bytes = total,
            chunks = ranges.len(),
            "Uploading attachment to media host"
        );

        let mut last = None;
        for (start, end) in ranges {
            let chunk = request.data.slice(start..end);
            let form = self.build_form(&request.filename, chunk, &params, &signature);
            let range = chunked.then(|| format!("bytes {}-{}/{}", start, end - 1, total));
            last = Some(self.send_chunk(&url, form, &upload_id, range).await?);
        }

        let response = last.ok_or_else(|| HostError::InvalidResponse("no chunk sent".into()))?;
        let secure_url = response.secure_url.ok_or_else(|| {
            HostError::InvalidResponse("response has no secure_url".to_string())
        })?;

        tracing::info!(
            filename = %request.filename,
            url = %secure_url,
            "Attachment uploaded"
        );

        Ok(UploadedMedia {
            secure_url,
            public_id: response.public_id,
            bytes: response.bytes,
        })
    }

    fn backend_name(&self) -> &'static str {
        "cloudinary"
    }
}
