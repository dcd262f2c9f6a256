use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request, StatusCode};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};

use super::ProxyError;

type HttpClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

pub const STATUS_COMPLETE: &str = "COMPLETE";
pub const STATUS_FAILED: &str = "FAILED";

/// Parameters for one upstream generation job, after defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub model_id: String,
    pub width: u32,
    pub height: u32,
    pub num_images: u32,
    pub guidance: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationStatus {
    pub status: String,
    pub images: Vec<GeneratedImage>,
}

impl GenerationStatus {
    pub fn is_complete(&self) -> bool {
        self.status == STATUS_COMPLETE
    }

    pub fn is_failed(&self) -> bool {
        self.status == STATUS_FAILED
    }

    pub fn is_settled(&self) -> bool {
        self.is_complete() || self.is_failed()
    }
}

#[derive(Serialize)]
struct CreateGenerationBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    #[serde(rename = "modelId")]
    model_id: &'a str,
    width: u32,
    height: u32,
    num_images: u32,
    guidance_scale: f32,
}

#[derive(Deserialize)]
struct CreateGenerationReply {
    #[serde(rename = "sdGenerationJob")]
    job: Option<GenerationJob>,
}

#[derive(Deserialize)]
struct GenerationJob {
    #[serde(rename = "generationId")]
    generation_id: String,
}

#[derive(Deserialize)]
struct StatusReply {
    generations_by_pk: Option<GenerationRecord>,
}

#[derive(Deserialize)]
struct GenerationRecord {
    status: String,
    #[serde(default)]
    generated_images: Vec<GeneratedImage>,
}

#[derive(Debug, Clone)]
pub struct LeonardoClient {
    http: HttpClient,
    base: Arc<str>,
    api_key: Option<Arc<str>>,
}

impl LeonardoClient {
    /// Builds a client that speaks both https (webpki roots) and plain http.
    pub fn new(base: &str, api_key: Option<&str>) -> Result<Self, ProxyError> {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls = rustls::ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .map_err(|err| ProxyError::Transport(format!("tls setup: {err}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();

        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_or_http()
            .enable_http1()
            .build();
        let http = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            http,
            base: Arc::from(base.trim_end_matches('/')),
            api_key: api_key.map(Arc::from),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Starts a generation job and returns its id.
    pub async fn create_generation(&self, params: &GenerationParams) -> Result<String, ProxyError> {
        let body = CreateGenerationBody {
            prompt: &params.prompt,
            negative_prompt: params.negative_prompt.as_deref(),
            model_id: &params.model_id,
            width: params.width,
            height: params.height,
            num_images: params.num_images,
            guidance_scale: params.guidance,
        };
        let body = serde_json::to_vec(&body).map_err(|err| ProxyError::Decode(err.to_string()))?;
        let bytes = self.send(Method::POST, "/generations", Some(body)).await?;
        let reply: CreateGenerationReply =
            serde_json::from_slice(&bytes).map_err(|err| ProxyError::Decode(err.to_string()))?;
        reply
            .job
            .map(|job| job.generation_id)
            .ok_or_else(|| ProxyError::Decode("response has no sdGenerationJob".to_string()))
    }

    pub async fn generation_status(&self, id: &str) -> Result<GenerationStatus, ProxyError> {
        let bytes = self
            .send(Method::GET, &format!("/generations/{id}"), None)
            .await?;
        let reply: StatusReply =
            serde_json::from_slice(&bytes).map_err(|err| ProxyError::Decode(err.to_string()))?;
        let record = reply
            .generations_by_pk
            .ok_or_else(|| ProxyError::Decode(format!("no generation record for {id}")))?;
        Ok(GenerationStatus {
            status: record.status,
            images: record.generated_images,
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, ProxyError> {
        let key = self.api_key.as_deref().ok_or(ProxyError::MissingApiKey)?;
        let uri = format!("{}{path}", self.base);

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(&uri)
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .header(ACCEPT, "application/json");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|err| ProxyError::Transport(err.to_string()))?;

        log::debug!("{method} {uri}");
        let response = self
            .http
            .request(request)
            .await
            .map_err(|err| ProxyError::Transport(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|err| ProxyError::Transport(err.to_string()))?
            .to_bytes();

        if !status.is_success() {
            let message = upstream_message(&bytes, status);
            log::warn!("upstream {method} {path} returned {status}: {message}");
            return Err(ProxyError::Upstream { status, message });
        }
        Ok(bytes)
    }
}

/// Pulls a human-readable message out of an upstream error body.
fn upstream_message(body: &[u8], status: StatusCode) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_slice(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.get("error").or_else(|| v.get("message")))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("upstream error")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_prefers_json_error_field() {
        let body = br#"{"error":"Invalid model"}"#;
        assert_eq!(upstream_message(body, StatusCode::BAD_REQUEST), "Invalid model");
        let body = br#"{"message":"quota"}"#;
        assert_eq!(upstream_message(body, StatusCode::TOO_MANY_REQUESTS), "quota");
        assert_eq!(
            upstream_message(b"<html>", StatusCode::BAD_GATEWAY),
            "Bad Gateway"
        );
    }

    #[test]
    fn create_body_uses_upstream_field_names() {
        let body = CreateGenerationBody {
            prompt: "p",
            negative_prompt: None,
            model_id: "m",
            width: 512,
            height: 768,
            num_images: 1,
            guidance_scale: 7.0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["modelId"], "m");
        assert_eq!(json["num_images"], 1);
        assert_eq!(json["guidance_scale"], 7.0);
        assert!(json.get("negative_prompt").is_none());
    }

    #[test]
    fn status_reply_decodes_images() {
        let json = r#"{"generations_by_pk":{"status":"COMPLETE","generated_images":[{"id":"i1","url":"https://cdn/x.png","nsfw":false}]}}"#;
        let reply: StatusReply = serde_json::from_str(json).unwrap();
        let record = reply.generations_by_pk.unwrap();
        assert_eq!(record.status, STATUS_COMPLETE);
        assert_eq!(record.generated_images[0].url, "https://cdn/x.png");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = LeonardoClient::new("http://127.0.0.1:9", None).unwrap();
        assert!(!client.has_api_key());
        let err = client.generation_status("abc").await.unwrap_err();
        assert!(matches!(err, ProxyError::MissingApiKey));
    }
}
