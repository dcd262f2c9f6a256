use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use engine::poll::{PollOutcome, poll_until};
use tower_http::cors::{Any, CorsLayer};

use super::{
    DEFAULT_MODEL_ID, DEFAULT_NEGATIVE_PROMPT, GenerateRequest, GenerateResponse,
    GenerationParams, GenerationStatus, LeonardoClient, PlayerPortraitRequest, ProxyConfig,
    ProxyError, SpriteRequest, StatusResponse,
};

const MIN_DIMENSION: u32 = 32;
const MAX_DIMENSION: u32 = 1536;
const MAX_IMAGES: u32 = 8;
const MAX_PROMPT_CHARS: usize = 1_000;

#[derive(Clone)]
pub struct AppState {
    client: LeonardoClient,
    config: Arc<ProxyConfig>,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let client = LeonardoClient::new(&config.api_base, config.api_key.as_deref())?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/leonardo/generate", post(generate))
        .route("/api/leonardo/status/:id", get(status))
        .route("/api/players/generate", post(generate_player))
        .route("/api/sprites/generate", post(generate_sprite))
        .with_state(state)
        .layer(cors)
}

async fn health() -> &'static str {
    "ok"
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ProxyError> {
    payload
        .map(|Json(v)| v)
        .map_err(|rejection| ProxyError::Validation(rejection.body_text()))
}

fn require_key(state: &AppState) -> Result<(), ProxyError> {
    if state.client.has_api_key() {
        Ok(())
    } else {
        Err(ProxyError::MissingApiKey)
    }
}

fn check_dimension(name: &str, value: Option<u32>, default: u32) -> Result<u32, ProxyError> {
    let v = value.unwrap_or(default);
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&v) || v % 8 != 0 {
        return Err(ProxyError::Validation(format!(
            "{name} must be a multiple of 8 between {MIN_DIMENSION} and {MAX_DIMENSION}"
        )));
    }
    Ok(v)
}

/// Applies defaults to a raw request and rejects anything the upstream would refuse.
pub fn generation_params(req: GenerateRequest) -> Result<GenerationParams, ProxyError> {
    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return Err(ProxyError::Validation("prompt is required".to_string()));
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(ProxyError::Validation(format!(
            "prompt is longer than {MAX_PROMPT_CHARS} characters"
        )));
    }
    let width = check_dimension("width", req.width, 512)?;
    let height = check_dimension("height", req.height, 512)?;
    let num_images = req.num_images.unwrap_or(1);
    if !(1..=MAX_IMAGES).contains(&num_images) {
        return Err(ProxyError::Validation(format!(
            "numImages must be between 1 and {MAX_IMAGES}"
        )));
    }
    let guidance = req.guidance.unwrap_or(7.0);
    if !(1.0..=20.0).contains(&guidance) {
        return Err(ProxyError::Validation(
            "guidance must be between 1 and 20".to_string(),
        ));
    }

    Ok(GenerationParams {
        prompt: prompt.to_string(),
        negative_prompt: req
            .negative_prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        model_id: req
            .model_id
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
        width,
        height,
        num_images,
        guidance,
    })
}

pub fn player_prompt(req: &PlayerPortraitRequest) -> Result<String, ProxyError> {
    let name = req.name.trim();
    let position = req.position.trim();
    if name.is_empty() || position.is_empty() {
        return Err(ProxyError::Validation(
            "name and position are required".to_string(),
        ));
    }
    let mut prompt = format!(
        "Dark Side Football trading card portrait of {name}, {position}, menacing defensive stance"
    );
    if let Some(n) = req.jersey_number {
        if n > 99 {
            return Err(ProxyError::Validation(
                "jerseyNumber must be between 0 and 99".to_string(),
            ));
        }
        prompt.push_str(&format!(", jersey number {n}"));
    }
    if let Some(team) = req.team.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        prompt.push_str(&format!(", {team} uniform colors"));
    }
    prompt.push_str(", black and silver palette, stadium floodlights, dramatic rim lighting");
    Ok(prompt)
}

pub fn sprite_prompt(req: &SpriteRequest) -> Result<String, ProxyError> {
    let subject = req.subject.trim();
    if subject.is_empty() {
        return Err(ProxyError::Validation("subject is required".to_string()));
    }
    let pose = req
        .pose
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or("ready stance");
    let mut prompt = format!("16-bit pixel art sprite of a football {subject}, {pose}");
    if let Some(team) = req.team.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        prompt.push_str(&format!(", {team} colors"));
    }
    prompt.push_str(", side view, transparent background, crisp outlines");
    Ok(prompt)
}

fn validate_id(id: &str) -> Result<(), ProxyError> {
    let ok = !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if ok {
        Ok(())
    } else {
        Err(ProxyError::Validation(format!("invalid generation id {id:?}")))
    }
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ProxyError> {
    let params = generation_params(body(payload)?)?;
    require_key(&state)?;
    let id = state.client.create_generation(&params).await?;
    log::info!("generation {id} started");
    Ok(Json(GenerateResponse {
        success: true,
        generation_id: Some(id),
        error: None,
    }))
}

async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ProxyError> {
    validate_id(&id)?;
    require_key(&state)?;
    let status = state.client.generation_status(&id).await?;
    Ok(Json(StatusResponse::from_status(None, status)))
}

async fn generate_player(
    State(state): State<AppState>,
    payload: Result<Json<PlayerPortraitRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ProxyError> {
    let req = body(payload)?;
    let params = generation_params(GenerateRequest {
        prompt: player_prompt(&req)?,
        negative_prompt: Some(DEFAULT_NEGATIVE_PROMPT.to_string()),
        width: Some(512),
        height: Some(768),
        ..GenerateRequest::default()
    })?;
    require_key(&state)?;

    let id = state.client.create_generation(&params).await?;
    log::info!("player portrait {id} started for {}", req.name.trim());
    tokio::time::sleep(state.config.call_delay).await;

    let status = wait_for(&state, &id).await?;
    Ok(Json(StatusResponse::from_status(Some(id), status)))
}

async fn generate_sprite(
    State(state): State<AppState>,
    payload: Result<Json<SpriteRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ProxyError> {
    let req = body(payload)?;
    let params = generation_params(GenerateRequest {
        prompt: sprite_prompt(&req)?,
        negative_prompt: Some(DEFAULT_NEGATIVE_PROMPT.to_string()),
        ..GenerateRequest::default()
    })?;
    require_key(&state)?;
    let id = state.client.create_generation(&params).await?;
    log::info!("sprite {id} started");
    Ok(Json(GenerateResponse {
        success: true,
        generation_id: Some(id),
        error: None,
    }))
}

/// Polls a job until it completes or fails, within the configured budget.
async fn wait_for(state: &AppState, id: &str) -> Result<GenerationStatus, ProxyError> {
    let client = &state.client;
    let outcome = poll_until(
        state.config.poll,
        move |_| client.generation_status(id),
        GenerationStatus::is_settled,
    )
    .await;

    match outcome {
        PollOutcome::Ready { value, .. } if value.is_failed() => Err(ProxyError::GenerationFailed {
            id: id.to_string(),
        }),
        PollOutcome::Ready { value, attempts } => {
            log::info!("generation {id} complete after {attempts} checks");
            Ok(value)
        }
        PollOutcome::TimedOut {
            attempts,
            last_error,
            ..
        } => {
            if let Some(err) = last_error {
                log::warn!("last status error for {id}: {err}");
            }
            Err(ProxyError::TimedOut {
                id: id.to_string(),
                attempts,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_apply_defaults() {
        let params = generation_params(GenerateRequest {
            prompt: "  a linebacker  ".into(),
            ..GenerateRequest::default()
        })
        .unwrap();
        assert_eq!(params.prompt, "a linebacker");
        assert_eq!(params.model_id, DEFAULT_MODEL_ID);
        assert_eq!((params.width, params.height, params.num_images), (512, 512, 1));
        assert_eq!(params.negative_prompt, None);
    }

    #[test]
    fn params_reject_bad_input() {
        let base = || GenerateRequest {
            prompt: "x".into(),
            ..GenerateRequest::default()
        };
        assert!(generation_params(GenerateRequest::default()).is_err());
        assert!(generation_params(GenerateRequest { width: Some(500), ..base() }).is_err());
        assert!(generation_params(GenerateRequest { height: Some(2048), ..base() }).is_err());
        assert!(generation_params(GenerateRequest { num_images: Some(0), ..base() }).is_err());
        assert!(generation_params(GenerateRequest { guidance: Some(40.0), ..base() }).is_err());
    }

    #[test]
    fn player_prompt_includes_details() {
        let prompt = player_prompt(&PlayerPortraitRequest {
            name: "Vader".into(),
            position: "Linebacker".into(),
            jersey_number: Some(66),
            team: Some("Empire".into()),
        })
        .unwrap();
        assert!(prompt.contains("Vader, Linebacker"));
        assert!(prompt.contains("jersey number 66"));
        assert!(prompt.contains("Empire uniform colors"));

        assert!(player_prompt(&PlayerPortraitRequest {
            name: "Vader".into(),
            position: " ".into(),
            ..PlayerPortraitRequest::default()
        })
        .is_err());
    }

    #[test]
    fn sprite_prompt_defaults_pose() {
        let prompt = sprite_prompt(&SpriteRequest {
            subject: "safety".into(),
            ..SpriteRequest::default()
        })
        .unwrap();
        assert!(prompt.contains("football safety, ready stance"));
    }

    #[test]
    fn ids_are_restricted() {
        assert!(validate_id("0f1c-22ab").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("../etc").is_err());
    }
}
