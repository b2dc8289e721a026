//! HTTP API.
//!
//! | Method | Path            | Result                                  |
//! |--------|-----------------|-----------------------------------------|
//! | GET    | `/api/status`   | controller snapshot                     |
//! | POST   | `/api/lock`     | action result, 409 if the door is open  |
//! | POST   | `/api/unlock`   | action result                           |
//! | POST   | `/api/toggle`   | action result                           |
//! | POST   | `/api/autolock` | `{"seconds": n}`, returns the snapshot  |
//! | GET    | `/health`       | liveness                                |
//!
//! A confirmation timeout is still a 200; the `warning` field carries it.
//! Every action result also has a short `message`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use smartlock_controller::LockController;
use smartlock_core::{ActionOutcome, ControllerSnapshot, Direction, Error, VERSION};
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    controller: LockController,
}

pub fn create_router(controller: LockController) -> Router {
    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/lock", post(lock_handler))
        .route("/api/unlock", post(unlock_handler))
        .route("/api/toggle", post(toggle_handler))
        .route("/api/autolock", post(auto_lock_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { controller })
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    pub action: Direction,
    /// `locked` / `unlocked` once confirmed, otherwise that the command was sent.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub status: ControllerSnapshot,
}

#[derive(Debug, Serialize)]
pub struct AutoLockResponse {
    pub ok: bool,
    pub status: ControllerSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct AutoLockRequest {
    pub seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    ok: bool,
    error: &'static str,
    message: String,
}

/// Controller error rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            Error::DoorOpen => StatusCode::CONFLICT,
            Error::Busy | Error::SensorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::ActuatorUnavailable(_) | Error::Io(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && !self.0.is_refusal() {
            warn!("Request failed: {}", self.0);
        }
        let body = ErrorBody {
            ok: false,
            error: self.0.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn action_response(controller: &LockController, outcome: ActionOutcome) -> Json<ActionResponse> {
    let message = if outcome.is_confirmed() {
        outcome.direction.expected_state().to_string()
    } else {
        format!("{} command sent", outcome.direction)
    };
    Json(ActionResponse {
        ok: true,
        action: outcome.direction,
        message,
        warning: outcome.warning.map(|w| w.to_string()),
        status: controller.status(),
    })
}

async fn status_handler(State(state): State<AppState>) -> Json<ControllerSnapshot> {
    Json(state.controller.status())
}

async fn lock_handler(State(state): State<AppState>) -> Result<Json<ActionResponse>, ApiError> {
    let outcome = state.controller.lock().await?;
    Ok(action_response(&state.controller, outcome))
}

async fn unlock_handler(State(state): State<AppState>) -> Result<Json<ActionResponse>, ApiError> {
    let outcome = state.controller.unlock().await?;
    Ok(action_response(&state.controller, outcome))
}

async fn toggle_handler(State(state): State<AppState>) -> Result<Json<ActionResponse>, ApiError> {
    let outcome = state.controller.toggle().await?;
    Ok(action_response(&state.controller, outcome))
}

async fn auto_lock_handler(
    State(state): State<AppState>,
    Json(request): Json<AutoLockRequest>,
) -> Json<AutoLockResponse> {
    state.controller.set_auto_lock(request.seconds);
    Json(AutoLockResponse {
        ok: true,
        status: state.controller.status(),
    })
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use rstest::rstest;
    use serde_json::Value;
    use smartlock_controller::ControllerConfig;
    use smartlock_hardware::mock::{MockInputPin, MockInputPinHandle};
    use smartlock_hardware::{DigitalSensor, SensorConfig, ServoActuator, ServoConfig};
    use std::time::Duration;
    use tower::ServiceExt;

    fn servo_config() -> ServoConfig {
        ServoConfig {
            rotation_time: Duration::from_millis(200),
            ..ServoConfig::default()
        }
    }

    fn sensor(name: &str, level: bool) -> (DigitalSensor, MockInputPinHandle) {
        let (pin, handle) = MockInputPin::with_name(name, level);
        let config = SensorConfig::new(name, 0).with_active_low(false);
        (DigitalSensor::spawn(config, pin.into()), handle)
    }

    fn controller(lock: DigitalSensor, door: DigitalSensor) -> LockController {
        LockController::new(
            lock,
            door,
            ServoActuator::dry_run(servo_config()).unwrap(),
            ControllerConfig {
                confirm_timeout: Duration::from_secs(1),
                ..ControllerConfig::default()
            },
        )
    }

    fn sensorless() -> LockController {
        controller(DigitalSensor::disabled("lock"), DigitalSensor::disabled("door"))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if body.is_some() {
            request = request.header("content-type", "application/json");
        }
        let request = request
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_snapshot_fields() {
        let app = create_router(sensorless());
        let (status, json) = send(app, "GET", "/api/status", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["lockState"], "unknown");
        assert_eq!(json["doorState"], "unknown");
        assert_eq!(json["autoLockEnabled"], false);
        assert_eq!(json["autoLockSeconds"], 0);
        assert_eq!(json["lastActionWarning"], Value::Null);
        assert_eq!(json["busy"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_with_warning_is_ok() {
        let app = create_router(sensorless());
        let (status, json) = send(app, "POST", "/api/lock", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
        assert_eq!(json["action"], "lock");
        assert_eq!(json["message"], "lock command sent");
        assert!(json["warning"].as_str().unwrap().contains("could not confirm locked"));
        assert_eq!(json["status"]["busy"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_unlock_has_no_warning() {
        let (lock, lock_pin) = sensor("lock", false);
        let app = create_router(controller(lock, DigitalSensor::disabled("door")));
        settle().await;

        let (status, json) = send(app, "POST", "/api/unlock", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["action"], "unlock");
        assert_eq!(json["message"], "unlocked");
        assert!(json.get("warning").is_none());
        assert_eq!(json["status"]["lockState"], "unlocked");
        drop(lock_pin);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_with_door_open_is_conflict() {
        let (door, _door_pin) = sensor("door", false);
        let app = create_router(controller(DigitalSensor::disabled("lock"), door));
        settle().await;

        let (status, json) = send(app, "POST", "/api/lock", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "door_open");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_command_is_busy() {
        let controller = sensorless();
        let app = create_router(controller.clone());

        let worker = controller.clone();
        let action = tokio::spawn(async move { worker.unlock().await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (status, json) = send(app, "POST", "/api/toggle", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "busy");

        action.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_auto_lock() {
        let app = create_router(sensorless());

        let (status, json) =
            send(app.clone(), "POST", "/api/autolock", Some(r#"{"seconds": 30}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"]["autoLockEnabled"], true);
        assert_eq!(json["status"]["autoLockSeconds"], 30);

        let (_, json) = send(app, "POST", "/api/autolock", Some(r#"{"seconds": 0}"#)).await;
        assert_eq!(json["status"]["autoLockEnabled"], false);
    }

    #[rstest]
    #[case::negative(r#"{"seconds": -1}"#)]
    #[case::missing(r#"{}"#)]
    #[case::not_a_number(r#"{"seconds": "ten"}"#)]
    #[tokio::test(start_paused = true)]
    async fn test_invalid_auto_lock_body(#[case] body: &str) {
        let app = create_router(sensorless());
        let (status, _) = send(app, "POST", "/api/autolock", Some(body)).await;
        assert!(status.is_client_error());
    }

    #[rstest]
    #[case(Error::DoorOpen, StatusCode::CONFLICT)]
    #[case(Error::Busy, StatusCode::SERVICE_UNAVAILABLE)]
    #[case(Error::ActuatorUnavailable("pwm".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_error_status_codes(#[case] error: Error, #[case] expected: StatusCode) {
        assert_eq!(ApiError::from(error).status_code(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_health() {
        let app = create_router(sensorless());
        let (status, json) = send(app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }
}
