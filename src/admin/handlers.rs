use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::engine::{ProxyEngine, StatusReport};
use crate::routing::Route;

/// `{success, error?, ...}` envelope shared by all control responses.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ControlResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Display) -> Self {
        let error = error.to_string();
        tracing::warn!(error = %error, "Control operation failed");
        Self {
            success: false,
            error: Some(error),
            ..Default::default()
        }
    }

    fn from_result<T, E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(e) => Self::failed(e),
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: StatusReport,
}

#[derive(Deserialize)]
pub struct SetPortRequest {
    pub port: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub path_prefix: String,
    pub target_base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRouteRequest {
    pub route_id: String,
    pub path_prefix: String,
    pub target_base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteIdRequest {
    pub route_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatRequest {
    pub log_id: String,
}

type Engine = State<Arc<ProxyEngine>>;
type Payload<T> = Result<Json<T>, JsonRejection>;

/// Unwrap a JSON body, answering malformed input with the failure envelope.
macro_rules! parse_body {
    ($payload:expr) => {
        match $payload {
            Ok(Json(req)) => req,
            Err(rejection) => return Json(ControlResponse::failed(rejection.body_text())),
        }
    };
}

pub async fn get_status(State(engine): Engine) -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        report: engine.status().await,
    })
}

pub async fn set_port(State(engine): Engine, payload: Payload<SetPortRequest>) -> Json<ControlResponse> {
    let req = parse_body!(payload);
    Json(ControlResponse::from_result(engine.set_port(req.port).await))
}

pub async fn add_route(State(engine): Engine, payload: Payload<RouteRequest>) -> Json<ControlResponse> {
    let req = parse_body!(payload);
    let response = match engine.add_route(&req.path_prefix, &req.target_base_url) {
        Ok(route) => ControlResponse {
            route: Some(route),
            ..ControlResponse::ok()
        },
        Err(e) => ControlResponse::failed(e),
    };
    Json(response)
}

pub async fn remove_route(State(engine): Engine, payload: Payload<RouteIdRequest>) -> Json<ControlResponse> {
    let req = parse_body!(payload);
    Json(ControlResponse::from_result(engine.remove_route(&req.route_id)))
}

pub async fn edit_route(State(engine): Engine, payload: Payload<EditRouteRequest>) -> Json<ControlResponse> {
    let req = parse_body!(payload);
    Json(ControlResponse::from_result(engine.edit_route(
        &req.route_id,
        &req.path_prefix,
        &req.target_base_url,
    )))
}

pub async fn toggle_route(State(engine): Engine, payload: Payload<RouteIdRequest>) -> Json<ControlResponse> {
    let req = parse_body!(payload);
    Json(ControlResponse::from_result(engine.toggle_route(&req.route_id)))
}

pub async fn start_proxy(State(engine): Engine) -> Json<ControlResponse> {
    Json(ControlResponse::from_result(engine.start().await))
}

pub async fn stop_proxy(State(engine): Engine) -> Json<ControlResponse> {
    Json(ControlResponse::from_result(engine.stop().await))
}

pub async fn clear_logs(State(engine): Engine) -> Json<ControlResponse> {
    engine.clear_logs();
    Json(ControlResponse::ok())
}

pub async fn repeat_request(State(engine): Engine, payload: Payload<RepeatRequest>) -> Json<ControlResponse> {
    let req = parse_body!(payload);
    let response = match engine.repeat_request(&req.log_id).await {
        Ok(outcome) => ControlResponse {
            status: Some(outcome.status),
            body: Some(outcome.body),
            ..ControlResponse::ok()
        },
        Err(e) => ControlResponse::failed(e),
    };
    Json(response)
}
