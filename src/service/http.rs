use rouille::{Request, Response, Server};
use serde_json::{Value, json};
use std::io::{self, Read};
use std::sync::Arc;
use tracing::{debug, info};

use super::{Predictor, normalize_request};
use crate::config::ServiceConfig;
use crate::constants::service::{HEALTH_STATUS, MAX_REQUEST_BYTES};
use crate::errors::SortpickError;

/// Shared, read-only state handed to every request.
#[derive(Debug)]
pub struct Context {
    /// Model loaded at startup.
    pub predictor: Predictor,
}

impl Context {
    /// Load the model named by `config` (falling back when unavailable).
    pub fn load(config: &ServiceConfig) -> Context {
        Context {
            predictor: Predictor::load(&config.model_path),
        }
    }
}

/// Route one request. Every response carries a permissive CORS header.
pub fn handle_request(request: &Request, context: &Context) -> Response {
    let response = match (request.method(), request.url().as_str()) {
        ("GET", "/health") => Response::json(&json!({ "status": HEALTH_STATUS })),
        ("POST", "/recommend") => recommend(request, context),
        ("OPTIONS", _) => Response::empty_204()
            .with_additional_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
            .with_additional_header("Access-Control-Allow-Headers", "Content-Type"),
        _ => Response::empty_404(),
    };
    debug!(
        method = request.method(),
        url = %request.url(),
        status = response.status_code,
        "served request"
    );
    response.with_additional_header("Access-Control-Allow-Origin", "*")
}

fn recommend(request: &Request, context: &Context) -> Response {
    let body = match read_body(request) {
        Ok(body) => body,
        Err(BodyError::TooLarge) => {
            return Response::json(&json!({ "error": "request body too large" }))
                .with_status_code(413);
        }
        Err(BodyError::Io(err)) => {
            return Response::json(&json!({ "error": err.to_string() })).with_status_code(400);
        }
    };
    let parsed: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let sequence = normalize_request(&parsed);
    Response::json(&context.predictor.recommend(&sequence))
}

enum BodyError {
    TooLarge,
    Io(io::Error),
}

fn read_body(request: &Request) -> Result<Vec<u8>, BodyError> {
    let mut body = Vec::new();
    if let Some(data) = request.data() {
        data.take(MAX_REQUEST_BYTES + 1)
            .read_to_end(&mut body)
            .map_err(BodyError::Io)?;
    }
    if body.len() as u64 > MAX_REQUEST_BYTES {
        return Err(BodyError::TooLarge);
    }
    Ok(body)
}

/// Bind `config.addr` and serve until the process exits.
pub fn run(config: ServiceConfig) -> Result<(), SortpickError> {
    let context = Arc::new(Context::load(&config));
    info!(
        addr = %config.addr,
        model = %config.model_path.display(),
        ready = context.predictor.is_ready(),
        "starting prediction service"
    );
    let server = Server::new(config.addr.as_str(), move |request| {
        handle_request(request, &context)
    })
    .map_err(|err| {
        SortpickError::Io(io::Error::other(format!(
            "cannot listen on {}: {err}",
            config.addr
        )))
    })?;
    server.run();
    Ok(())
}
