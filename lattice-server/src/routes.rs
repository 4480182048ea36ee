use lattice_core::{StateGrid, DEFAULT_BINS, STATE_DIMS};
use lattice_proto::{DiscretizeResponse, ErrorResponse, HealthResponse};
use log::{debug, warn};
use serde_json::Value;

use crate::http::{HttpError, Request, Response};
use crate::query;

/// Dispatches one framed request to its handler.
///
/// Stateless by construction: every discretize call builds its own
/// `StateGrid`, so concurrent workers never share anything mutable.
pub fn route(req: &Request) -> Response {
    debug!("{} {}", req.method, req.path);
    match (req.method.as_str(), req.path.as_str()) {
        ("OPTIONS", _) => Response::empty(200),
        ("GET", "/api") | ("GET", "/api/") => health(),
        ("GET", "/api/discretize") => discretize_get(&req.query),
        ("POST", "/api/discretize") => discretize_post(&req.body),
        ("GET", _) | ("POST", _) => error(404, "Not found"),
        _ => error(405, &format!("Method {} not allowed", req.method)),
    }
}

/// Maps a framing failure onto the JSON error envelope.
pub fn framing_error(err: &HttpError) -> Response {
    let status = match err {
        HttpError::HeadersTooLarge => 431,
        HttpError::BodyTooLarge => 413,
        _ => 400,
    };
    error(status, &err.to_string())
}

fn health() -> Response {
    json(200, &HealthResponse::running())
}

fn discretize_get(query_string: &str) -> Response {
    let params = query::parse(query_string);

    let state = match parse_state_params(&params) {
        Ok(state) => state,
        Err(detail) => return invalid_parameter(&detail),
    };

    let n_bins = match query::first(&params, "n_bins") {
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                return invalid_parameter(&format!("could not convert string to int: '{}'", raw))
            }
        },
        None => DEFAULT_BINS,
    };

    respond_discretized(state, n_bins)
}

/// Query parameters are positionally aligned with the state dimensions;
/// absent parameters default to 0.0.
fn parse_state_params(params: &[(String, String)]) -> Result<[f64; STATE_DIMS], String> {
    const KEYS: [&str; STATE_DIMS] = ["position", "velocity", "angle", "angular_velocity"];
    let mut state = [0.0f64; STATE_DIMS];
    for (slot, key) in state.iter_mut().zip(KEYS) {
        if let Some(raw) = query::first(params, key) {
            *slot = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("could not convert string to float: '{}'", raw))?;
        }
    }
    Ok(state)
}

fn discretize_post(body: &[u8]) -> Response {
    let data: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => return error(400, "Invalid JSON"),
    };

    let raw_state = match data.get("state") {
        None | Some(Value::Null) => return error(400, "Missing 'state' parameter"),
        Some(value) => value,
    };

    let state = match numeric_state(raw_state) {
        Some(state) => state,
        None => return error(400, "'state' must be a list of 4 numbers"),
    };

    let n_bins = match data.get("n_bins") {
        None | Some(Value::Null) => DEFAULT_BINS,
        Some(value) => match value.as_u64() {
            Some(n) => n as usize,
            None => return error(400, "'n_bins' must be a positive integer"),
        },
    };

    respond_discretized(state, n_bins)
}

fn numeric_state(value: &Value) -> Option<[f64; STATE_DIMS]> {
    let items = value.as_array()?;
    if items.len() != STATE_DIMS {
        return None;
    }
    let mut state = [0.0f64; STATE_DIMS];
    for (slot, item) in state.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(state)
}

fn respond_discretized(state: [f64; STATE_DIMS], n_bins: usize) -> Response {
    let grid = match StateGrid::new(n_bins) {
        Ok(grid) => grid,
        Err(e) => return invalid_parameter(&e.to_string()),
    };

    let discretized = grid.discretize(&state);
    debug!(
        "discretize {:?} @ {} bins -> {:?}",
        state, n_bins, discretized
    );

    json(200, &DiscretizeResponse::new(discretized, grid.shape(), state))
}

fn invalid_parameter(detail: &str) -> Response {
    error(400, &format!("Invalid parameter: {}", detail))
}

fn error(status: u16, message: &str) -> Response {
    json(status, &ErrorResponse::new(message))
}

fn json<T: serde::Serialize>(status: u16, value: &T) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => Response::json(status, body),
        Err(e) => {
            warn!("Response serialization failed: {}", e);
            Response::json(
                500,
                r#"{"success":false,"error":"Response serialization failed"}"#.to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_proto::DiscretizeRequest;

    fn get(path: &str, query: &str) -> Request {
        Request {
            method: "GET".to_string(),
            path: path.to_string(),
            query: query.to_string(),
            body: Vec::new(),
        }
    }

    fn post(path: &str, body: &str) -> Request {
        Request {
            method: "POST".to_string(),
            path: path.to_string(),
            query: String::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn body_json(resp: &Response) -> Value {
        serde_json::from_str(resp.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn health_reports_running() {
        let resp = route(&get("/api", ""));
        assert_eq!(resp.status, 200);
        let body = body_json(&resp);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "LATTICE API is running");
    }

    #[test]
    fn options_preflight_is_bodyless() {
        let req = Request {
            method: "OPTIONS".to_string(),
            path: "/api/discretize".to_string(),
            query: String::new(),
            body: Vec::new(),
        };
        let resp = route(&req);
        assert_eq!(resp.status, 200);
        assert!(resp.body.is_none());
    }

    #[test]
    fn get_discretizes_query_parameters() {
        let resp = route(&get(
            "/api/discretize",
            "position=0.0&velocity=0.5&angle=0.0&angular_velocity=-0.5&n_bins=10",
        ));
        assert_eq!(resp.status, 200);
        let body = body_json(&resp);
        assert_eq!(body["success"], true);
        assert_eq!(body["discretized"], serde_json::json!([5, 5, 5, 4]));
        assert_eq!(body["state_shape"], serde_json::json!([10, 10, 10, 10]));
        assert_eq!(
            body["original_state"],
            serde_json::json!([0.0, 0.5, 0.0, -0.5])
        );
    }

    #[test]
    fn get_defaults_absent_parameters() {
        let resp = route(&get("/api/discretize", ""));
        assert_eq!(resp.status, 200);
        let body = body_json(&resp);
        // Zero state under the default 20-bin grid: midpoint edge, bin above.
        assert_eq!(body["discretized"], serde_json::json!([10, 10, 10, 10]));
        assert_eq!(body["state_shape"], serde_json::json!([20, 20, 20, 20]));
    }

    #[test]
    fn get_rejects_malformed_float() {
        let resp = route(&get("/api/discretize", "position=fast"));
        assert_eq!(resp.status, 400);
        let body = body_json(&resp);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["error"],
            "Invalid parameter: could not convert string to float: 'fast'"
        );
    }

    #[test]
    fn get_rejects_zero_bins() {
        let resp = route(&get("/api/discretize", "n_bins=0"));
        assert_eq!(resp.status, 400);
        let body = body_json(&resp);
        assert_eq!(body["error"], "Invalid parameter: n_bins must be at least 1 (got 0)");
    }

    #[test]
    fn post_discretizes_client_request() {
        let body = serde_json::to_string(&DiscretizeRequest {
            state: [0.0, 0.5, 0.0, -0.5],
            n_bins: Some(10),
        })
        .unwrap();
        let resp = route(&post("/api/discretize", &body));
        assert_eq!(resp.status, 200);
        let body = body_json(&resp);
        assert_eq!(body["discretized"], serde_json::json!([5, 5, 5, 4]));
    }

    #[test]
    fn post_clips_out_of_range_states() {
        let resp = route(&post(
            "/api/discretize",
            r#"{"state":[10.0,10.0,1.0,10.0],"n_bins":10}"#,
        ));
        let body = body_json(&resp);
        assert_eq!(body["discretized"], serde_json::json!([9, 9, 9, 9]));
    }

    #[test]
    fn post_rejects_invalid_json() {
        let resp = route(&post("/api/discretize", "{not json"));
        assert_eq!(resp.status, 400);
        assert_eq!(body_json(&resp)["error"], "Invalid JSON");
    }

    #[test]
    fn post_rejects_missing_state() {
        let resp = route(&post("/api/discretize", r#"{"n_bins":10}"#));
        assert_eq!(resp.status, 400);
        assert_eq!(body_json(&resp)["error"], "Missing 'state' parameter");
    }

    #[test]
    fn post_rejects_wrong_length_state() {
        let resp = route(&post("/api/discretize", r#"{"state":[1.0,2.0]}"#));
        assert_eq!(resp.status, 400);
        assert_eq!(
            body_json(&resp)["error"],
            "'state' must be a list of 4 numbers"
        );
    }

    #[test]
    fn post_rejects_non_numeric_state() {
        let resp = route(&post("/api/discretize", r#"{"state":[1.0,"x",0.0,0.0]}"#));
        assert_eq!(resp.status, 400);
        assert_eq!(
            body_json(&resp)["error"],
            "'state' must be a list of 4 numbers"
        );
    }

    #[test]
    fn post_rejects_fractional_bins() {
        let resp = route(&post(
            "/api/discretize",
            r#"{"state":[0.0,0.0,0.0,0.0],"n_bins":2.5}"#,
        ));
        assert_eq!(resp.status, 400);
        assert_eq!(
            body_json(&resp)["error"],
            "'n_bins' must be a positive integer"
        );
    }

    #[test]
    fn unknown_path_is_404() {
        let resp = route(&get("/api/train", ""));
        assert_eq!(resp.status, 404);
        assert_eq!(body_json(&resp)["success"], false);
    }

    #[test]
    fn unsupported_method_is_405() {
        let req = Request {
            method: "DELETE".to_string(),
            path: "/api/discretize".to_string(),
            query: String::new(),
            body: Vec::new(),
        };
        assert_eq!(route(&req).status, 405);
    }

    #[test]
    fn framing_errors_use_error_envelope() {
        let resp = framing_error(&HttpError::BadRequestLine);
        assert_eq!(resp.status, 400);
        assert_eq!(body_json(&resp)["success"], false);
    }
}
