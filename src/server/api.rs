use crate::dashboard::{Dashboard, RenderReply, RenderRequest};
use crate::error::DashboardError;
use crate::server::AppState;
use crate::upload::preview_tsv;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

const INDEX_HTML: &str = include_str!("index.html");

/// Query parameters for /api/render. Anything missing takes the control's
/// default; `companies` is comma separated and, when present but empty,
/// means nothing is selected.
#[derive(Debug, Default, Deserialize)]
pub struct RenderQuery {
    pub days: Option<u32>,
    pub ymin: Option<f64>,
    pub ymax: Option<f64>,
    pub companies: Option<String>,
}

impl RenderQuery {
    pub fn into_request(self, dashboard: &Dashboard) -> RenderRequest {
        let defaults = dashboard.default_request();

        RenderRequest {
            days: self.days.unwrap_or(defaults.days),
            price_range: (
                self.ymin.unwrap_or(defaults.price_range.0),
                self.ymax.unwrap_or(defaults.price_range.1),
            ),
            companies: match self.companies {
                Some(list) => list
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                None => defaults.companies,
            },
        }
    }
}

/// Control defaults for building the page.
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub companies: Vec<String>,
    pub default_days: u32,
    pub min_days: u32,
    pub max_days: u32,
    pub price_floor: f64,
    pub price_ceiling: f64,
}

fn status_for(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::EmptySelection => StatusCode::UNPROCESSABLE_ENTITY,
        DashboardError::DataUnavailable { .. } => StatusCode::BAD_GATEWAY,
        DashboardError::MalformedUpload(_)
        | DashboardError::UnknownCompany(_)
        | DashboardError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
    }
}

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health_handler() -> &'static str {
    "ok"
}

pub async fn options_handler(State(state): State<AppState>) -> Json<OptionsResponse> {
    let dash = &state.dashboard;
    let limits = dash.limits();

    Json(OptionsResponse {
        companies: dash.mapping().names(),
        default_days: limits.default_days,
        min_days: 1,
        max_days: limits.max_days,
        price_floor: limits.price_floor,
        price_ceiling: limits.price_ceiling,
    })
}

pub async fn render_handler(
    State(state): State<AppState>,
    query: Result<Query<RenderQuery>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(query)) => {
            let req = query.into_request(&state.dashboard);
            state.dashboard.render(&req).await
        }
        Err(rejection) => Err(DashboardError::InvalidParameters(rejection.body_text())),
    };

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => status_for(e),
    };
    (status, Json(RenderReply::from(result))).into_response()
}

pub async fn preview_handler(body: Bytes) -> Response {
    match preview_tsv(&body) {
        Ok(table) => Json(table).into_response(),
        Err(e) => {
            warn!("Upload preview failed: {}", e);
            let body = json!({
                "status": "error",
                "kind": e.kind(),
                "message": e.user_message(),
            });
            (status_for(&e), Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::error::{EMPTY_SELECTION_MESSAGE, GENERIC_ERROR_MESSAGE};
    use crate::provider::testing::{daily, march, FakeSource};
    use crate::server::router;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use axum::Router;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<FakeSource>) {
        let src = Arc::new(
            FakeSource::new()
                .with_series("AAPL", daily(march(4), &[Some(100.0), Some(102.0)]))
                .with_series("GOOGL", daily(march(4), &[Some(140.0), None])),
        );
        let mapping =
            crate::models::SymbolMapping::from_pairs([("apple", "AAPL"), ("google", "GOOGL")]).unwrap();
        let dashboard = Arc::new(Dashboard::with_mapping(src.clone(), mapping, DashboardConfig::default()));
        (router(AppState { dashboard }, 1024), src)
    }

    async fn call(app: Router, method: Method, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
        let resp = app
            .oneshot(Request::builder().method(method).uri(uri).body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, bytes) = call(app, Method::GET, uri, Body::empty()).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_query_defaults_and_company_list() {
        let dash = Dashboard::new(Arc::new(FakeSource::new()), DashboardConfig::default());

        let req = RenderQuery::default().into_request(&dash);
        assert_eq!(req, dash.default_request());

        let req = RenderQuery {
            days: Some(10),
            ymax: Some(200.0),
            companies: Some(" apple, ,google ".into()),
            ..RenderQuery::default()
        }
        .into_request(&dash);
        assert_eq!(req.days, 10);
        assert_eq!(req.price_range, (0.0, 200.0));
        assert_eq!(req.companies, vec!["apple", "google"]);

        let req = RenderQuery { companies: Some(String::new()), ..RenderQuery::default() }.into_request(&dash);
        assert!(req.companies.is_empty());
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let (app, _) = app();
        let (status, body) = call(app.clone(), Method::GET, "/", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("vegaEmbed"));

        let (status, body) = call(app, Method::GET, "/health", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_options() {
        let (app, _) = app();
        let (status, v) = get_json(app, "/api/options").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["companies"], json!(["apple", "google"]));
        assert_eq!(v["default_days"], 50);
        assert_eq!(v["max_days"], 100);
    }

    #[tokio::test]
    async fn test_render_ok() {
        let (app, src) = app();
        let (status, v) = get_json(app, "/api/render?days=2&ymin=0&ymax=150&companies=apple,google").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["status"], "ok");
        assert_eq!(v["table"]["columns"], json!(["04 March 2024", "05 March 2024"]));
        assert_eq!(v["chart"]["encoding"]["y"]["scale"]["domain"], json!([0.0, 150.0]));
        assert_eq!(v["chart"]["data"]["values"].as_array().unwrap().len(), 4);
        assert!(v["chart"]["data"]["values"][3]["Stock Prices(USD)"].is_null());
        assert_eq!(src.calls(), 2);
    }

    #[tokio::test]
    async fn test_render_empty_selection() {
        let (app, src) = app();
        let (status, v) = get_json(app, "/api/render?companies=").await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(v["kind"], "empty_selection");
        assert_eq!(v["message"], EMPTY_SELECTION_MESSAGE);
        assert_eq!(src.calls(), 0);
    }

    #[tokio::test]
    async fn test_render_generic_errors() {
        let (app, _) = app();

        let (status, v) = get_json(app.clone(), "/api/render?companies=ibm").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["kind"], "generic");
        assert_eq!(v["message"], GENERIC_ERROR_MESSAGE);

        let (status, v) = get_json(app, "/api/render?days=500").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["message"], GENERIC_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_render_malformed_query_is_generic_error() {
        let (app, src) = app();

        for uri in [
            "/api/render?days=abc",
            "/api/render?days=-1",
            "/api/render?ymax=high",
            "/api/render?companies=apple&companies=google",
        ] {
            let (status, v) = get_json(app.clone(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(
                v,
                json!({ "status": "error", "kind": "generic", "message": GENERIC_ERROR_MESSAGE }),
                "{uri}"
            );
        }
        assert_eq!(src.calls(), 0);
    }

    #[tokio::test]
    async fn test_render_provider_failure_is_bad_gateway() {
        let dashboard = Arc::new(Dashboard::new(Arc::new(FakeSource::new()), DashboardConfig::default()));
        let app = router(AppState { dashboard }, 1024);

        let (status, v) = get_json(app, "/api/render").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(v["message"], GENERIC_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_preview() {
        let (app, src) = app();
        let (status, bytes) = call(app.clone(), Method::POST, "/api/preview", Body::from("a\tb\n1\t2\n")).await;
        assert_eq!(status, StatusCode::OK);
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v, json!({ "headers": ["a", "b"], "rows": [["1", "2"]] }));

        let (status, bytes) = call(app, Method::POST, "/api/preview", Body::from("a\tb\n1\n")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["message"], GENERIC_ERROR_MESSAGE);

        assert_eq!(src.calls(), 0);
    }

    #[tokio::test]
    async fn test_preview_rejects_raw_non_utf8_upload() {
        let (app, _) = app();
        let (status, body) = call(app.clone(), Method::GET, "/", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("body: file"));

        let raw = b"Date\tClose\n2024-03-04\t\xff\xfe\n".to_vec();
        let (status, bytes) = call(app, Method::POST, "/api/preview", Body::from(raw)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["kind"], "generic");
        assert_eq!(v["message"], GENERIC_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_preview_respects_body_limit() {
        let (app, _) = app();
        let big = "a\n".repeat(4096);
        let (status, _) = call(app, Method::POST, "/api/preview", Body::from(big)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
