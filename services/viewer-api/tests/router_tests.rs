//! End-to-end tests of the viewer router against a fake rendering engine.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use map_common::Extent;
use mapfile::MapDocument;
use ows_protocol::{RenderRequest, RequestKind};
use tempfile::TempDir;
use test_utils::fixtures::{INCLUDED_LAYERS, INCLUDING_MAPFILE, SIMPLE_MAPFILE};
use test_utils::{static_asset_tree, temp_test_dir, write_fixture};
use tower::ServiceExt;

use viewer_api::config::ViewerSettings;
use viewer_api::engine::{EngineError, MapEngine};
use viewer_api::routing::router;
use viewer_api::state::AppState;

const RENDERED: &[u8] = b"\x89PNG rendered";

/// What the engine was asked to render.
#[derive(Debug, Clone)]
struct RenderCall {
    mapfile_text: String,
    params: Vec<(String, String)>,
    kind: RequestKind,
}

#[derive(Default)]
struct FakeEngine {
    calls: Mutex<Vec<RenderCall>>,
    failure: Option<String>,
}

impl FakeEngine {
    fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MapEngine for FakeEngine {
    async fn render(
        &self,
        document: &MapDocument,
        request: &RenderRequest,
        kind: RequestKind,
    ) -> Result<Bytes, EngineError> {
        self.calls.lock().unwrap().push(RenderCall {
            mapfile_text: document.to_mapfile_string(),
            params: request.params().to_vec(),
            kind,
        });
        match (&self.failure, document.path()) {
            (Some(message), Some(path)) => Err(EngineError::Failed(format!(
                "{} {}",
                message,
                path.display()
            ))),
            (Some(message), None) => Err(EngineError::Failed(message.clone())),
            (None, _) => Ok(Bytes::from_static(RENDERED)),
        }
    }
}

struct Fixture {
    _dir: TempDir,
    mapfile: PathBuf,
    engine: Arc<FakeEngine>,
    app: Router,
}

fn fixture_with(engine: FakeEngine, configure: impl FnOnce(&mut ViewerSettings)) -> Fixture {
    let dir = temp_test_dir();
    let mapfile = write_fixture(dir.path(), "map/demo.map", SIMPLE_MAPFILE);
    let static_dir = static_asset_tree(dir.path());
    write_fixture(dir.path(), "outside.css", "body { color: red; }");

    let mut settings = ViewerSettings::new(&mapfile);
    settings.static_dir = static_dir;
    configure(&mut settings);

    let engine = Arc::new(engine);
    let state = AppState::new(settings, engine.clone()).unwrap();
    Fixture {
        _dir: dir,
        mapfile,
        engine,
        app: router(Arc::new(state)),
    }
}

fn fixture() -> Fixture {
    fixture_with(FakeEngine::default(), |_| {})
}

fn encoded(path: &Path) -> String {
    url::form_urlencoded::byte_serialize(path.to_string_lossy().as_bytes()).collect()
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, Bytes) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body)
}

// ============================================================================
// Viewer page
// ============================================================================

#[tokio::test]
async fn test_viewer_page() {
    let fixture = fixture();
    let (status, content_type, body) = get(&fixture.app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));

    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("\"layers\":[\"roads\",\"water\"]"));
    assert!(html.contains("\"units\":\"m\""));
    assert!(html.contains("\"center\":[5.0,5.0]"));
    assert!(html.contains(&format!(
        "http://127.0.0.1:9991/ows/?map={}",
        encoded(&fixture.mapfile)
    )));
}

#[tokio::test]
async fn test_viewer_page_overrides() {
    let fixture = fixture_with(FakeEngine::default(), |settings| {
        settings.layer_override = Some(vec!["water".to_string()]);
        settings.extent_override = Some(Extent::new(0.0, 0.0, 20.0, 40.0).unwrap());
        settings.port = 8000;
    });
    let (status, _, body) = get(&fixture.app, "/").await;
    let html = String::from_utf8(body.to_vec()).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("\"layers\":[\"water\"]"));
    assert!(html.contains("\"center\":[10.0,20.0]"));
    assert!(html.contains("http://127.0.0.1:8000/ows/"));
}

#[tokio::test]
async fn test_viewer_page_lists_included_layers() {
    let fixture = fixture_with(FakeEngine::default(), |settings| {
        let dir = settings.mapfile.parent().unwrap().to_path_buf();
        settings.mapfile = write_fixture(&dir, "split.map", INCLUDING_MAPFILE);
        write_fixture(&dir, "layers.inc", INCLUDED_LAYERS);
    });
    let (status, _, body) = get(&fixture.app, "/").await;
    let html = String::from_utf8(body.to_vec()).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("\"layers\":[\"parcels\",\"labels\"]"));
}

#[tokio::test]
async fn test_viewer_page_unreadable_mapfile() {
    let fixture = fixture_with(FakeEngine::default(), |settings| {
        settings.mapfile = settings.mapfile.with_file_name("missing.map");
    });
    let (status, content_type, body) = get(&fixture.app, "/").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type.unwrap().starts_with("text/plain"));
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains("missing.map"));
}

// ============================================================================
// Static assets
// ============================================================================

#[tokio::test]
async fn test_static_css() {
    let fixture = fixture();
    let (status, content_type, body) = get(&fixture.app, "/static/theme/default/style.css").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/css"));
    assert_eq!(&body[..], b"body { margin: 0; }\n");
}

#[tokio::test]
async fn test_static_png_and_js() {
    let fixture = fixture();

    let (status, content_type, _) = get(&fixture.app, "/static/white.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));

    let (status, content_type, _) = get(&fixture.app, "/static/viewer.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/javascript"));
}

#[tokio::test]
async fn test_static_rejections() {
    let fixture = fixture();

    for uri in [
        "/static/../outside.css",
        "/static/theme/../../outside.css",
        "/static/../map/demo.map",
        "/static/notes.txt",
        "/static/missing.css",
        "/static/",
    ] {
        let (status, content_type, _) = get(&fixture.app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert!(content_type.unwrap().starts_with("text/plain"));
    }
}

// ============================================================================
// Render proxy
// ============================================================================

#[tokio::test]
async fn test_get_map_is_forwarded() {
    let fixture = fixture();
    let uri = format!(
        "/ows/?MAP={}&SERVICE=WMS&REQUEST=GetMap&FORMAT=image/png&LAYERS=roads&BBOX=0,0,10,10",
        encoded(&fixture.mapfile)
    );
    let (status, content_type, body) = get(&fixture.app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(&body[..], RENDERED);

    let calls = fixture.engine.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].kind, RequestKind::GetMap);
    assert_eq!(calls[0].params.len(), 6);
    assert!(calls[0]
        .params
        .contains(&("LAYERS".to_string(), "roads".to_string())));
    // No overrides configured: the mapfile goes through unchanged
    assert_eq!(calls[0].mapfile_text, SIMPLE_MAPFILE);
}

#[tokio::test]
async fn test_lowercase_map_key_and_request() {
    let fixture = fixture();
    let uri = format!(
        "/ows/?map={}&request=getmap&format=image/jpeg",
        encoded(&fixture.mapfile)
    );
    let (status, content_type, _) = get(&fixture.app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/jpeg"));
}

#[tokio::test]
async fn test_legend_format_fallback() {
    let fixture = fixture();
    let uri = format!(
        "/ows/?MAP={}&REQUEST=GetLegendGraphic&LAYERS=roads",
        encoded(&fixture.mapfile)
    );
    let (status, content_type, _) = get(&fixture.app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(fixture.engine.calls()[0].kind, RequestKind::GetLegendGraphic);
}

#[tokio::test]
async fn test_get_map_requires_format() {
    let fixture = fixture();
    let uri = format!("/ows/?MAP={}&REQUEST=GetMap", encoded(&fixture.mapfile));
    let (status, content_type, body) = get(&fixture.app, &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert!(String::from_utf8_lossy(&body).contains("FORMAT"));
    assert!(fixture.engine.calls().is_empty());
}

#[tokio::test]
async fn test_unsupported_and_missing_parameters() {
    let fixture = fixture();
    let map = encoded(&fixture.mapfile);

    for uri in [
        format!("/ows/?MAP={}&REQUEST=GetCapabilities", map),
        format!("/ows/?MAP={}&FORMAT=image/png", map),
        "/ows/?REQUEST=GetMap&FORMAT=image/png".to_string(),
    ] {
        let (status, content_type, _) = get(&fixture.app, &uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert!(content_type.unwrap().starts_with("text/plain"));
    }
    assert!(fixture.engine.calls().is_empty());
}

#[tokio::test]
async fn test_short_map_value_keeps_error_text() {
    let fixture = fixture();
    let (status, _, body) = get(&fixture.app, "/ows/?MAP=or&REQUEST=GetMap").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("Resource error: "), "{}", text);
    assert!(text.contains("FORMAT"));
    assert!(!text.contains("<path>"));
}

#[tokio::test]
async fn test_load_failure_hides_path() {
    let fixture = fixture();
    let missing = fixture.mapfile.with_file_name("private-missing.map");
    let uri = format!(
        "/ows/?MAP={}&REQUEST=GetMap&FORMAT=image/png",
        encoded(&missing)
    );
    let (status, content_type, body) = get(&fixture.app, &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type.unwrap().starts_with("text/plain"));
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.is_empty());
    assert!(!text.contains("private-missing"));
}

#[tokio::test]
async fn test_overrides_reach_engine() {
    let fixture = fixture_with(FakeEngine::default(), |settings| {
        settings.extent_override = Some(Extent::new(100.0, 200.0, 300.0, 400.0).unwrap());
        settings.connection_override = Some("host=override".to_string());
    });
    let uri = format!(
        "/ows/?MAP={}&REQUEST=GetMap&FORMAT=image/png",
        encoded(&fixture.mapfile)
    );
    let (status, _, _) = get(&fixture.app, &uri).await;
    assert_eq!(status, StatusCode::OK);

    let text = &fixture.engine.calls()[0].mapfile_text;
    let document = MapDocument::parse(text.as_str()).unwrap();
    let description = document.description();
    assert_eq!(description.declared_extent, Some([100.0, 200.0, 300.0, 400.0]));
    for layer in &description.layers {
        assert_eq!(layer.connection.as_deref(), Some("host=override"));
    }
}

#[tokio::test]
async fn test_engine_error_redacts_mapfile_path() {
    let fixture = fixture_with(FakeEngine::failing("msLoadMap(): cannot open"), |_| {});
    let uri = format!(
        "/ows/?MAP={}&REQUEST=GetMap&FORMAT=image/png",
        encoded(&fixture.mapfile)
    );
    let (status, content_type, body) = get(&fixture.app, &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type.unwrap().starts_with("text/plain"));
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text, "msLoadMap(): cannot open <path>");
}

#[tokio::test]
async fn test_post_form_body() {
    let fixture = fixture();
    let body = format!(
        "MAP={}&REQUEST=GetMap&FORMAT=image/png",
        encoded(&fixture.mapfile)
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/ows/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let (status, content_type, _) = send(&fixture.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
}

// ============================================================================
// Unknown paths
// ============================================================================

#[tokio::test]
async fn test_unknown_path() {
    let fixture = fixture();
    let (status, content_type, body) = get(&fixture.app, "/anything-else").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert_eq!(&body[..], b"ERROR");
}
