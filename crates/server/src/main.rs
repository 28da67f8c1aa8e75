//! HTTP front end: content extraction at `/`, text extraction at `/text`.
//!
//! Both routes answer `GET` (form selection and URL submission from the query
//! string) and `POST` (multipart uploads and pasted HTML). Every response is a
//! complete HTML page.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use clap::Parser;
use tagratio_core::{ExtractRequest, ExtractionKind, ExtractorConfig, HttpExtractor};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Largest accepted request body (uploaded or pasted documents).
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "tagratio-server")]
#[command(version)]
#[command(about = "Serve tag-ratio content and text extraction over HTTP", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "TAGRATIO_ADDR", default_value = "127.0.0.1:8000")]
    addr: SocketAddr,

    /// Content extractor program
    #[arg(long, env = "TAGRATIO_CONTENT_ENGINE", value_name = "PROGRAM")]
    content_engine: Option<String>,

    /// Text extractor program
    #[arg(long, env = "TAGRATIO_TEXT_ENGINE", value_name = "PROGRAM")]
    text_engine: Option<String>,

    /// Engine timeout in seconds
    #[arg(long, env = "TAGRATIO_ENGINE_TIMEOUT", default_value = "60", value_name = "SECS")]
    engine_timeout: u64,

    /// HTTP fetch timeout in seconds
    #[arg(long, env = "TAGRATIO_FETCH_TIMEOUT", default_value = "30", value_name = "SECS")]
    fetch_timeout: u64,
}

impl Args {
    fn extractor_config(&self, kind: ExtractionKind) -> ExtractorConfig {
        let mut config = ExtractorConfig::new(kind);
        config.fetch.timeout = self.fetch_timeout;
        config.engine.timeout = self.engine_timeout;
        if let Some(program) = &self.content_engine {
            config.engine.content.program = program.clone();
        }
        if let Some(program) = &self.text_engine {
            config.engine.text.program = program.clone();
        }
        config
    }

    /// Upper bound for one request: a full fetch plus a full engine run.
    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout + self.engine_timeout + 5)
    }
}

/// Immutable per-process state shared by all requests.
struct AppState {
    content: HttpExtractor,
    text: HttpExtractor,
}

impl AppState {
    fn new(args: &Args) -> tagratio_core::Result<Self> {
        Ok(Self {
            content: HttpExtractor::new(args.extractor_config(ExtractionKind::Content))?,
            text: HttpExtractor::new(args.extractor_config(ExtractionKind::Text))?,
        })
    }

    fn extractor(&self, kind: ExtractionKind) -> &HttpExtractor {
        match kind {
            ExtractionKind::Content => &self.content,
            ExtractionKind::Text => &self.text,
        }
    }
}

fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(content_query).post(content_upload))
        .route("/text", get(text_query).post(text_upload))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

async fn respond(state: &AppState, kind: ExtractionKind, request: ExtractRequest) -> Html<String> {
    Html(state.extractor(kind).respond(request).await)
}

async fn fields_from_multipart(mut multipart: Multipart) -> Result<Vec<(String, Vec<u8>)>, (StatusCode, String)> {
    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid form data: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read form field {name}: {e}")))?;
        fields.push((name, value.to_vec()));
    }
    Ok(fields)
}

async fn content_query(
    State(state): State<Arc<AppState>>, Query(fields): Query<Vec<(String, String)>>,
) -> Html<String> {
    respond(&state, ExtractionKind::Content, ExtractRequest::from_fields(fields)).await
}

async fn content_upload(
    State(state): State<Arc<AppState>>, multipart: Multipart,
) -> Result<Html<String>, (StatusCode, String)> {
    let fields = fields_from_multipart(multipart).await?;
    Ok(respond(&state, ExtractionKind::Content, ExtractRequest::from_fields(fields)).await)
}

async fn text_query(State(state): State<Arc<AppState>>, Query(fields): Query<Vec<(String, String)>>) -> Html<String> {
    respond(&state, ExtractionKind::Text, ExtractRequest::from_fields(fields)).await
}

async fn text_upload(
    State(state): State<Arc<AppState>>, multipart: Multipart,
) -> Result<Html<String>, (StatusCode, String)> {
    let fields = fields_from_multipart(multipart).await?;
    Ok(respond(&state, ExtractionKind::Text, ExtractRequest::from_fields(fields)).await)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let state = Arc::new(AppState::new(&args).context("Failed to build extractors")?);
    let app = router(state, args.request_timeout());

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.addr))?;
    tracing::info!(addr = %args.addr, "tagratio server listening");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tagratio_core::EngineCommand;
    use tower::ServiceExt;

    const BOUNDARY: &str = "tagratio-test-boundary";

    /// Router whose engines both run `script` under `sh -c`.
    fn app(script: &str) -> Router {
        let args = Args::parse_from(["tagratio-server", "--engine-timeout", "10"]);
        let command = EngineCommand::new("sh", vec!["-c", script], vec!["-c", script]);
        let extractor = |kind| {
            let mut config = args.extractor_config(kind);
            config.engine.content = command.clone();
            config.engine.text = command.clone();
            HttpExtractor::new(config).unwrap()
        };
        let state = AppState { content: extractor(ExtractionKind::Content), text: extractor(ExtractionKind::Text) };
        router(Arc::new(state), args.request_timeout())
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn multipart(fields: &[(&str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::post("/text")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_shows_url_form() {
        let response = app("cat").oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("<title>HTML Text Extraction (CETR)</title>"));
        assert!(page.contains("<li class=\"on\"><a href=\"?form=url\">"));
        assert!(page.contains("name=\"url\""));
    }

    #[tokio::test]
    async fn test_form_selector() {
        let response = app("cat").oneshot(Request::get("/text?form=html").body(Body::empty()).unwrap()).await.unwrap();
        let page = body_text(response).await;
        assert!(page.contains("<title>HTML Text Extraction</title>"));
        assert!(page.contains("<textarea id=\"html\""));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let response = app("cat")
            .oneshot(Request::get("/?url=file%3A%2F%2F%2Fetc%2Fpasswd").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let page = body_text(response).await;
        assert!(page.contains("The URL scheme &quot;file&quot; is not supported."));
        assert!(!page.contains("<table"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pasted_html_text_extraction() {
        let response = app("cat").oneshot(multipart(&[("html", "first <b>line</b>\n\nsecond")])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("<table id=\"text\">"));
        assert!(page.contains("     <th>1</th>\n     <td>first &lt;b&gt;line&lt;/b&gt;</td>\n"));
        assert!(page.contains("     <th>2</th>\n     <td>second</td>\n"));
        assert!(page.contains("<li class=\"on\"><a href=\"?form=html\">"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_engine_failure_single_message() {
        let response = app("cat >/dev/null; exit 1").oneshot(multipart(&[("file", "<p>x</p>")])).await.unwrap();
        let page = body_text(response).await;
        assert_eq!(page.matches("Failed to analyze the HTML (text-single).").count(), 1);
        assert!(!page.contains("<table"));
    }
}
