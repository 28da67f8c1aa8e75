//! One request, end to end.
//!
//! URL inputs go fetch → archive → engine (archive framing) → parse;
//! uploaded or pasted documents go straight to the engine (single framing).
//! Either a complete report page or exactly one error page comes out.

use crate::archive::{self, FetchRecord};
use crate::engine::{Engine, EngineConfig, EngineMode, InputFraming};
#[cfg(feature = "fetch")]
use crate::fetch::HttpFetcher;
use crate::fetch::{FetchConfig, Fetcher, fetch_url};
use crate::render::{InputForm, PageTemplate, ReportConfig, ReportRenderer};
use crate::request::ExtractRequest;
use crate::result::{self, Extraction, ExtractionKind};
use crate::Result;

/// Everything an [`Extractor`] needs, for one extraction front end.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub kind: ExtractionKind,
    pub fetch: FetchConfig,
    pub engine: EngineConfig,
    pub report: ReportConfig,
    pub page: PageTemplate,
}

impl ExtractorConfig {
    pub fn new(kind: ExtractionKind) -> Self {
        Self {
            kind,
            fetch: FetchConfig::default(),
            engine: EngineConfig::default(),
            report: ReportConfig::default(),
            page: PageTemplate::for_kind(kind),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::new(ExtractionKind::Content)
    }
}

/// Runs extraction requests of one kind.
///
/// Holds only immutable configuration, so one instance can serve concurrent
/// requests.
#[derive(Debug, Clone)]
pub struct Extractor<F> {
    kind: ExtractionKind,
    fetcher: F,
    engine: Engine,
    renderer: ReportRenderer,
    page: PageTemplate,
}

/// Extractor fetching over HTTP with reqwest.
#[cfg(feature = "fetch")]
pub type HttpExtractor = Extractor<HttpFetcher>;

#[cfg(feature = "fetch")]
impl Extractor<HttpFetcher> {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Ok(Self::with_fetcher(config, fetcher))
    }
}

impl<F: Fetcher> Extractor<F> {
    pub fn with_fetcher(config: ExtractorConfig, fetcher: F) -> Self {
        Self {
            kind: config.kind,
            fetcher,
            engine: Engine::new(config.engine),
            renderer: ReportRenderer::new(config.report),
            page: config.page,
        }
    }

    pub fn kind(&self) -> ExtractionKind {
        self.kind
    }

    pub fn page(&self) -> &PageTemplate {
        &self.page
    }

    /// Fetches `url` through the scheme gate and returns the record.
    pub async fn fetch(&self, url: &str) -> Result<FetchRecord> {
        fetch_url(&self.fetcher, url).await
    }

    /// Fetches `url` and encodes the response as an archive entry.
    pub async fn fetch_archive(&self, url: &str) -> Result<Vec<u8>> {
        let record = self.fetch(url).await?;
        let archive = archive::encode(&record);
        tracing::debug!(url = %record.url, archive_bytes = archive.len(), "encoded archive");
        Ok(archive)
    }

    /// Extracts from the document at `url`.
    pub async fn extract_url(&self, url: &str) -> Result<Extraction> {
        let archive = self.fetch_archive(url).await?;
        self.run_engine(InputFraming::Archive, archive).await
    }

    /// Extracts from a bare HTML document.
    pub async fn extract_document(&self, document: Vec<u8>) -> Result<Extraction> {
        self.run_engine(InputFraming::Single, document).await
    }

    async fn run_engine(&self, framing: InputFraming, input: Vec<u8>) -> Result<Extraction> {
        let mode = EngineMode::new(self.kind, framing);
        let output = self.engine.invoke(mode, input).await?;
        let extraction = result::parse(&output, self.kind)?;
        tracing::debug!(%mode, rows = extraction.row_count(), "parsed engine output");
        Ok(extraction)
    }

    /// Runs the extraction a request asks for; `None` for form requests.
    pub async fn extract(&self, request: ExtractRequest) -> Option<Result<Extraction>> {
        match request {
            ExtractRequest::Url(url) => Some(self.extract_url(&url).await),
            ExtractRequest::File(document) | ExtractRequest::Html(document) => {
                Some(self.extract_document(document).await)
            }
            ExtractRequest::Form(_) => None,
        }
    }

    /// Renders the report table for a parsed result.
    pub fn render(&self, extraction: &Extraction) -> String {
        self.renderer.render(extraction)
    }

    /// Renders the full page for a parsed result.
    pub fn result_page(&self, form: InputForm, extraction: &Extraction) -> String {
        self.page.result_page(form, &self.render(extraction))
    }

    /// Handles one request and returns the complete response document.
    pub async fn respond(&self, request: ExtractRequest) -> String {
        let form = request.input_form();
        let target = match &request {
            ExtractRequest::Url(url) => url.clone(),
            ExtractRequest::File(_) => "uploaded file".to_string(),
            ExtractRequest::Html(_) => "pasted html".to_string(),
            ExtractRequest::Form(_) => return self.page.form_page(form),
        };

        match self.extract(request).await {
            Some(Ok(extraction)) => {
                tracing::info!(kind = %self.kind, target = %target, rows = extraction.row_count(), "extraction succeeded");
                self.result_page(form, &extraction)
            }
            Some(Err(err)) => {
                tracing::warn!(kind = %self.kind, target = %target, error_kind = ?err.kind(), error = %err, "extraction failed");
                self.page.error_page(form, &err.user_message())
            }
            None => self.page.form_page(form),
        }
    }
}
