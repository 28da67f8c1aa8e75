pub mod archive;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod render;
pub mod request;
pub mod result;

pub use archive::{ArchiveError, ArchiveReader, FetchRecord};
pub use engine::{Engine, EngineCommand, EngineConfig, EngineMode, InputFraming};
pub use error::{ErrorKind, ExtractError, Result};
#[cfg(feature = "fetch")]
pub use fetch::HttpFetcher;
pub use fetch::{FetchConfig, Fetcher, check_scheme, fetch_file, fetch_stdin, fetch_url};
#[cfg(feature = "fetch")]
pub use pipeline::HttpExtractor;
pub use pipeline::{Extractor, ExtractorConfig};
pub use render::{InputForm, JsonConfig, PageTemplate, ReportConfig, ReportRenderer, convert_to_json};
pub use request::ExtractRequest;
pub use result::{Extraction, ExtractionKind, ExtractionResult, ExtractionText, Line, Unit, UnitKind, parse};
