//! Fetcher engine: the concurrent fetch-extract-aggregate pipeline.
mod batch;
mod convert;
mod decode;
mod extract;
mod fetch;
mod request;
mod runner;
mod types;

pub use batch::{BatchError, BatchRunner};
pub use convert::{Converter, Html2MdConverter};
pub use decode::{declared_charset, decode_html, DecodedHtml};
pub use extract::{
    extractor_for, EncyclopediaMarkdownExtractor, ExtractError, Extractor,
    GenericMarkdownExtractor, PlainTextExtractor,
};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use request::{
    FetchRequest, RequestError, RequestLimits, ValidatedRequest, MAX_TIMEOUT_SECS,
    MIN_TIMEOUT_SECS,
};
pub use types::{BatchResult, FailureKind, FetchError, FetchOutcome, FetchOutput};
