//! The extraction entry point.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use url::Url;
use webpilot_protocols::{ActionOutcome, DriverError, OcrEngine, ScreenRegion};

use crate::error::ExtractError;
use crate::html;
use crate::save::{SavedFile, save_columns};

const DEFAULT_LANG: &str = "eng";

/// What to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionKind {
    Html,
    Text,
    Table,
    List,
    Image,
    Ocr,
}

impl ExtractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::Table => "table",
            Self::List => "list",
            Self::Image => "image",
            Self::Ocr => "ocr",
        }
    }

    fn default_selector(&self) -> &'static str {
        match self {
            Self::Html | Self::Text => "body",
            Self::Table => "table",
            Self::List => "ul, ol",
            Self::Image => "img",
            Self::Ocr => "",
        }
    }
}

impl FromStr for ExtractionKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "text" => Ok(Self::Text),
            "table" => Ok(Self::Table),
            "list" => Ok(Self::List),
            "image" => Ok(Self::Image),
            "ocr" => Ok(Self::Ocr),
            _ => Err(ExtractError::UnknownType(s.to_string())),
        }
    }
}

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format for tables and lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(ExtractError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// What an extraction produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutput {
    pub extraction_type: ExtractionKind,
    pub data: Value,
    pub format: Option<OutputFormat>,
    pub message: String,
    /// Set when `output_path` asked for the data to be written out.
    pub saved: Option<SavedFile>,
    /// Column order of table records, empty when not tabular.
    pub columns: Vec<String>,
}

impl ExtractionOutput {
    /// As an action outcome: `{success, message, data[, format][, file_path]}`.
    pub fn to_outcome(&self) -> ActionOutcome {
        let mut outcome = ActionOutcome::ok(self.message.clone()).with("data", self.data.clone());
        if let Some(format) = self.format {
            outcome = outcome.with("format", format.as_str());
        }
        if let Some(saved) = &self.saved {
            outcome = outcome.with("file_path", saved.path.display().to_string());
        }
        outcome
    }
}

fn param_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Extracts data from HTML sources and the screen.
#[derive(Clone)]
pub struct DataExtractor {
    client: Client,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl DataExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("webpilot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client, ocr: None }
    }

    /// Engine used for `ocr` extraction.
    pub fn with_ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract `kind` using only the sources named in `params`.
    pub async fn extract(
        &self,
        kind: &str,
        params: &Map<String, Value>,
    ) -> Result<ExtractionOutput, ExtractError> {
        self.extract_with_page(kind, params, None).await
    }

    /// Extract `kind`, falling back to `page_html` when `params` carries
    /// neither `html` nor `url`. With `output_path` the data is also written
    /// out via [`save_columns`] in `output_format` (default `json`).
    pub async fn extract_with_page(
        &self,
        kind: &str,
        params: &Map<String, Value>,
        page_html: Option<&str>,
    ) -> Result<ExtractionOutput, ExtractError> {
        let mut output = self.extract_kind(kind, params, page_html).await?;
        if let Some(path) = param_str(params, "output_path") {
            let format = param_str(params, "output_format").unwrap_or("json");
            output.saved = Some(save_columns(&output.data, &output.columns, path, format).await?);
        }
        Ok(output)
    }

    async fn extract_kind(
        &self,
        kind: &str,
        params: &Map<String, Value>,
        page_html: Option<&str>,
    ) -> Result<ExtractionOutput, ExtractError> {
        let kind: ExtractionKind = kind.parse()?;
        debug!("Extracting {} with params {:?}", kind, params);

        if kind == ExtractionKind::Ocr {
            return self.extract_ocr(params).await;
        }

        let selector = param_str(params, "selector").unwrap_or(kind.default_selector());
        let format = match param_str(params, "format") {
            Some(f) => f.parse()?,
            None => OutputFormat::Json,
        };
        let source = self.html_source(params, page_html).await?;

        let output = match kind {
            ExtractionKind::Html => {
                let attribute = param_str(params, "attribute");
                let matches = html::select_html(&source, selector, attribute)?;
                ExtractionOutput {
                    extraction_type: kind,
                    data: json!(matches),
                    format: None,
                    message: format!("Extracted data using selector: {}", selector),
                    saved: None,
                    columns: Vec::new(),
                }
            }
            ExtractionKind::Text => ExtractionOutput {
                extraction_type: kind,
                data: Value::String(html::select_text(&source, selector)?),
                format: None,
                message: "Extracted text".to_string(),
                saved: None,
                columns: Vec::new(),
            },
            ExtractionKind::Table => {
                let table = html::select_table(&source, selector)?;
                let data = match format {
                    OutputFormat::Json => table.to_json(),
                    OutputFormat::Csv => Value::String(table.to_csv()),
                };
                ExtractionOutput {
                    extraction_type: kind,
                    data,
                    format: Some(format),
                    message: "Extracted table data".to_string(),
                    saved: None,
                    columns: table.columns(),
                }
            }
            ExtractionKind::List => {
                let items = html::select_list(&source, selector)?;
                let data = match format {
                    OutputFormat::Json => json!(items),
                    OutputFormat::Csv => {
                        let rows: Vec<Vec<String>> =
                            items.into_iter().map(|item| vec![item]).collect();
                        Value::String(crate::csv::to_csv::<String>(None, &rows))
                    }
                };
                ExtractionOutput {
                    extraction_type: kind,
                    data,
                    format: Some(format),
                    message: "Extracted list data".to_string(),
                    saved: None,
                    columns: Vec::new(),
                }
            }
            ExtractionKind::Image => {
                let src = html::select_image_src(&source, selector)?;
                self.fetch_image(&src, params).await?
            }
            ExtractionKind::Ocr => self.extract_ocr(params).await?,
        };

        info!("{}", output.message);
        Ok(output)
    }

    async fn html_source(
        &self,
        params: &Map<String, Value>,
        page_html: Option<&str>,
    ) -> Result<String, ExtractError> {
        if let Some(inline) = param_str(params, "html") {
            return Ok(inline.to_string());
        }
        if let Some(url) = param_str(params, "url") {
            return self.fetch_text(url).await;
        }
        page_html.map(str::to_string).ok_or(ExtractError::NoSource)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ExtractError> {
        let url = Url::parse(url).map_err(|e| ExtractError::Http(format!("Invalid URL {}: {}", url, e)))?;
        debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    fn resolve_image_url(src: &str, params: &Map<String, Value>) -> Result<Url, ExtractError> {
        if let Ok(absolute) = Url::parse(src) {
            return Ok(absolute);
        }
        let base = param_str(params, "base_url")
            .or_else(|| param_str(params, "url"))
            .ok_or_else(|| {
                ExtractError::Http(format!("Cannot resolve relative image URL: {}", src))
            })?;
        Url::parse(base)
            .and_then(|base| base.join(src))
            .map_err(|e| ExtractError::Http(format!("Cannot resolve image URL {}: {}", src, e)))
    }

    async fn fetch_image(
        &self,
        src: &str,
        params: &Map<String, Value>,
    ) -> Result<ExtractionOutput, ExtractError> {
        let url = Self::resolve_image_url(src, params)?;
        debug!("Fetching image {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        let save_path = param_str(params, "save_path");
        if let Some(path) = save_path {
            let path = std::path::Path::new(path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            tokio::fs::write(path, &bytes).await?;
        }

        Ok(ExtractionOutput {
            extraction_type: ExtractionKind::Image,
            data: json!({
                "url": url.as_str(),
                "content_type": content_type,
                "size": bytes.len(),
                "save_path": save_path,
            }),
            format: None,
            message: "Extracted image".to_string(),
            saved: None,
            columns: Vec::new(),
        })
    }

    async fn extract_ocr(&self, params: &Map<String, Value>) -> Result<ExtractionOutput, ExtractError> {
        let engine = self.ocr.as_ref().ok_or_else(|| {
            ExtractError::OcrUnavailable("no OCR engine is configured".to_string())
        })?;
        let region = params.get("region").and_then(ScreenRegion::from_value);
        let lang = param_str(params, "lang").unwrap_or(DEFAULT_LANG);

        let recognized = engine.recognize(region, lang).await.map_err(|e| match e {
            DriverError::Unavailable(msg) => ExtractError::OcrUnavailable(msg),
            other => ExtractError::Ocr(other.to_string()),
        })?;

        Ok(ExtractionOutput {
            extraction_type: ExtractionKind::Ocr,
            data: Value::String(recognized.text),
            format: None,
            message: "Extracted text using OCR".to_string(),
            saved: None,
            columns: Vec::new(),
        })
    }
}

impl fmt::Debug for DataExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataExtractor")
            .field("ocr", &self.ocr.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
