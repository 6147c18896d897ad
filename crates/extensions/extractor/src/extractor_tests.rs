use super::*;
use async_trait::async_trait;
use std::sync::Mutex;
use serde_json::json;
use tempfile::TempDir;
use webpilot_protocols::OcrText;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"
<html><body>
  <p class="lead">Hello   <b>world</b></p>
  <table><tr><th>Item</th><th>Price</th></tr><tr><td>Tea</td><td>3</td></tr></table>
  <ol><li>first</li><li>second</li></ol>
  <img src="/img/cat.png" alt="cat">
</body></html>
"#;

fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn extractor() -> DataExtractor {
    DataExtractor::new().unwrap()
}

struct FixedOcr {
    result: Result<String, &'static str>,
    seen: Mutex<Vec<(Option<ScreenRegion>, String)>>,
}

#[async_trait]
impl OcrEngine for FixedOcr {
    async fn recognize(
        &self,
        region: Option<ScreenRegion>,
        lang: &str,
    ) -> Result<OcrText, DriverError> {
        self.seen.lock().unwrap().push((region, lang.to_string()));
        match &self.result {
            Ok(text) => Ok(OcrText {
                text: text.clone(),
                region,
            }),
            Err(msg) => Err(DriverError::Unavailable(msg.to_string())),
        }
    }
}

#[test]
fn test_kind_parsing() {
    assert_eq!("TABLE".parse::<ExtractionKind>().unwrap(), ExtractionKind::Table);
    let err = "video".parse::<ExtractionKind>().unwrap_err();
    assert_eq!(err.to_string(), "Unknown extraction type: video");
}

#[test]
fn test_format_parsing() {
    assert_eq!("Csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
    assert!("xml".parse::<OutputFormat>().is_err());
}

#[tokio::test]
async fn test_unknown_type() {
    let err = extractor()
        .extract("video", &params(json!({"html": PAGE})))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown extraction type: video");
}

#[tokio::test]
async fn test_text_from_inline_html() {
    let output = extractor()
        .extract("text", &params(json!({"html": PAGE, "selector": "p.lead"})))
        .await
        .unwrap();
    assert_eq!(output.extraction_type, ExtractionKind::Text);
    assert_eq!(output.data, json!("Hello world"));

    let outcome = output.to_outcome();
    assert!(outcome.success);
    assert_eq!(outcome.message, "Extracted text");
    assert_eq!(outcome.get("data"), Some(&json!("Hello world")));
    assert!(outcome.get("format").is_none());
}

#[tokio::test]
async fn test_table_json_and_csv() {
    let ex = extractor();
    let output = ex
        .extract("table", &params(json!({"html": PAGE})))
        .await
        .unwrap();
    assert_eq!(output.data, json!([{"Item": "Tea", "Price": "3"}]));
    assert_eq!(output.format, Some(OutputFormat::Json));

    let output = ex
        .extract("table", &params(json!({"html": PAGE, "format": "csv"})))
        .await
        .unwrap();
    assert_eq!(output.data, json!("Item,Price\r\nTea,3\r\n"));
    assert_eq!(output.to_outcome().get("format"), Some(&json!("csv")));
}

#[tokio::test]
async fn test_output_path_saves_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out").join("table.csv");
    let output = extractor()
        .extract(
            "table",
            &params(json!({
                "html": PAGE,
                "output_path": path.to_string_lossy(),
                "output_format": "csv",
            })),
        )
        .await
        .unwrap();

    let saved = output.saved.as_ref().unwrap();
    assert_eq!(saved.format, "csv");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Item,Price\r\nTea,3\r\n");
    assert_eq!(
        output.to_outcome().get("file_path"),
        Some(&json!(path.display().to_string()))
    );
}

#[tokio::test]
async fn test_output_path_csv_keeps_header_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prices.csv");
    let html = "<table><tr><th>Price</th><th>Item</th></tr><tr><td>3</td><td>Tea</td></tr></table>";
    let output = extractor()
        .extract(
            "table",
            &params(json!({
                "html": html,
                "output_path": path.to_string_lossy(),
                "output_format": "csv",
            })),
        )
        .await
        .unwrap();

    assert_eq!(output.columns, vec!["Price", "Item"]);
    assert_eq!(output.data[0]["Item"], "Tea");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Price,Item\r\n3,Tea\r\n");
}

#[tokio::test]
async fn test_output_path_bad_format() {
    let dir = TempDir::new().unwrap();
    let err = extractor()
        .extract(
            "text",
            &params(json!({
                "html": PAGE,
                "output_path": dir.path().join("x.bin").to_string_lossy(),
                "output_format": "bin",
            })),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Unsupported format: bin");
}

#[tokio::test]
async fn test_unsupported_table_format() {
    let err = extractor()
        .extract("table", &params(json!({"html": PAGE, "format": "xml"})))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Unsupported format: xml");
}

#[tokio::test]
async fn test_list_default_selector() {
    let output = extractor()
        .extract("list", &params(json!({"html": PAGE})))
        .await
        .unwrap();
    assert_eq!(output.data, json!(["first", "second"]));
}

#[tokio::test]
async fn test_html_attribute() {
    let output = extractor()
        .extract(
            "html",
            &params(json!({"html": PAGE, "selector": "img", "attribute": "alt"})),
        )
        .await
        .unwrap();
    assert_eq!(output.data, json!(["cat"]));
    assert_eq!(output.message, "Extracted data using selector: img");
}

#[tokio::test]
async fn test_page_html_fallback_and_no_source() {
    let ex = extractor();
    let output = ex
        .extract_with_page("text", &params(json!({"selector": "li"})), Some(PAGE))
        .await
        .unwrap();
    assert_eq!(output.data, json!("first\nsecond"));

    let err = ex.extract("text", &Map::new()).await.unwrap_err();
    assert!(matches!(err, ExtractError::NoSource));
}

#[tokio::test]
async fn test_inline_html_wins_over_page() {
    let output = extractor()
        .extract_with_page(
            "text",
            &params(json!({"html": "<p>inline</p>", "selector": "p"})),
            Some(PAGE),
        )
        .await
        .unwrap();
    assert_eq!(output.data, json!("inline"));
}

#[tokio::test]
async fn test_fetches_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let output = extractor()
        .extract(
            "text",
            &params(json!({"url": format!("{}/page", server.uri()), "selector": "th"})),
        )
        .await
        .unwrap();
    assert_eq!(output.data, json!("Item\nPrice"));
}

#[tokio::test]
async fn test_url_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = extractor()
        .extract("text", &params(json!({"url": format!("{}/gone", server.uri())})))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::Http(_)));
}

#[tokio::test]
async fn test_image_resolves_and_saves() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/cat.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let save = dir.path().join("images/cat.png");
    let output = extractor()
        .extract(
            "image",
            &params(json!({
                "url": format!("{}/page", server.uri()),
                "save_path": save.to_str().unwrap(),
            })),
        )
        .await
        .unwrap();

    assert_eq!(output.message, "Extracted image");
    assert_eq!(output.data["url"], json!(format!("{}/img/cat.png", server.uri())));
    assert_eq!(output.data["content_type"], json!("image/png"));
    assert_eq!(output.data["size"], json!(4));
    assert_eq!(std::fs::read(&save).unwrap(), vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_relative_image_without_base() {
    let err = extractor()
        .extract("image", &params(json!({"html": PAGE})))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("/img/cat.png"));
}

#[tokio::test]
async fn test_ocr_without_engine() {
    let err = extractor().extract("ocr", &Map::new()).await.unwrap_err();
    assert!(matches!(err, ExtractError::OcrUnavailable(_)));
}

#[tokio::test]
async fn test_ocr_with_engine() {
    let engine = Arc::new(FixedOcr {
        result: Ok("Total: 42".to_string()),
        seen: Default::default(),
    });
    let ex = extractor().with_ocr(engine.clone());
    assert!(ex.has_ocr());

    let output = ex
        .extract(
            "ocr",
            &params(json!({"region": [0, 0, 100, 50], "lang": "deu"})),
        )
        .await
        .unwrap();
    assert_eq!(output.data, json!("Total: 42"));
    assert_eq!(output.message, "Extracted text using OCR");

    let seen = engine.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.map(|r| r.width), Some(100));
    assert_eq!(seen[0].1, "deu");
}

#[tokio::test]
async fn test_ocr_engine_unavailable() {
    let engine = Arc::new(FixedOcr {
        result: Err("no display"),
        seen: Default::default(),
    });
    let err = extractor()
        .with_ocr(engine)
        .extract("ocr", &Map::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "OCR is not available: no display");
}
