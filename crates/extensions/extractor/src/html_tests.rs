use super::*;
use serde_json::json;

const PAGE: &str = r#"
<html><body>
  <h1 class="title">  Quarterly
     Report </h1>
  <a href="/a" class="nav">First</a>
  <a href="/b" class="nav">Second</a>
  <a class="nav">No link</a>
  <table id="people">
    <thead><tr><th>Name</th><th>Age</th></tr></thead>
    <tbody>
      <tr><td>Ada</td><td>36</td></tr>
      <tr><td>Grace</td><td>85</td><td>extra</td></tr>
      <tr></tr>
    </tbody>
  </table>
  <table id="bare">
    <tr><td>x</td><td></td></tr>
    <tr><td>1</td><td>2</td></tr>
  </table>
  <ul id="todo"><li>milk</li><li> eggs  and <b>bread</b></li></ul>
  <img id="logo" src="/static/logo.png">
  <img id="broken" src="">
</body></html>
"#;

#[test]
fn test_select_html_inner() {
    let matches = select_html(PAGE, "a.nav", None).unwrap();
    assert_eq!(matches, vec!["First", "Second", "No link"]);
}

#[test]
fn test_select_html_attribute_skips_missing() {
    let matches = select_html(PAGE, "a.nav", Some("href")).unwrap();
    assert_eq!(matches, vec!["/a", "/b"]);
}

#[test]
fn test_select_html_no_match() {
    let err = select_html(PAGE, ".missing", None).unwrap_err();
    assert_eq!(err.to_string(), "Could not find element with selector: .missing");
}

#[test]
fn test_invalid_selector() {
    let err = select_text(PAGE, "a[").unwrap_err();
    assert!(matches!(err, ExtractError::InvalidSelector(_)));
}

#[test]
fn test_select_text_normalizes_whitespace() {
    assert_eq!(select_text(PAGE, "h1").unwrap(), "Quarterly Report");
    assert_eq!(select_text(PAGE, "a.nav").unwrap(), "First\nSecond\nNo link");
}

#[test]
fn test_select_table_with_thead() {
    let table = select_table(PAGE, "#people").unwrap();
    assert_eq!(table.headers, vec!["Name", "Age"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(
        table.to_json(),
        json!([
            {"Name": "Ada", "Age": "36"},
            {"Name": "Grace", "Age": "85", "column_2": "extra"}
        ])
    );
}

#[test]
fn test_select_table_first_row_is_header() {
    let table = select_table(PAGE, "#bare").unwrap();
    assert_eq!(table.headers, vec!["x", ""]);
    assert_eq!(table.to_json(), json!([{"x": "1", "column_1": "2"}]));
}

#[test]
fn test_table_to_csv() {
    let table = select_table(PAGE, "#people").unwrap();
    assert_eq!(
        table.to_csv(),
        "Name,Age,column_2\r\nAda,36\r\nGrace,85,extra\r\n"
    );
}

#[test]
fn test_select_table_missing() {
    let err = select_table(PAGE, "#nope").unwrap_err();
    assert_eq!(err.to_string(), "Could not find table with selector: #nope");
}

#[test]
fn test_select_list() {
    let items = select_list(PAGE, "ul, ol").unwrap();
    assert_eq!(items, vec!["milk", "eggs and bread"]);
    assert!(select_list(PAGE, "ol").is_err());
}

#[test]
fn test_select_image_src() {
    assert_eq!(select_image_src(PAGE, "#logo").unwrap(), "/static/logo.png");
    let err = select_image_src(PAGE, "#broken").unwrap_err();
    assert_eq!(err.to_string(), "Image does not have a src attribute");
    assert!(select_image_src(PAGE, "#none").is_err());
}
