use flatbed_api::value::Value;
use flatbed_config_hcl::HclParser;
use flatbed_engine::{Layout, TomlParser};

const LAYOUT: &str = r#"
records = [
  {
    name = "receipt"
    identities = [
      { type = "script", script_file = "receipt.rhai" },
    ]
    fields = [
      { name = "id", length = 8, options = { justify = "left" } },
      { name = "cents", length = 8, converter = "long", options = { justify = "right", pad-character = "0" } },
    ]
  },
]
"#;

#[test]
fn hcl_layout_loads_through_engine() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("layout.hcl"), LAYOUT).unwrap();
    std::fs::write(
        dir.path().join("receipt.rhai"),
        r#"fn matches_line(ctx, line) { line.starts_with("R") }"#,
    )
    .unwrap();

    let layout = Layout::load_with(dir.path().join("layout.hcl"), &[&TomlParser, &HclParser]).unwrap();
    let mut ctx = layout.new_context();

    let matched = layout.decode_line(&mut ctx, "R-0001  00012550").unwrap();
    assert_eq!(matched.record, "receipt");
    assert_eq!(matched.get("id"), Some(&Value::from("R-0001")));
    assert_eq!(matched.get("cents"), Some(&Value::Long(12550)));

    assert!(layout.decode_line(&mut ctx, "X-0002  00000001").unwrap_err().is_unmatched());
}

#[test]
fn toml_parser_alone_rejects_hcl_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("layout.hcl"), LAYOUT).unwrap();
    assert!(Layout::load_with(dir.path().join("layout.hcl"), &[&TomlParser]).is_err());
}
