//! Settings file loading and the path from settings to a working enricher.

use std::time::Duration;

use serde_json::json;

use huginn::{Huginn, HuginnError, OcidGrammar, Settings, StaticFetcher};

const SUBNET: &str = "ocid1.subnet.oc1.phx.aaaasubnet";

fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("huginn.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn load_reads_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
        [enrich]
        output_field = "oci"
        grammar = "strict"

        [cache]
        size = 10
        ttl_secs = 5

        [search]
        endpoint = "http://localhost:9000"
    "#,
    );

    let settings = Settings::load(Some(path.as_path())).unwrap();
    assert_eq!(settings.enrich.output_field, "oci");
    assert_eq!(settings.enrich.grammar, OcidGrammar::Strict);

    let cache = settings.cache_config().unwrap();
    assert_eq!(cache.max_entries, 10);
    assert_eq!(cache.ttl, Duration::from_secs(5));

    let search = settings.search_config().unwrap();
    assert_eq!(search.endpoint, "http://localhost:9000");
}

#[test]
fn malformed_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[enrich\noutput_field = ");

    let err = Settings::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, HuginnError::Configuration(_)));
    assert!(err.to_string().contains("Failed to parse"));
}

#[test]
fn unknown_tag_type_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
        [enrich]
        tag_types = ["freeform", "custom"]
    "#,
    );

    let settings = Settings::load(Some(path.as_path())).unwrap();
    assert!(matches!(
        settings.validate(),
        Err(HuginnError::Configuration(_))
    ));
}

#[test]
fn oversized_cache_ttl_is_rejected() {
    let mut settings = Settings::default();
    settings
        .apply_env(|name: &str| (name == "CACHE_TTL").then(|| "99999999999".to_string()))
        .unwrap();

    let err = settings.validate().unwrap_err();
    assert!(matches!(err, HuginnError::Configuration(_)));
    assert!(err.to_string().contains("cache TTL"));
}

#[test]
fn tags_file_loads_into_static_fetcher() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tags.json");
    std::fs::write(
        &path,
        json!({SUBNET: {"freeform": {"tier": "web"}}}).to_string(),
    )
    .unwrap();

    let fetcher = StaticFetcher::from_file(&path).unwrap();
    assert_eq!(fetcher.len(), 1);
}

#[test]
fn tags_file_with_non_ocid_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tags.json");
    std::fs::write(&path, r#"{"not-an-ocid": {}}"#).unwrap();

    assert!(StaticFetcher::from_file(&path).is_err());
}

#[tokio::test]
async fn settings_drive_the_enricher() {
    let mut settings = Settings::default();
    settings
        .apply_env(|name: &str| match name {
            "TAG_OUTPUT_FIELD" => Some("tags".to_string()),
            "TAG_INSERTION_PATH" => Some("logContent.oracle".to_string()),
            "TAG_TYPES" => Some("freeform".to_string()),
            "INCLUDE_EMPTY_TAGS" => Some("true".to_string()),
            "OCID_KEY_FILTER" => Some("resourceId".to_string()),
            _ => None,
        })
        .unwrap();

    let fetcher = StaticFetcher::from_json(
        &json!({SUBNET: {"defined": {"Ops": {"Team": "net"}}}}).to_string(),
    )
    .unwrap();
    let enricher = Huginn::builder()
        .fetcher(fetcher)
        .config(settings.enrich_config().unwrap())
        .cache_config(settings.cache_config().unwrap())
        .build()
        .unwrap();

    let out = enricher
        .enrich(json!({
            "logContent": {"data": {"resourceId": SUBNET, "vnicId": "ocid1.vnic.oc1.phx.aaaavnic"}},
        }))
        .await;

    assert_eq!(
        out["logContent"]["oracle"]["tags"],
        json!({SUBNET: {"freeform": {}}})
    );
}
