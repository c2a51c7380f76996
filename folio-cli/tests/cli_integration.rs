//! CLI Integration Tests
//!
//! Runs complete commands against the fixture documents:
//! - Local files through `FileResolver`
//! - Relative stub sequences resolved next to the package on disk
//! - HTTP documents through `HttpResolver` and wiremock

use folio_cli::{run, CliConfig, Command, FileResolver, HttpResolver};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../folio-core/tests/fixtures/");

fn fixture(name: &str) -> String {
    format!("{FIXTURES}{name}")
}

// ============================================================================
// Local files
// ============================================================================

#[tokio::test]
async fn test_info_for_local_manifest() {
    let config = CliConfig::new(fixture("manifest.json"), Command::Info);
    let text = run(&config, &FileResolver).await.unwrap();

    assert!(text.contains("dialect:        iiif"));
    assert!(text.contains("canvases:       6"));
    assert!(text.contains("paged:          no"));
}

#[tokio::test]
async fn test_paging_flag_enables_spreads() {
    let mut config = CliConfig::new(fixture("manifest.json"), Command::Pages { index: 1 });
    config.paging = true;
    let text = run(&config, &FileResolver).await.unwrap();

    assert!(text.contains("shown:   [1, 2]"));
    assert!(text.contains("prev:    0"));
    assert!(text.contains("next:    3"));
}

#[tokio::test]
async fn test_label_lookup_on_local_package() {
    let config = CliConfig::new(
        fixture("package.json"),
        Command::Label {
            query: "3-4".to_string(),
        },
    );
    let text = run(&config, &FileResolver).await.unwrap();
    assert_eq!(text, "3-4: canvas 4");
}

#[tokio::test]
async fn test_legacy_stub_resolves_next_to_package() {
    let mut config = CliConfig::new("package.json", Command::Tree);
    config.data_base_uri = Some(FIXTURES.to_string());
    config.sequence_index = 1;
    let text = run(&config, &FileResolver).await.unwrap();

    assert!(text.contains("* Volume 2"));
}

#[tokio::test]
async fn test_missing_document_is_reported() {
    let config = CliConfig::new(fixture("absent.json"), Command::Info);
    let err = run(&config, &FileResolver).await.unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}

// ============================================================================
// HTTP
// ============================================================================

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_structure_for_remote_manifest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/iiif/book/manifest.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(include_str!("../../folio-core/tests/fixtures/manifest.json")),
        )
        .mount(&server)
        .await;

    let uri = format!("{}/iiif/book/manifest.json", server.uri());
    let config = CliConfig::new(uri, Command::Structure { index: 4 });
    let resolver = HttpResolver::new().unwrap();
    let text = run(&config, &resolver).await.unwrap();

    assert_eq!(text, "/1  Chapter 1\n/  Contents");
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_jsonp_transport_for_remote_package() {
    let server = MockServer::start().await;
    let body = format!(
        "manifestCallback({});",
        include_str!("../../folio-core/tests/fixtures/package.json")
    );
    Mock::given(method("GET"))
        .and(path("/packages/letters/package.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let uri = format!("{}/packages/letters/package.js", server.uri());
    let mut config = CliConfig::new(uri, Command::Info);
    config.jsonp = true;
    let resolver = HttpResolver::new().unwrap();
    let text = run(&config, &resolver).await.unwrap();

    assert!(text.contains("dialect:        legacy"));
    assert!(text.contains("sequence type:  seadragon-dzi"));
}
