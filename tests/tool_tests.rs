use convene::figures;
use convene::tools::ToolRegistry;
use convene::utils::toml_config::ToolsConfig;
use serde_json::json;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(endpoints: &[(&str, String)], timeout_secs: u64) -> ToolsConfig {
    ToolsConfig {
        timeout_secs,
        endpoints: endpoints
            .iter()
            .map(|(tool, url)| (tool.to_string(), url.clone()))
            .collect::<HashMap<_, _>>(),
        ..ToolsConfig::default()
    }
}

fn europe_pmc_body() -> serde_json::Value {
    json!({
        "resultList": {
            "result": [
                {"id": "1", "title": "D2 receptor signaling", "journalTitle": "Neuron", "pubYear": "2019", "citedByCount": 12},
                {"id": "2", "title": "Arrestin bias at D2", "journalTitle": "Cell", "pubYear": "2020", "citedByCount": 30},
                {"id": "3", "title": "Dopamine and cognition", "journalTitle": "Nature", "pubYear": "2020", "citedByCount": 4}
            ]
        }
    })
}

#[tokio::test]
async fn test_registry_runs_default_adapter_against_override() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(europe_pmc_body()))
        .mount(&server)
        .await;

    let registry =
        ToolRegistry::with_default_tools(&config_for(&[("europe_pmc", server.uri())], 5));
    let result = registry.run("europe_pmc", "dopamine").await;

    assert!(result.error.is_none());
    assert_eq!(result.items.len(), 3);
    assert!(result.summary.starts_with("3 results: D2 receptor signaling"));

    let figure = figures::render("europe_pmc", &result.items).expect("year figure");
    let counts: Vec<(String, f64)> = figure
        .bars
        .iter()
        .map(|b| (b.label.clone(), b.value))
        .collect();
    assert_eq!(
        counts,
        vec![("2019".to_string(), 1.0), ("2020".to_string(), 2.0)]
    );
}

#[tokio::test]
async fn test_slow_upstream_times_out_within_bound() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(europe_pmc_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let registry =
        ToolRegistry::with_default_tools(&config_for(&[("europe_pmc", server.uri())], 1));
    let started = Instant::now();
    let result = registry.run("europe_pmc", "dopamine").await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(result.items.is_empty());
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_unreachable_upstream_is_folded_into_result() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let registry = ToolRegistry::with_default_tools(&config_for(&[("openalex_works", uri)], 2));
    let result = registry.run("openalex_works", "dopamine").await;

    assert!(result.items.is_empty());
    assert!(result.error.is_some());
    assert!(!result.is_useful());
}

#[tokio::test]
async fn test_upstream_error_status_is_folded_into_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let registry =
        ToolRegistry::with_default_tools(&config_for(&[("europe_pmc", server.uri())], 2));
    let result = registry.run("europe_pmc", "dopamine").await;
    assert!(result.error.is_some());
    assert!(result.items.is_empty());
}

#[tokio::test]
async fn test_unknown_tool_names_itself() {
    let registry = ToolRegistry::with_default_tools(&ToolsConfig::default());
    let result = registry.run("crystal_ball", "dopamine").await;
    assert!(result.items.is_empty());
    assert!(result.summary.contains("crystal_ball"));
    assert!(!registry.has_tool("crystal_ball"));
    assert_eq!(registry.tool_names().len(), convene::tools::KNOWN_TOOLS.len());
}
