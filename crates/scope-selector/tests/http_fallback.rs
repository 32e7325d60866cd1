//! Selector loading against the taxonomy REST service.

use std::time::Duration;

use scope_client::{HttpTaxonomyClient, TaxonomyApiConfig};
use scope_core::{Level, NodeId, TaxonomyKind};
use scope_selector::{CollectingSink, SelectorConfig, TargetSelector};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(mock_server: &MockServer, config: &SelectorConfig) -> HttpTaxonomyClient {
    let api = TaxonomyApiConfig {
        base_url: mock_server.uri().parse().unwrap(),
        api_token: zeroize::Zeroizing::new("test-token".into()),
        request_budget: Duration::from_secs(30),
    }
    .within(config.fetch_timeout);
    HttpTaxonomyClient::new(api).unwrap()
}

#[tokio::test]
async fn missing_tree_route_falls_back_to_roots_listing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/taxonomy/api/v1/original/tree"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/taxonomy/api/v1/original/levels/nationalLevel/roots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "N1", "name": "Nation"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = SelectorConfig::default();
    let mut selector = TargetSelector::new(
        client(&mock_server, &config),
        CollectingSink::new(),
        config,
    );
    assert!(selector.open().await);
    assert!(selector.failure().is_none());
    assert_eq!(selector.options(Level::NationalLevel).len(), 1);
}

#[tokio::test]
async fn tree_route_serves_nested_sector() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/taxonomy/api/v1/sector/tree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "N1", "name": "Nation", "children": [
                {"id": "R1", "name": "Region One", "children": []}
            ]}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = SelectorConfig::default();
    let mut selector = TargetSelector::new(
        client(&mock_server, &config),
        CollectingSink::new(),
        config,
    );
    assert!(selector.select_taxonomy_and_load(TaxonomyKind::Sector).await);
    let picked = selector
        .pick_and_load(Level::NationalLevel, &NodeId::new("N1").unwrap())
        .await
        .unwrap();
    // Children came nested with the tree, so nothing else is fetched.
    assert!(!picked);
    assert_eq!(selector.options(Level::Region).len(), 1);
}

#[tokio::test]
async fn overloaded_service_raises_banner_within_fetch_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/taxonomy/api/v1/expatriate/levels/expatriateRegion/roots"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = SelectorConfig::default().with_fetch_timeout(Duration::from_secs(2));
    let mut selector = TargetSelector::new(
        client(&mock_server, &config),
        CollectingSink::new(),
        config,
    );
    assert!(selector.select_taxonomy_and_load(TaxonomyKind::Expatriate).await);
    let failure = selector.failure().expect("banner raised");
    // Every planned attempt ran before the selector's timeout.
    assert!(failure.to_string().contains("503"), "{failure}");
    assert!(selector.roots().is_empty());
}
