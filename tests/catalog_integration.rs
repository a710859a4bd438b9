//! Integration tests for the catalog client against a mock product-search API.

mod support;

use std::time::Duration;

use serde_json::json;
use support::socket_guard::start_mock_server_or_skip;
use tnm_core::{CatalogClient, CatalogError, CatalogQuery, CatalogSettings, parse_extent};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn item(id: &str, url: &str, datasets: &[&str]) -> serde_json::Value {
    json!({
        "title": format!("USGS 1/3 Arc Second {id}"),
        "sourceId": id,
        "downloadURL": url,
        "sizeInBytes": 2048,
        "format": "GeoTIFF",
        "datasets": datasets,
    })
}

fn query() -> CatalogQuery {
    CatalogQuery::new(parse_extent("-106,39,-105,40").expect("valid extent"))
}

fn client(base: &str, page_size: u32) -> CatalogClient {
    CatalogClient::with_settings(CatalogSettings {
        base_url: format!("{base}/api/v1/products"),
        page_size,
        ..CatalogSettings::default()
    })
    .expect("client builds")
}

#[tokio::test]
async fn test_search_collects_every_page() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .and(query_param("offset", "0"))
        .and(query_param("max", "2"))
        .and(query_param("bbox", "-106,39,-105,40"))
        .and(query_param("outputFormat", "JSON"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "items": [
                item("a", "https://example.com/a.tif", &["NED"]),
                item("b", "https://example.com/b.tif", &["NED"]),
            ],
            "messages": ["Results limited to extent"],
            "errors": [],
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "items": [item("c", "https://example.com/c.tif", &["US Topo"])],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server.uri(), 2).search(&query()).await.unwrap();

    let ids: Vec<&str> = result.products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_eq!(result.total, 3);
    assert_eq!(result.messages, ["Results limited to extent"]);
    assert!(result.errors.is_empty());
    assert_eq!(result.products[2].datasets, ["US Topo"]);
}

#[tokio::test]
async fn test_search_stops_when_server_repeats_page_without_total() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    // Ignores `offset`: every request gets the same full page and no total.
    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                item("a", "https://example.com/a.tif", &["NED"]),
                item("b", "https://example.com/b.tif", &["NED"]),
            ],
        })))
        .expect(2)
        .mount(&server)
        .await;

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client(&server.uri(), 2).search(&query()),
    )
    .await
    .expect("search finishes")
    .unwrap();

    let ids: Vec<&str> = result.products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
}

#[tokio::test]
async fn test_search_empty_result_is_ok() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 0, "items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server.uri(), 1000).search(&query()).await.unwrap();
    assert!(result.is_empty());
    assert_eq!(result.total, 0);
}

#[tokio::test]
async fn test_search_sends_filters() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(query_param("datasets", "US Topo,National Elevation Dataset (NED) 1/3 arc-second"))
        .and(query_param("prodFormats", "GeoTIFF,GeoPDF"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "items": [item("a", "https://example.com/a.tif", &["US Topo"])],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut query = query();
    query.datasets = vec![
        "US Topo".to_string(),
        "National Elevation Dataset (NED) 1/3 arc-second".to_string(),
    ];
    query.formats = vec!["GeoTIFF".to_string(), "GeoPDF".to_string()];

    let result = client(&server.uri(), 1000).search(&query).await.unwrap();
    assert_eq!(result.products.len(), 1);
}

#[tokio::test]
async fn test_search_skips_items_without_url_and_duplicates() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "items": [
                item("a", "https://example.com/a.tif", &[]),
                {"title": "metadata only", "sourceId": "m"},
                item("a", "https://example.com/a-copy.tif", &[]),
            ],
        })))
        .mount(&server)
        .await;

    let result = client(&server.uri(), 1000).search(&query()).await.unwrap();
    assert_eq!(result.products.len(), 1);
    assert_eq!(result.products[0].download_url, "https://example.com/a.tif");
}

#[tokio::test]
async fn test_search_server_error_maps_to_api_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server.uri(), 1000).search(&query()).await.unwrap_err();
    assert!(
        matches!(err, CatalogError::Api { status: 500, .. }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_search_malformed_json_maps_to_malformed() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server.uri(), 1000).search(&query()).await.unwrap_err();
    assert!(
        matches!(err, CatalogError::Malformed { .. }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_search_unreachable_endpoint_is_network_error() {
    // Port 9 (discard) is almost never listening on localhost.
    let err = client("http://127.0.0.1:9", 1000)
        .search(&query())
        .await
        .unwrap_err();
    assert!(err.is_network(), "unexpected error: {err:?}");
}
