use std::collections::HashMap;
use std::sync::Arc;

use extensions_catalog::config::REGISTRY_URL_KEY;
use extensions_catalog::{
    api, CatalogSettings, ExtensionsCatalog, FilesystemRegistry, Proxy, Registry,
};
use serde_json::json;
use tokio::net::TcpListener;

async fn start_mirror(catalog: serde_json::Value) -> (String, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extensions.json");
    std::fs::write(&path, catalog.to_string()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let registry: Arc<dyn Registry> = Arc::new(FilesystemRegistry::new(path));
    tokio::spawn(api::serve(listener, registry));

    (format!("http://{addr}"), dir)
}

fn sample_catalog() -> serde_json::Value {
    json!({
        "extensions": [{
            "publisher": { "publisherName": "foo", "displayName": "Foo" },
            "extensionName": "fooName",
            "displayName": "Foo",
            "shortDescription": "Foo extension",
            "license": "Apache-2.0",
            "categories": ["Kubernetes"],
            "unlisted": true,
            "versions": [{
                "version": "1.0.0",
                "preview": false,
                "lastUpdated": "2024-01-01T00:00:00Z",
                "ociUri": "oci-registry.foo/foo/bar",
                "files": []
            }]
        }]
    })
}

#[tokio::test]
async fn catalog_client_reads_from_mirror() {
    let (base, _dir) = start_mirror(sample_catalog()).await;

    let mut config = HashMap::new();
    config.insert(
        REGISTRY_URL_KEY.to_string(),
        format!("{base}/api/extensions.json"),
    );
    let catalog = ExtensionsCatalog::new(
        CatalogSettings::default(),
        Arc::new(Proxy::disabled()),
        Arc::new(Vec::<String>::new()),
        Arc::new(config),
    );

    let extensions = catalog.fetch_extensions().await.unwrap();
    assert_eq!(extensions.len(), 1);
    assert_eq!(extensions[0].id, "foo.fooName");
    assert!(extensions[0].unlisted);
}

#[tokio::test]
async fn mirror_routes() {
    let (base, _dir) = start_mirror(sample_catalog()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let health: serde_json::Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["extensions"], 1);

    let entry = client
        .get(format!("{base}/api/extensions/foo.fooName"))
        .send()
        .await
        .unwrap();
    assert_eq!(entry.status(), 200);
    let entry: serde_json::Value = entry.json().await.unwrap();
    assert_eq!(entry["extensionName"], "fooName");

    let missing = client
        .get(format!("{base}/api/extensions/foo.missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    let unknown = client.get(format!("{base}/nope")).send().await.unwrap();
    assert_eq!(unknown.status(), 404);

    let post = client
        .post(format!("{base}/api/extensions.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(post.status(), 405);
}

#[tokio::test]
async fn health_reports_unreadable_catalog() {
    let (base, dir) = start_mirror(sample_catalog()).await;
    std::fs::write(dir.path().join("extensions.json"), "{ truncated").unwrap();

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let response = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), 503);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "unavailable");
    assert!(body["error"].as_str().unwrap().contains("JSON"));
    assert!(body.get("extensions").is_none());
}
