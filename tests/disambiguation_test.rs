use anyhow::Result;
use httpmock::prelude::*;
use maven_source_finder::{
    Credential, CredentialSet, Dependency, FinderConfig, MetadataFinder, ReqwestTransport,
};
use std::sync::Arc;

/// `mockwebserver` inherits its only link from the okhttp parent, which names
/// the `okhttp` repository rather than the artifact itself.
async fn mock_manifests(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(
                "/maven2/com/squareup/okhttp3/mockwebserver/3.10.0/mockwebserver-3.10.0.pom",
            );
            then.status(200).body(
                r#"<project>
  <parent>
    <groupId>com.squareup.okhttp3</groupId>
    <artifactId>parent</artifactId>
    <version>3.10.0</version>
  </parent>
  <artifactId>mockwebserver</artifactId>
</project>"#,
            );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/maven2/com/squareup/okhttp3/parent/3.10.0/parent-3.10.0.pom");
            then.status(200).body(
                r#"<project>
  <artifactId>parent</artifactId>
  <scm><url>https://github.com/square/okhttp</url></scm>
</project>"#,
            );
        })
        .await;
}

async fn mock_repository(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/square/okhttp")
                .header("Authorization", "token ghp_token");
            then.status(200)
                .json_body(serde_json::json!({"default_branch": "master"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/square/okhttp/git/refs/heads/master");
            then.status(200).json_body(serde_json::json!({
                "ref": "refs/heads/master",
                "object": {"sha": "aa218b992ea6a3b0e4bb7ed6a2b2d0c4d2f2d2c1", "type": "commit"}
            }));
        })
        .await;
}

fn finder(server: &MockServer) -> MetadataFinder<ReqwestTransport> {
    let config = FinderConfig {
        hosting_api_url: Some(server.base_url()),
        ..FinderConfig::default()
    };
    let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
    let credentials = CredentialSet::new(vec![Credential::GitHosting {
        host: "github.com".to_string(),
        username: Some("x-access-token".to_string()),
        password: "ghp_token".to_string(),
    }]);
    let dependency = Dependency::new("com.squareup.okhttp3:mockwebserver", "3.10.0")
        .with_registry(server.url("/maven2"));
    MetadataFinder::new(dependency, credentials, config, transport)
}

#[tokio::test]
async fn test_matching_subdirectory_is_appended() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_manifests(&server).await;
    mock_repository(&server).await;
    let contents = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/square/okhttp/contents/")
                .query_param("ref", "aa218b992ea6a3b0e4bb7ed6a2b2d0c4d2f2d2c1")
                .header("Authorization", "token ghp_token");
            then.status(200).json_body(serde_json::json!([
                {"name": ".github", "type": "dir"},
                {"name": "README.md", "type": "file"},
                {"name": "mockwebserver", "type": "dir"},
                {"name": "okhttp", "type": "dir"}
            ]));
        })
        .await;

    let finder = finder(&server);
    let url = finder.source_url().await?;
    assert_eq!(
        url.unwrap().as_str(),
        "https://github.com/square/okhttp/tree/HEAD/mockwebserver"
    );

    finder.source_url().await?;
    contents.assert_hits_async(1).await;
    Ok(())
}

#[tokio::test]
async fn test_no_matching_subdirectory_is_absence() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_manifests(&server).await;
    mock_repository(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/square/okhttp/contents/");
            then.status(200).json_body(serde_json::json!([
                {"name": "okhttp", "type": "dir"},
                {"name": "samples", "type": "dir"}
            ]));
        })
        .await;

    assert!(finder(&server).source_url().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_listing_not_found_is_absence() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_manifests(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/square/okhttp");
            then.status(404)
                .json_body(serde_json::json!({"message": "Not Found"}));
        })
        .await;

    assert!(finder(&server).source_url().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_listing_outage_keeps_inherited_link() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_manifests(&server).await;
    mock_repository(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/square/okhttp/contents/");
            then.status(503);
        })
        .await;

    assert_eq!(
        finder(&server).source_url().await?.unwrap().as_str(),
        "https://github.com/square/okhttp"
    );
    Ok(())
}
