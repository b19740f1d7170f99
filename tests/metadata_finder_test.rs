use anyhow::Result;
use httpmock::prelude::*;
use maven_source_finder::{
    Credential, CredentialSet, Dependency, FinderConfig, FinderError, MetadataFinder,
    ReqwestTransport,
};
use std::sync::Arc;

const OKHTTP_PATH: &str = "/maven2/com/squareup/okhttp3/okhttp/3.10.0/okhttp-3.10.0.pom";
const PARENT_PATH: &str = "/maven2/com/squareup/okhttp3/parent/3.10.0/parent-3.10.0.pom";

fn okhttp_pom_without_link() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>com.squareup.okhttp3</groupId>
    <artifactId>parent</artifactId>
    <version>3.10.0</version>
  </parent>
  <artifactId>okhttp</artifactId>
  <name>OkHttp</name>
</project>"#
}

fn parent_pom(scm_url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.squareup.okhttp3</groupId>
  <artifactId>parent</artifactId>
  <version>3.10.0</version>
  <scm>
    <url>{}</url>
  </scm>
</project>"#,
        scm_url
    )
}

fn finder_for(server: &MockServer, credentials: Vec<Credential>) -> MetadataFinder<ReqwestTransport> {
    let config = FinderConfig {
        hosting_api_url: Some(server.base_url()),
        ..FinderConfig::default()
    };
    let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
    let dependency = Dependency::new("com.squareup.okhttp3:okhttp", "3.10.0")
        .with_registry(server.url("/maven2"));
    MetadataFinder::new(dependency, CredentialSet::new(credentials), config, transport)
}

#[tokio::test]
async fn test_direct_link_is_used_and_cached() -> Result<()> {
    let server = MockServer::start_async().await;
    let pom = server
        .mock_async(|when, then| {
            when.method(GET).path(OKHTTP_PATH);
            then.status(200).body(
                "<project><scm><url>https://github.com/square/okhttp</url></scm></project>",
            );
        })
        .await;

    let finder = finder_for(&server, vec![]);
    for _ in 0..3 {
        let url = finder.source_url().await?;
        assert_eq!(url.unwrap().as_str(), "https://github.com/square/okhttp");
    }

    pom.assert_hits_async(1).await;
    Ok(())
}

#[tokio::test]
async fn test_falls_back_to_parent_link() -> Result<()> {
    let server = MockServer::start_async().await;
    let child = server
        .mock_async(|when, then| {
            when.method(GET).path(OKHTTP_PATH);
            then.status(200).body(okhttp_pom_without_link());
        })
        .await;
    let parent = server
        .mock_async(|when, then| {
            when.method(GET).path(PARENT_PATH);
            then.status(200).body(parent_pom("https://github.com/square/okhttp"));
        })
        .await;

    let finder = finder_for(&server, vec![]);
    let url = finder.source_url().await?;

    child.assert_async().await;
    parent.assert_async().await;
    assert_eq!(url.unwrap().as_str(), "https://github.com/square/okhttp");
    Ok(())
}

#[tokio::test]
async fn test_nested_properties_are_substituted() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(OKHTTP_PATH);
            then.status(200).body(
                r#"<project>
  <properties>
    <base>https://github.com/square</base>
    <repo.url>${base}/okhttp</repo.url>
  </properties>
  <url>${repo.url}</url>
</project>"#,
            );
        })
        .await;

    let finder = finder_for(&server, vec![]);
    assert_eq!(
        finder.source_url().await?.unwrap().as_str(),
        "https://github.com/square/okhttp"
    );
    Ok(())
}

#[tokio::test]
async fn test_absence_when_no_ancestor_has_a_link() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(OKHTTP_PATH);
            then.status(200).body(okhttp_pom_without_link());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(PARENT_PATH);
            then.status(200).body("<project><artifactId>parent</artifactId></project>");
        })
        .await;

    let finder = finder_for(&server, vec![]);
    assert!(finder.source_url().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_missing_manifest_is_absence() -> Result<()> {
    let server = MockServer::start_async().await;
    let pom = server
        .mock_async(|when, then| {
            when.method(GET).path(OKHTTP_PATH);
            then.status(404);
        })
        .await;

    let finder = finder_for(&server, vec![]);
    assert!(finder.source_url().await?.is_none());
    assert!(finder.source_url().await?.is_none());
    pom.assert_hits_async(1).await;
    Ok(())
}

#[tokio::test]
async fn test_redirect_to_mirror_is_transparent() -> Result<()> {
    let server = MockServer::start_async().await;
    let mirror_path = "/mirror/com/squareup/okhttp3/okhttp/3.10.0/okhttp-3.10.0.pom";
    let mirror_url = server.url(mirror_path);
    server
        .mock_async(|when, then| {
            when.method(GET).path(OKHTTP_PATH);
            then.status(302).header("Location", mirror_url.as_str());
        })
        .await;
    let mirror = server
        .mock_async(|when, then| {
            when.method(GET).path(mirror_path);
            then.status(200).body(
                "<project><url>https://github.com/square/okhttp</url></project>",
            );
        })
        .await;

    let finder = finder_for(&server, vec![]);
    assert_eq!(
        finder.source_url().await?.unwrap().as_str(),
        "https://github.com/square/okhttp"
    );
    mirror.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_custom_registry_with_credentials() -> Result<()> {
    let server = MockServer::start_async().await;
    let authenticated = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(OKHTTP_PATH)
                .header("Authorization", "Basic bW9uYTpzM2NyZXQ=");
            then.status(200).body(
                "<project><url>https://github.com/square/okhttp</url></project>",
            );
        })
        .await;

    let credentials = vec![Credential::Registry {
        url: server.url("/maven2"),
        username: Some("mona".to_string()),
        password: Some("s3cret".to_string()),
    }];
    let finder = finder_for(&server, credentials);

    assert_eq!(
        finder.source_url().await?.unwrap().as_str(),
        "https://github.com/square/okhttp"
    );
    // Unmatched requests get httpmock's 404, so the answer above proves the header was sent.
    authenticated.assert_hits_async(1).await;
    Ok(())
}

#[tokio::test]
async fn test_custom_registry_without_credentials_is_absence() -> Result<()> {
    let server = MockServer::start_async().await;
    let authenticated = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(OKHTTP_PATH)
                .header("Authorization", "Basic bW9uYTpzM2NyZXQ=");
            then.status(200).body(
                "<project><url>https://github.com/square/okhttp</url></project>",
            );
        })
        .await;

    let finder = finder_for(&server, vec![]);
    assert!(finder.source_url().await?.is_none());
    authenticated.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn test_network_failure_is_surfaced() {
    let config = FinderConfig::default();
    let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
    let dependency = Dependency::new("com.squareup.okhttp3:okhttp", "3.10.0")
        .with_registry("http://127.0.0.1:1/maven2");
    let finder = MetadataFinder::new(dependency, CredentialSet::default(), config, transport);

    let err = finder.source_url().await.unwrap_err();
    assert!(matches!(err, FinderError::Http(_)));
}
