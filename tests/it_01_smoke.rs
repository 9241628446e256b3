use paperchef::build_state;
use paperchef_models::{Config, StorageBackend};
use paperchef_testsupport::*;

#[tokio::test(flavor = "multi_thread")]
async fn smoke_test() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let client = PaperchefClient::new(&app.base_url);

    let health = client.health().await?;
    assert_eq!(health.status, "ok");
    assert_eq!(health.storage, "memory");
    assert!(!health.agent_configured);

    let metrics = prom_parse(&client.metrics().await?)?;
    assert_eq!(metrics.value("paperchef_uploads_total"), Some(0.0));
    assert_eq!(metrics.value("paperchef_chat_requests_total"), Some(0.0));

    let home = client.get("/").await?;
    assert!(home.status().is_success());
    let page = home.text().await?;
    assert!(page.contains("<form action=\"/upload\""));
    assert!(page.contains("/static/style.css"));

    let css = client.get("/static/style.css").await?;
    assert!(css.status().is_success());
    assert_eq!(css.headers()["content-type"], "text/css");

    app.stop().await?;
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let response = PaperchefClient::new(&app.base_url)
        .get("/admin")
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn state_is_wired_from_config() -> anyhow::Result<()> {
    let mut config = Config::default();
    config.storage.backend = StorageBackend::Memory;
    config.agent.token = None;

    let state = build_state(config).await?;
    assert_eq!(state.store.kind(), "memory");
    assert!(!state.agent.is_configured());
    assert!(state.metrics.render()?.contains("paperchef_uploads_total"));
    Ok(())
}

#[tokio::test]
async fn sample_config_file_loads() -> anyhow::Result<()> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/paperchef.toml");
    let config = Config::load(Some(&path))?;
    assert_eq!(config.storage.container, "pdf-uploads");
    assert_eq!(config.limits.max_upload_mb, 25);
    assert_eq!(config.agent.max_tool_rounds, 5);
    Ok(())
}
