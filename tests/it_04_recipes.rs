use paperchef_packaging::{probe_tcp, render_dockerfile, ImageRecipe};
use paperchef_testsupport::*;
use std::time::Duration;

fn deploy_file(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("deploy")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn committed_dockerfiles_match_recipes() {
    assert_eq!(
        deploy_file("Dockerfile"),
        render_dockerfile(&ImageRecipe::generic())
    );
    assert_eq!(
        deploy_file("Dockerfile.managed"),
        render_dockerfile(&ImageRecipe::managed_platform())
    );
}

#[test]
fn recipes_differ_only_in_platform_settings() {
    let generic = ImageRecipe::generic();
    let managed = ImageRecipe::managed_platform();

    assert_eq!(generic.base_image, managed.base_image);
    assert_eq!(generic.workdir, managed.workdir);
    assert_eq!(generic.requirements, managed.requirements);
    assert_eq!(generic.app_module, managed.app_module);
    assert_eq!((generic.port, managed.port), (80, 8000));
    assert!(!generic.expose && managed.expose);
    assert!(!generic.pre_release && managed.pre_release);
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_sees_running_service_and_its_shutdown() -> anyhow::Result<()> {
    let app = spawn_app().await?;
    let addr = app.addr.to_string();

    probe_tcp(&addr, Duration::from_secs(2)).await?;

    app.stop().await?;
    assert!(probe_tcp(&addr, Duration::from_secs(2)).await.is_err());
    Ok(())
}

#[cfg(feature = "docker_tests")]
#[ignore]
#[tokio::test(flavor = "multi_thread")]
async fn generic_image_builds_and_listens() -> anyhow::Result<()> {
    use paperchef_packaging::{wait_until_live, ImageBuilder};
    use tokio::process::Command;

    let context = tempfile::tempdir()?;
    std::fs::write(context.path().join("requirements.txt"), "fastapi\nuvicorn\n")?;
    std::fs::create_dir(context.path().join("app"))?;
    std::fs::write(context.path().join("app/__init__.py"), "")?;
    std::fs::write(
        context.path().join("app/main.py"),
        "from fastapi import FastAPI\napp = FastAPI()\n",
    )?;

    let mut recipe = ImageRecipe::generic();
    recipe.port = 18080;
    ImageBuilder::default()
        .build(&recipe, context.path(), "paperchef-smoke:test")
        .await?;

    let run = Command::new("docker")
        .args(["run", "-d", "--rm", "-p", "18080:18080", "paperchef-smoke:test"])
        .output()
        .await?;
    anyhow::ensure!(run.status.success(), "docker run failed");
    let container = String::from_utf8_lossy(&run.stdout).trim().to_string();

    let live = wait_until_live("127.0.0.1:18080", Duration::from_secs(30), Duration::from_millis(500)).await;
    Command::new("docker").args(["stop", &container]).output().await?;
    live?;
    Ok(())
}
