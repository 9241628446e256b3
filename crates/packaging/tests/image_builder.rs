use paperchef_packaging::{ImageBuilder, ImageRecipe, DOCKERFILE_NAME};
use std::path::Path;
use tempfile::tempdir;

fn context_with_requirements() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("requirements.txt"), "fastapi\nuvicorn\n").unwrap();
    std::fs::create_dir(dir.path().join("app")).unwrap();
    std::fs::write(dir.path().join("app").join("main.py"), "app = None\n").unwrap();
    dir
}

#[cfg(unix)]
fn fake_docker(dir: &Path, script: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-docker");
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn missing_requirements_is_rejected_before_docker_runs() {
    let context = tempdir().unwrap();
    let builder = ImageBuilder::new("/definitely/not/docker");

    let err = builder
        .build(&ImageRecipe::generic(), context.path(), "paperchef:test")
        .await
        .unwrap_err();

    assert_eq!(err.error_type(), "PackagingException");
    assert!(err.to_string().contains("requirements.txt"));
    assert!(!context.path().join(DOCKERFILE_NAME).exists());
}

#[tokio::test]
async fn empty_tag_is_invalid() {
    let context = context_with_requirements();
    let err = ImageBuilder::default()
        .build(&ImageRecipe::generic(), context.path(), "  ")
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 400);
}

#[tokio::test]
async fn missing_docker_binary_is_a_packaging_error() {
    let context = context_with_requirements();
    let err = ImageBuilder::new("/definitely/not/docker")
        .build(&ImageRecipe::generic(), context.path(), "paperchef:test")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("failed to run /definitely/not/docker"));
    // The Dockerfile is written before the build is attempted.
    assert!(context.path().join(DOCKERFILE_NAME).exists());
}

#[cfg(unix)]
#[tokio::test]
async fn successful_build_passes_tag_and_dockerfile() {
    let context = context_with_requirements();
    let tools = tempdir().unwrap();
    let args_file = tools.path().join("args.txt");
    let docker = fake_docker(
        tools.path(),
        &format!("echo \"$@\" > {}", args_file.display()),
    );

    let dockerfile = ImageBuilder::new(docker)
        .build(&ImageRecipe::managed_platform(), context.path(), "paperchef:managed")
        .await
        .unwrap();

    let written = std::fs::read_to_string(&dockerfile).unwrap();
    assert!(written.contains("EXPOSE 8000"));

    let args = std::fs::read_to_string(&args_file).unwrap();
    assert!(args.starts_with("build -t paperchef:managed -f "));
    assert!(args.contains(DOCKERFILE_NAME));
}

#[cfg(unix)]
#[tokio::test]
async fn failed_build_surfaces_stderr() {
    let context = context_with_requirements();
    let tools = tempdir().unwrap();
    let docker = fake_docker(
        tools.path(),
        "echo 'ERROR: No matching distribution found for fastapi' >&2\nexit 1",
    );

    let err = ImageBuilder::new(docker)
        .build(&ImageRecipe::generic(), context.path(), "paperchef:broken")
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), 500);
    assert!(err
        .to_string()
        .contains("No matching distribution found for fastapi"));
}
