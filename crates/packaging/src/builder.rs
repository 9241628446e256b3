use crate::recipe::{render_dockerfile, ImageRecipe};
use paperchef_models::AppError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{error, info, instrument};

pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Runs container builds through the docker CLI.
pub struct ImageBuilder {
    program: PathBuf,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl ImageBuilder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Writes the rendered Dockerfile into `context_dir` and builds `tag` from it.
    #[instrument(skip(self, recipe), fields(base = %recipe.base_image))]
    pub async fn build(
        &self,
        recipe: &ImageRecipe,
        context_dir: &Path,
        tag: &str,
    ) -> Result<PathBuf, AppError> {
        if tag.trim().is_empty() {
            return Err(AppError::invalid("image tag must not be empty"));
        }

        let requirements = context_dir.join(&recipe.requirements);
        if !tokio::fs::try_exists(&requirements).await.unwrap_or(false) {
            return Err(AppError::Packaging {
                reason: format!(
                    "requirements file {} not found in build context",
                    requirements.display()
                ),
            });
        }

        let dockerfile_path = context_dir.join(DOCKERFILE_NAME);
        tokio::fs::write(&dockerfile_path, render_dockerfile(recipe))
            .await
            .map_err(|e| AppError::Packaging {
                reason: format!("failed to write {}: {}", dockerfile_path.display(), e),
            })?;

        info!("Building image {} from {:?}", tag, context_dir);

        let output = Command::new(&self.program)
            .arg("build")
            .arg("-t")
            .arg(tag)
            .arg("-f")
            .arg(&dockerfile_path)
            .arg(context_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| AppError::Packaging {
                reason: format!("failed to run {}: {}", self.program.display(), e),
            })?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Image build failed - stdout: {}", stdout);
            error!("Image build failed - stderr: {}", stderr);
            return Err(AppError::Packaging {
                reason: format!("image build failed: {}", stderr.trim()),
            });
        }

        info!("Built image {}", tag);
        Ok(dockerfile_path)
    }
}
