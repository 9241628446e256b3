use serde::{Deserialize, Serialize};

/// Everything needed to render a container build for the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ImageRecipe {
    pub base_image: String,
    /// Installed with apt before any Python dependency.
    #[serde(default)]
    pub system_packages: Vec<String>,
    pub requirements: String,
    #[serde(default)]
    pub pre_release: bool,
    pub workdir: String,
    /// Application package copied next to the requirements.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    pub port: u16,
    #[serde(default)]
    pub expose: bool,
    /// ASGI target in `module:attribute` form.
    pub app_module: String,
}

fn default_source_dir() -> String {
    "app".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeVariant {
    Generic,
    Managed,
}

impl RecipeVariant {
    pub fn recipe(self) -> ImageRecipe {
        match self {
            RecipeVariant::Generic => ImageRecipe::generic(),
            RecipeVariant::Managed => ImageRecipe::managed_platform(),
        }
    }
}

impl std::str::FromStr for RecipeVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(RecipeVariant::Generic),
            "managed" | "managed-platform" => Ok(RecipeVariant::Managed),
            other => Err(format!(
                "unknown recipe variant '{other}' (expected generic or managed)"
            )),
        }
    }
}

impl ImageRecipe {
    pub fn generic() -> Self {
        Self {
            base_image: "python:3.10-slim".to_string(),
            system_packages: Vec::new(),
            requirements: "requirements.txt".to_string(),
            pre_release: false,
            workdir: "/code".to_string(),
            source_dir: default_source_dir(),
            port: 80,
            expose: false,
            app_module: "app.main:app".to_string(),
        }
    }

    /// Variant for hosted container platforms: native toolchain for wheels
    /// without binaries, pre-release packages and a declared port 8000.
    pub fn managed_platform() -> Self {
        Self {
            system_packages: vec!["build-essential".to_string()],
            pre_release: true,
            port: 8000,
            expose: true,
            ..Self::generic()
        }
    }

    fn in_workdir(&self, relative: &str) -> String {
        format!("{}/{}", self.workdir.trim_end_matches('/'), relative)
    }
}

pub fn render_dockerfile(recipe: &ImageRecipe) -> String {
    let requirements = recipe.in_workdir(&recipe.requirements);
    let pre = if recipe.pre_release { "--pre " } else { "" };

    let mut sections = vec![
        format!("FROM {}", recipe.base_image),
        format!("WORKDIR {}", recipe.workdir),
    ];
    if !recipe.system_packages.is_empty() {
        sections.push(format!(
            "RUN apt-get update \\\n    && apt-get install -y --no-install-recommends {} \\\n    && rm -rf /var/lib/apt/lists/*",
            recipe.system_packages.join(" ")
        ));
    }
    sections.push(format!(
        "COPY ./{} {requirements}\nRUN pip install --no-cache-dir {pre}-r {requirements}",
        recipe.requirements
    ));
    sections.push(format!(
        "COPY ./{} {}",
        recipe.source_dir,
        recipe.in_workdir(&recipe.source_dir)
    ));
    if recipe.expose {
        sections.push(format!("EXPOSE {}", recipe.port));
    }
    sections.push(format!(
        "CMD [\"uvicorn\", \"{}\", \"--host\", \"0.0.0.0\", \"--port\", \"{}\"]",
        recipe.app_module, recipe.port
    ));

    let mut out = sections.join("\n\n");
    out.push('\n');
    out
}
