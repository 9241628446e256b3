use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use paperchef_models::{ChatHistory, ChatReply, ChatRequest, HealthStatus, UploadOutcome};
use paperchef_packaging::{
    probe_tcp, render_dockerfile, wait_until_live, ImageBuilder, ImageRecipe, RecipeVariant,
};
use reqwest::{multipart, Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "paperchef-cli")]
#[command(about = "CLI tool for paperchef")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "PAPERCHEF_ENDPOINT", default_value = "http://localhost:8000")]
    endpoint: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Dockerfile for a deployment variant
    Recipe {
        /// generic or managed
        #[arg(long, default_value = "generic")]
        variant: RecipeVariant,
        /// Load a custom recipe from a TOML file instead
        #[arg(long)]
        from: Option<PathBuf>,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build the service image with docker
    Build {
        #[arg(long, default_value = "generic")]
        variant: RecipeVariant,
        /// Build context containing requirements.txt and app/
        #[arg(long, default_value = ".")]
        context: PathBuf,
        /// Image tag
        #[arg(long, default_value = "paperchef:latest")]
        tag: String,
        /// Docker executable
        #[arg(long, default_value = "docker")]
        docker: PathBuf,
    },
    /// Check that a TCP port accepts connections
    Probe {
        /// host:port
        addr: String,
        /// Per-attempt timeout in milliseconds
        #[arg(long, default_value = "2000")]
        timeout_ms: u64,
        /// Keep retrying for this long before failing
        #[arg(long)]
        wait_ms: Option<u64>,
    },
    /// Upload a PDF and print its summary
    Upload {
        /// PDF file path
        file: PathBuf,
    },
    /// Send a message to the cooking assistant
    Chat {
        message: String,
    },
    /// Show the cooking assistant conversation
    History,
    /// Show service health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Recipe { variant, from, out } => {
            print_recipe(variant, from.as_deref(), out.as_deref())?;
        }
        Commands::Build {
            variant,
            context,
            tag,
            docker,
        } => {
            let recipe = variant.recipe();
            let dockerfile = ImageBuilder::new(docker)
                .build(&recipe, &context, &tag)
                .await?;
            println!("✅ Built {tag}");
            println!("   Dockerfile: {}", dockerfile.display());
        }
        Commands::Probe {
            addr,
            timeout_ms,
            wait_ms,
        } => {
            let timeout = Duration::from_millis(timeout_ms);
            let elapsed = match wait_ms {
                Some(wait) => {
                    wait_until_live(&addr, Duration::from_millis(wait), Duration::from_millis(250))
                        .await?
                }
                None => probe_tcp(&addr, timeout).await?,
            };
            println!("✅ {addr} is accepting connections ({} ms)", elapsed.as_millis());
        }
        Commands::Upload { file } => {
            upload(&client, &cli.endpoint, &file).await?;
        }
        Commands::Chat { message } => {
            chat(&client, &cli.endpoint, message).await?;
        }
        Commands::History => {
            history(&client, &cli.endpoint).await?;
        }
        Commands::Health => {
            health(&client, &cli.endpoint).await?;
        }
    }

    Ok(())
}

fn load_recipe(variant: RecipeVariant, from: Option<&Path>) -> Result<ImageRecipe> {
    match from {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
        }
        None => Ok(variant.recipe()),
    }
}

fn print_recipe(variant: RecipeVariant, from: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let dockerfile = render_dockerfile(&load_recipe(variant, from)?);
    match out {
        Some(path) => {
            std::fs::write(path, &dockerfile)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{dockerfile}"),
    }
    Ok(())
}

async fn fail(response: Response, action: &str) -> anyhow::Error {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    error!("Failed to {}: {}", action, error_text);
    anyhow::anyhow!("{action} failed with {status}: {error_text}")
}

async fn upload(client: &Client, endpoint: &str, file: &Path) -> Result<()> {
    let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let Some(filename) = file.file_name().and_then(|n| n.to_str()) else {
        bail!("{} has no usable file name", file.display());
    };
    info!("Uploading {} ({} bytes)", filename, data.len());

    let part = multipart::Part::bytes(data)
        .file_name(filename.to_string())
        .mime_str("application/pdf")?;
    let form = multipart::Form::new().percent_encode_noop().part("file", part);

    let response = client
        .post(format!("{endpoint}/api/upload"))
        .multipart(form)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(fail(response, "upload").await);
    }

    let outcome: UploadOutcome = response.json().await?;
    println!("✅ Stored at {}", outcome.blob_url);
    println!("   Title: {}", outcome.summary.title);
    println!("   Author: {}", outcome.summary.author);
    println!("   Summary: {}", outcome.summary.summary);
    Ok(())
}

async fn chat(client: &Client, endpoint: &str, message: String) -> Result<()> {
    let response = client
        .post(format!("{endpoint}/api/chat"))
        .json(&ChatRequest { message })
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(fail(response, "chat").await);
    }

    let reply: ChatReply = response.json().await?;
    println!("{}", reply.reply);
    Ok(())
}

async fn history(client: &Client, endpoint: &str) -> Result<()> {
    let response = client
        .get(format!("{endpoint}/api/chat/history"))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(fail(response, "fetch history").await);
    }

    let history: ChatHistory = response.json().await?;
    for message in history.messages {
        let text = message.text_content();
        if text.is_empty() {
            continue;
        }
        println!("{}: {}", serde_json::to_string(&message.role)?.trim_matches('"'), text);
    }
    Ok(())
}

async fn health(client: &Client, endpoint: &str) -> Result<()> {
    let response = client.get(format!("{endpoint}/healthz")).send().await?;

    if !response.status().is_success() {
        return Err(fail(response, "health check").await);
    }

    let status: HealthStatus = response.json().await?;
    println!("{} (version {})", status.status, status.version);
    println!("   Storage: {}", status.storage);
    println!("   Agent configured: {}", status.agent_configured);
    Ok(())
}
