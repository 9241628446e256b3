use anyhow::Result;
use paperchef_models::{ChatHistory, ChatReply, ChatRequest, HealthStatus, UploadOutcome};
use reqwest::{multipart, Client, Response, StatusCode};

pub struct PaperchefClient {
    client: Client,
    base_url: String,
}

impl PaperchefClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn form(field: &str, filename: &str, data: Vec<u8>) -> Result<multipart::Form> {
        let part = multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;
        // Browsers send the file name unescaped.
        Ok(multipart::Form::new()
            .percent_encode_noop()
            .part(field.to_string(), part))
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self.client.get(self.url("/healthz")).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Health check failed: {}", error_text);
        }

        Ok(response.json().await?)
    }

    pub async fn metrics(&self) -> Result<String> {
        let response = self.client.get(self.url("/metrics")).send().await?;
        Ok(response.error_for_status()?.text().await?)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    /// Multipart POST with a single file field, returning the raw response.
    pub async fn upload_raw(
        &self,
        path: &str,
        field: &str,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(path))
            .multipart(Self::form(field, filename, data)?)
            .send()
            .await?)
    }

    pub async fn upload(&self, filename: &str, data: Vec<u8>) -> Result<UploadOutcome> {
        let response = self.upload_raw("/api/upload", "file", filename, data).await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Upload failed: {}", error_text);
        }

        Ok(response.json().await?)
    }

    /// Browser-style upload; returns the status and rendered page.
    pub async fn upload_page(&self, filename: &str, data: Vec<u8>) -> Result<(StatusCode, String)> {
        let response = self.upload_raw("/upload", "file", filename, data).await?;
        let status = response.status();
        Ok((status, response.text().await?))
    }

    pub async fn chat_raw(&self, message: &str) -> Result<Response> {
        Ok(self
            .client
            .post(self.url("/api/chat"))
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?)
    }

    pub async fn chat(&self, message: &str) -> Result<ChatReply> {
        let response = self.chat_raw(message).await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Chat failed: {}", error_text);
        }

        Ok(response.json().await?)
    }

    pub async fn history(&self) -> Result<ChatHistory> {
        let response = self.client.get(self.url("/api/chat/history")).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("History failed: {}", error_text);
        }

        Ok(response.json().await?)
    }

    pub async fn reset_history(&self) -> Result<()> {
        let response = self
            .client
            .delete(self.url("/api/chat/history"))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Reset failed: {}", error_text);
        }

        Ok(())
    }
}
