use crate::BlobStore;
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use paperchef_models::AppError;
use reqwest::{Client, Method, StatusCode, Url};
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const AZURE_STORAGE_VERSION: &str = "2021-08-06";

const DEV_ACCOUNT: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

#[derive(Clone)]
enum Credential {
    SharedKey(Vec<u8>),
    Sas(String),
}

/// Parsed `Key=Value;...` storage connection string.
#[derive(Clone)]
pub struct AzureConnection {
    pub account: String,
    pub blob_endpoint: Url,
    credential: Credential,
}

impl AzureConnection {
    pub fn parse(conn: &str) -> Result<Self, AppError> {
        let mut account = None;
        let mut key = None;
        let mut sas = None;
        let mut endpoint = None;
        let mut protocol = "https".to_string();
        let mut suffix = "core.windows.net".to_string();

        for pair in conn.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                AppError::Config {
                    reason: format!("malformed connection string segment: {pair}"),
                }
            })?;
            match name.trim().to_ascii_lowercase().as_str() {
                "usedevelopmentstorage" if value.eq_ignore_ascii_case("true") => {
                    account = Some(DEV_ACCOUNT.to_string());
                    key = Some(DEV_ACCOUNT_KEY.to_string());
                    endpoint = Some(DEV_BLOB_ENDPOINT.to_string());
                    protocol = "http".to_string();
                }
                "accountname" => account = Some(value.to_string()),
                "accountkey" => key = Some(value.to_string()),
                "sharedaccesssignature" => sas = Some(value.trim_start_matches('?').to_string()),
                "blobendpoint" => endpoint = Some(value.trim_end_matches('/').to_string()),
                "defaultendpointsprotocol" => protocol = value.to_string(),
                "endpointsuffix" => suffix = value.to_string(),
                _ => {}
            }
        }

        let account = account.ok_or_else(|| AppError::Config {
            reason: "connection string has no AccountName".to_string(),
        })?;
        let endpoint =
            endpoint.unwrap_or_else(|| format!("{protocol}://{account}.blob.{suffix}"));
        let blob_endpoint = Url::parse(&endpoint).map_err(|e| AppError::Config {
            reason: format!("invalid blob endpoint {endpoint}: {e}"),
        })?;

        let credential = match (key, sas) {
            (Some(key), _) => {
                let decoded = base64::engine::general_purpose::STANDARD
                    .decode(key.as_bytes())
                    .map_err(|e| AppError::Config {
                        reason: format!("AccountKey is not valid base64: {e}"),
                    })?;
                Credential::SharedKey(decoded)
            }
            (None, Some(sas)) => Credential::Sas(sas),
            (None, None) => {
                return Err(AppError::Config {
                    reason: "connection string needs AccountKey or SharedAccessSignature"
                        .to_string(),
                })
            }
        };

        Ok(Self {
            account,
            blob_endpoint,
            credential,
        })
    }

    pub fn uses_shared_key(&self) -> bool {
        matches!(self.credential, Credential::SharedKey(_))
    }

    /// URL of a container (`name == None`) or of a blob inside it.
    pub fn resource_url(&self, container: &str, name: Option<&str>) -> Result<Url, AppError> {
        let mut url = self.blob_endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::Config {
                    reason: "blob endpoint cannot be a base URL".to_string(),
                })?;
            segments.pop_if_empty().push(container);
            if let Some(name) = name {
                segments.push(name);
            }
        }
        if let Credential::Sas(sas) = &self.credential {
            let query = match url.query() {
                Some(existing) => format!("{existing}&{sas}"),
                None => sas.clone(),
            };
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    /// Shared Key signature for a request. `ms_headers` must hold every
    /// `x-ms-*` header that will be sent.
    pub fn shared_key_signature(
        &self,
        method: &Method,
        url: &Url,
        content_length: u64,
        content_type: &str,
        ms_headers: &[(&str, &str)],
    ) -> Option<String> {
        let Credential::SharedKey(key) = &self.credential else {
            return None;
        };

        let mut headers: Vec<(String, &str)> = ms_headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.trim()))
            .collect();
        headers.sort_by(|a, b| a.0.cmp(&b.0));
        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();

        let mut canonical_resource = format!("/{}{}", self.account, url.path());
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.into_owned()))
            .collect();
        params.sort();
        for (name, value) in params {
            canonical_resource.push_str(&format!("\n{name}:{value}"));
        }

        let length = if content_length == 0 {
            String::new()
        } else {
            content_length.to_string()
        };
        let string_to_sign = format!(
            "{method}\n\n\n{length}\n\n{content_type}\n\n\n\n\n\n\n{canonical_headers}{canonical_resource}"
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(key).ok()?;
        mac.update(string_to_sign.as_bytes());
        let signature =
            base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());
        Some(format!("SharedKey {}:{}", self.account, signature))
    }
}

fn rfc1123_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Azure Blob Storage over its REST API. Works against Azurite as well.
pub struct AzureBlobStore {
    client: Client,
    connection: AzureConnection,
}

impl AzureBlobStore {
    pub fn from_connection_string(conn: &str, timeout: Duration) -> Result<Self, AppError> {
        let connection = AzureConnection::parse(conn)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::storage)?;
        Ok(Self { client, connection })
    }

    pub fn account(&self) -> &str {
        &self.connection.account
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<(Bytes, &str)>,
        extra_headers: &[(&str, &str)],
    ) -> Result<reqwest::Response, AppError> {
        let date = rfc1123_now();
        let mut ms_headers: Vec<(&str, &str)> = vec![
            ("x-ms-date", date.as_str()),
            ("x-ms-version", AZURE_STORAGE_VERSION),
        ];
        ms_headers.extend_from_slice(extra_headers);

        let (length, content_type) = body
            .as_ref()
            .map(|(data, ct)| (data.len() as u64, *ct))
            .unwrap_or((0, ""));

        let mut request = self.client.request(method.clone(), url.clone());
        for (name, value) in &ms_headers {
            request = request.header(*name, *value);
        }
        if let Some(auth) =
            self.connection
                .shared_key_signature(&method, &url, length, content_type, &ms_headers)
        {
            request = request.header("Authorization", auth);
        }
        request = match body {
            Some((data, ct)) => request.header("Content-Type", ct).body(data),
            None => request.header("Content-Length", 0),
        };

        request.send().await.map_err(AppError::storage)
    }

    fn public_url(url: &Url) -> String {
        let mut url = url.clone();
        url.set_query(None);
        url.to_string()
    }
}

async fn failure(operation: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AppError::Storage {
        reason: format!("{operation} failed with {status}: {body}"),
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    fn kind(&self) -> &'static str {
        "azure"
    }

    #[instrument(skip(self))]
    async fn ensure_container(&self, container: &str) -> Result<(), AppError> {
        let mut url = self.connection.resource_url(container, None)?;
        let query = match url.query() {
            Some(sas) => format!("restype=container&{sas}"),
            None => "restype=container".to_string(),
        };
        url.set_query(Some(&query));

        let response = self.send(Method::PUT, url, None, &[]).await?;
        match response.status() {
            StatusCode::CREATED => {
                info!(container = %container, "Created blob container");
                Ok(())
            }
            StatusCode::CONFLICT => {
                debug!(container = %container, "Blob container already exists");
                Ok(())
            }
            _ => Err(failure("create container", response).await),
        }
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, AppError> {
        let url = self.connection.resource_url(container, Some(name))?;
        let response = self
            .send(
                Method::PUT,
                url.clone(),
                Some((data, content_type)),
                &[("x-ms-blob-type", "BlockBlob")],
            )
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(failure("put blob", response).await);
        }
        Ok(Self::public_url(&url))
    }

    #[instrument(skip(self))]
    async fn get(&self, container: &str, name: &str) -> Result<Option<Bytes>, AppError> {
        let url = self.connection.resource_url(container, Some(name))?;
        let response = self.send(Method::GET, url, None, &[]).await?;
        match response.status() {
            StatusCode::OK => Ok(Some(response.bytes().await.map_err(AppError::storage)?)),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(failure("get blob", response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE: &str = "Mon, 19 Oct 2026 08:00:00 GMT";

    #[test]
    fn development_storage_shortcut() {
        let conn = AzureConnection::parse("UseDevelopmentStorage=true").unwrap();
        assert_eq!(conn.account, "devstoreaccount1");
        assert_eq!(conn.blob_endpoint.as_str(), "http://127.0.0.1:10000/devstoreaccount1");
        assert!(conn.uses_shared_key());
    }

    #[test]
    fn endpoint_is_derived_from_account_and_suffix() {
        let conn = AzureConnection::parse(
            "DefaultEndpointsProtocol=https;AccountName=acme;AccountKey=a2V5;EndpointSuffix=core.windows.net",
        )
        .unwrap();
        assert_eq!(conn.blob_endpoint.as_str(), "https://acme.blob.core.windows.net/");
        let url = conn.resource_url("pdf-uploads", Some("my report.pdf")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://acme.blob.core.windows.net/pdf-uploads/my%20report.pdf"
        );
    }

    #[test]
    fn sas_is_appended_to_urls() {
        let err = AzureConnection::parse(
            "BlobEndpoint=https://acme.blob.core.windows.net/;SharedAccessSignature=?sv=2021&sig=abc",
        )
        .err()
        .unwrap();
        // An endpoint alone does not name the account.
        assert!(err.to_string().contains("AccountName"));

        let conn = AzureConnection::parse(
            "AccountName=acme;BlobEndpoint=https://acme.blob.core.windows.net/;SharedAccessSignature=?sv=2021&sig=abc",
        )
        .unwrap();
        assert!(!conn.uses_shared_key());
        let url = conn.resource_url("pdf-uploads", Some("a.pdf")).unwrap();
        assert_eq!(url.query(), Some("sv=2021&sig=abc"));
        assert!(conn
            .shared_key_signature(&Method::PUT, &url, 1, "application/pdf", &[])
            .is_none());
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = AzureConnection::parse("AccountName=acme").err().unwrap();
        assert!(err.to_string().contains("AccountKey"));
        assert!(AzureConnection::parse("AccountName=acme;AccountKey=***").is_err());
        assert!(AzureConnection::parse("AccountName").is_err());
    }

    #[test]
    fn put_blob_signature_matches_reference() {
        let conn = AzureConnection::parse("UseDevelopmentStorage=true").unwrap();
        let url = conn.resource_url("pdf-uploads", Some("report.pdf")).unwrap();
        let auth = conn
            .shared_key_signature(
                &Method::PUT,
                &url,
                11,
                "application/pdf",
                &[
                    ("x-ms-version", AZURE_STORAGE_VERSION),
                    ("x-ms-date", DATE),
                    ("x-ms-blob-type", "BlockBlob"),
                ],
            )
            .unwrap();
        assert_eq!(
            auth,
            "SharedKey devstoreaccount1:gMEKAWhDEKAFlZrsVIrZAp0pVaBvifyJQesphREAM78="
        );
    }

    #[test]
    fn create_container_signature_includes_query() {
        let conn = AzureConnection::parse("UseDevelopmentStorage=true").unwrap();
        let mut url = conn.resource_url("pdf-uploads", None).unwrap();
        url.set_query(Some("restype=container"));
        let auth = conn
            .shared_key_signature(
                &Method::PUT,
                &url,
                0,
                "",
                &[("x-ms-date", DATE), ("x-ms-version", AZURE_STORAGE_VERSION)],
            )
            .unwrap();
        assert_eq!(
            auth,
            "SharedKey devstoreaccount1:oCqz4wacRs3gLCMQjUozI6fc8x2MbHa1tMsuQVIjEis="
        );
    }
}
