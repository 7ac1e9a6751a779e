use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{Backend, ClientError};
use crate::models::query::{DataResponse, UploadResponse};

/// [`Backend`] speaking to the `/api` surface over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base: Url,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpBackend {
    /// `base` points at the API root, e.g. `http://127.0.0.1:3000/api/`.
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            http: reqwest::Client::new(),
            base,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|err| ClientError::Network(format!("invalid endpoint {path}: {err}")))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, ClientError> {
        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.to_string()));
        let response = self
            .http
            .post(self.endpoint("upload")?)
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        decode(response).await
    }

    async fn fetch_page(
        &self,
        session_id: Uuid,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<DataResponse, ClientError> {
        let mut params = vec![
            ("page", page.to_string()),
            ("perPage", per_page.to_string()),
        ];
        if let Some(term) = search.filter(|term| !term.is_empty()) {
            params.push(("search", term.to_string()));
        }
        let response = self
            .http
            .get(self.endpoint(&format!("data/{session_id}"))?)
            .query(&params)
            .send()
            .await
            .map_err(network_error)?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        decode(response).await
    }

    async fn download(&self, session_id: Uuid) -> Result<Vec<u8>, ClientError> {
        let response = self
            .http
            .get(self.endpoint(&format!("download/{session_id}"))?)
            .send()
            .await
            .map_err(network_error)?;
        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(server_error(response).await),
            _ => {
                return Err(match server_error(response).await {
                    ClientError::Server { message, .. } => ClientError::Export(message),
                    other => other,
                })
            }
        }
        let bytes = response.bytes().await.map_err(network_error)?;
        Ok(bytes.to_vec())
    }
}

fn network_error(err: reqwest::Error) -> ClientError {
    debug!("transport failure: {err}");
    ClientError::Network(err.to_string())
}

/// A success status with a body we cannot read is the server's fault, not the network's.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    response.json().await.map_err(|err| {
        if !err.is_decode() {
            return network_error(err);
        }
        debug!("undecodable response body ({status}): {err}");
        ClientError::Server {
            status: status.as_u16(),
            message: format!("Onverwacht antwoord van de server ({status})"),
        }
    })
}

async fn server_error(response: Response) -> ClientError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("Er is een fout opgetreden ({status})"),
    };
    if status == StatusCode::NOT_FOUND {
        ClientError::NotFound(message)
    } else {
        ClientError::Server {
            status: status.as_u16(),
            message,
        }
    }
}
