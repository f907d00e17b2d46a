use async_trait::async_trait;
use common::{OutcomeReport, ReportAck, TaskAssignment, TaskRequest};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::LinkError;
use crate::executor::CoordinatorLink;

/// Enlace HTTP con el coordinador. Cada llamada es un request independiente.
#[derive(Clone)]
pub struct HttpCoordinatorLink {
    client: Client,
    base_url: String,
}

impl HttpCoordinatorLink {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, LinkError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(classify)?
            .error_for_status()
            .map_err(classify)?;

        resp.json::<Resp>().await.map_err(classify)
    }
}

/// Un error al conectar es fatal para el worker; cualquier otro se trata
/// como una llamada fallida.
fn classify(err: reqwest::Error) -> LinkError {
    if err.is_connect() {
        LinkError::Unreachable(err.to_string())
    } else {
        LinkError::CallFailed(err.to_string())
    }
}

#[async_trait]
impl CoordinatorLink for HttpCoordinatorLink {
    async fn request_task(&self) -> Result<TaskAssignment, LinkError> {
        self.call("/api/v1/tasks/request", &TaskRequest::new()).await
    }

    async fn report(&self, report: OutcomeReport) -> Result<(), LinkError> {
        let _: ReportAck = self.call("/api/v1/tasks/report", &report).await?;
        Ok(())
    }
}
