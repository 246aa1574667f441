//! HTTP clients for the merge service and the category publisher.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response,
};
use shared::{
    domain::UnifiedRecord,
    error::{ApiException, ErrorCode},
    protocol::{
        CreateCategoryRequest, CreateCategoryResponse, MergeFilesResponse, PublishReceipt,
        CATEGORY_NAME_FIELD,
    },
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{state::SourceFile, CategoryPublisher, MergeService};

/// Joins `path` onto `base` without dropping any path prefix already on `base`.
pub fn endpoint_url(base: &str, path: &str) -> Result<Url> {
    let base = base.trim();
    if base.is_empty() {
        bail!("service url must not be empty");
    }
    let mut base = Url::parse(base).with_context(|| format!("invalid service url: {base}"))?;
    if base.cannot_be_a_base() {
        bail!("service url cannot carry a path: {base}");
    }
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim().trim_start_matches('/'))
        .with_context(|| format!("invalid endpoint path: {path}"))
}

fn authorize(request: RequestBuilder, bearer_token: Option<&str>) -> RequestBuilder {
    match bearer_token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

fn checked(response: Response, service: &str) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        warn!(service, %status, "collaborator returned error status");
        return Err(ApiException::new(
            ErrorCode::ServerStatus,
            format!("{service} returned HTTP {status}"),
        )
        .into());
    }
    Ok(response)
}

pub struct HttpMergeService {
    http: Client,
    endpoint: Url,
    bearer_token: Option<String>,
}

impl HttpMergeService {
    pub fn new(endpoint: Url, bearer_token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            bearer_token,
        }
    }

    fn file_part(file: &SourceFile) -> Part {
        Part::bytes(file.payload.to_vec()).file_name(file.name.clone())
    }
}

#[async_trait]
impl MergeService for HttpMergeService {
    async fn merge(
        &self,
        category_name: &str,
        file_a: &SourceFile,
        file_b: &SourceFile,
    ) -> Result<Vec<UnifiedRecord>> {
        let form = Form::new()
            .text(CATEGORY_NAME_FIELD, category_name.to_string())
            .part(file_a.slot.form_field(), Self::file_part(file_a))
            .part(file_b.slot.form_field(), Self::file_part(file_b));

        debug!(endpoint = %self.endpoint, category_name, "submitting merge request");
        let request = self.http.post(self.endpoint.clone()).multipart(form);
        let response = authorize(request, self.bearer_token.as_deref())
            .send()
            .await
            .with_context(|| format!("failed to reach merge service at {}", self.endpoint))?;
        let body: MergeFilesResponse = checked(response, "merge service")?
            .json()
            .await
            .context("invalid merge service response")?;

        let records = body.into_result().map_err(ApiException::from)?;
        info!(category_name, records = records.len(), "merge service returned records");
        Ok(records)
    }
}

pub struct HttpCategoryPublisher {
    http: Client,
    endpoint: Url,
    bearer_token: Option<String>,
}

impl HttpCategoryPublisher {
    pub fn new(endpoint: Url, bearer_token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            bearer_token,
        }
    }
}

#[async_trait]
impl CategoryPublisher for HttpCategoryPublisher {
    async fn publish(
        &self,
        category_name: &str,
        records: &[UnifiedRecord],
    ) -> Result<PublishReceipt> {
        let payload = CreateCategoryRequest {
            category_name: category_name.to_string(),
            student_data: records.to_vec(),
        };

        debug!(endpoint = %self.endpoint, category_name, records = records.len(), "publishing category");
        let request = self.http.post(self.endpoint.clone()).json(&payload);
        let response = authorize(request, self.bearer_token.as_deref())
            .send()
            .await
            .with_context(|| format!("failed to reach category publisher at {}", self.endpoint))?;
        let body: CreateCategoryResponse = checked(response, "category publisher")?
            .json()
            .await
            .context("invalid category publisher response")?;

        Ok(body.into_result().map_err(ApiException::from)?)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
