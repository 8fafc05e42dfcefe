use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ConnectionProfile;
use crate::error::{JenvizError, Result};

use super::types::{Build, Job};
use super::JenkinsApi;

/// HTTP client for the Jenkins JSON API.
pub struct JenkinsClient {
    client: Client,
    base_url: Url,
    user: Option<String>,
    password: Option<String>,
}

impl JenkinsClient {
    /// Creates a client for the server described by `profile`.
    ///
    /// Requests use HTTP basic authentication when a user is set and are
    /// anonymous otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or the HTTP client cannot be built.
    pub fn new(profile: &ConnectionProfile) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("jenviz/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JenvizError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(&profile.url)
            .map_err(|e| JenvizError::Config(format!("Invalid Jenkins URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(JenvizError::Config(format!(
                "Invalid Jenkins URL: {}",
                profile.url
            )));
        }

        Ok(Self {
            client,
            base_url,
            user: profile.user.clone(),
            password: profile.password.clone(),
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(user) = &self.user {
            request.basic_auth(user, self.password.as_ref())
        } else {
            request
        }
    }

    /// Builds `<base>/job/<a>/job/<b>/<extra...>/api/json?depth=0` for job `a/b`.
    fn api_url(&self, job_name: &str, extra: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                JenvizError::Config(format!("Invalid Jenkins URL: {}", self.base_url))
            })?;
            segments.pop_if_empty();
            for part in job_name.split('/').filter(|part| !part.is_empty()) {
                segments.push("job").push(part);
            }
            segments.extend(extra).push("api").push("json");
        }
        url.set_query(Some("depth=0"));
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {url}");

        let response = self
            .auth_request(self.client.get(url.clone()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(JenvizError::ApiError {
                status: status.as_u16(),
                url: url.to_string(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl JenkinsApi for JenkinsClient {
    async fn get_job_info(&self, name: &str) -> Result<Job> {
        let url = self.api_url(name, &[])?;
        self.get_json(url).await
    }

    async fn get_build_info(&self, job_name: &str, number: u64) -> Result<Build> {
        let number = number.to_string();
        let url = self.api_url(job_name, &[number.as_str()])?;
        self.get_json(url).await
    }
}
