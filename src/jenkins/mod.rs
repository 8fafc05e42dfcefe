mod client;
mod types;

pub use client::JenkinsClient;
pub use types::{Action, Build, Job};

use crate::error::Result;

/// Read-only access to the parts of the Jenkins API the graph needs.
///
/// Implemented over HTTP by [`JenkinsClient`]; tests substitute an in-memory
/// server.
#[allow(async_fn_in_trait)]
pub trait JenkinsApi {
    /// Fetch a job record by its full name (folder segments joined by `/`).
    async fn get_job_info(&self, name: &str) -> Result<Job>;

    /// Fetch one build of a job.
    async fn get_build_info(&self, job_name: &str, number: u64) -> Result<Build>;
}
