use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use crate::config::{default_config_path, resolve_profile, ConnectionProfile};
use crate::error::JenvizError;
use crate::graph::{build_graph, Graph, TraversalOptions};
use crate::jenkins::JenkinsClient;
use crate::output;
use crate::render::Graphviz;

#[derive(Parser, Debug)]
#[command(name = "jenviz")]
#[command(author, version, about = "Visualize Jenkins jobs", long_about = None)]
pub struct Cli {
    /// Profile file with connection settings [default: ~/.config/jenviz.ini]
    #[arg(short = 'c', long)]
    jenviz_config_file: Option<PathBuf>,

    /// Profile (file section) to load the Jenkins url, user and password from
    #[arg(short = 'p', long)]
    jenviz_config_profile: Option<String>,

    /// The Jenkins url
    #[arg(long, env = "JENKINS_URL", help_heading = "Jenkins")]
    jenkins_url: Option<String>,

    /// The Jenkins username
    #[arg(long, env = "JENKINS_USER", help_heading = "Jenkins")]
    jenkins_user: Option<String>,

    /// The Jenkins password
    #[arg(
        long,
        env = "JENKINS_PASSWORD",
        hide_env_values = true,
        help_heading = "Jenkins"
    )]
    jenkins_password: Option<String>,

    /// Jenkins job name to ignore (repeatable)
    #[arg(long)]
    job_ignore: Vec<String>,

    /// Ignore disabled Jenkins jobs
    #[arg(long, default_value_t = false)]
    job_ignore_disabled: bool,

    /// Ignore Jenkins jobs that have never been built
    #[arg(long, default_value_t = false)]
    job_ignore_nobuild: bool,

    /// The rendered output filename, without the format extension
    #[arg(long, default_value = "jenviz.out")]
    output_file: PathBuf,

    /// The format to render the file to
    #[arg(long, default_value = "pdf")]
    output_format: String,

    /// View the output when done
    #[arg(long, default_value_t = false)]
    output_view: bool,

    /// Graphviz executable used for rendering
    #[arg(long, env = "GRAPHVIZ_DOT", default_value = "dot")]
    dot_binary: PathBuf,

    /// The Jenkins job name
    #[arg(value_name = "job-name")]
    job_name: String,
}

impl Cli {
    /// Connection settings from the named profile, or else from the flags.
    fn connection(&self) -> crate::error::Result<ConnectionProfile> {
        if let Some(profile) = &self.jenviz_config_profile {
            let config_file = self
                .jenviz_config_file
                .clone()
                .unwrap_or_else(default_config_path);
            return resolve_profile(&config_file, profile);
        }

        let url = self.jenkins_url.clone().ok_or_else(|| {
            JenvizError::Config(
                "no Jenkins url given; use --jenkins-url or --jenviz-config-profile".to_string(),
            )
        })?;

        Ok(ConnectionProfile {
            url,
            user: self.jenkins_user.clone(),
            password: self.jenkins_password.clone(),
        })
    }

    fn traversal_options(&self) -> TraversalOptions {
        TraversalOptions {
            ignore: self.job_ignore.iter().cloned().collect(),
            ignore_disabled: self.job_ignore_disabled,
            ignore_nobuild: self.job_ignore_nobuild,
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let connection = self.connection()?;
        info!(
            "Collecting downstream jobs of \"{}\" from {}",
            self.job_name, connection.url
        );

        let client = JenkinsClient::new(&connection)?;
        let mut graph = Graph::new(&self.job_name, "Jenkins jobs");
        build_graph(&client, &mut graph, &self.job_name, &self.traversal_options())
            .await
            .with_context(|| {
                format!("Failed to collect jobs downstream of \"{}\"", self.job_name)
            })?;
        info!(
            "Collected {} jobs and {} dependencies",
            graph.node_count(),
            graph.edge_count()
        );

        let output_path = Graphviz::new(&self.dot_binary)
            .render(&graph, &self.output_file, &self.output_format, self.output_view)
            .await
            .context("Failed to render graph")?;

        output::print_output_path(&output_path);

        Ok(())
    }
}
