use std::path::{Path, PathBuf};

use log::{debug, info};
use tokio::process::Command;

use crate::error::{JenvizError, Result};
use crate::graph::Graph;

/// Renders graphs with the Graphviz `dot` executable.
pub struct Graphviz {
    dot_binary: PathBuf,
}

impl Graphviz {
    pub fn new(dot_binary: impl Into<PathBuf>) -> Self {
        Self {
            dot_binary: dot_binary.into(),
        }
    }

    /// Writes the DOT source to `stem` and renders it to `<stem>.<format>`.
    ///
    /// With `view` set, the rendered file is handed to the platform's default
    /// viewer without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be written, `dot` cannot be
    /// started or exits unsuccessfully (e.g. for an unknown format), or the
    /// viewer cannot be launched.
    pub async fn render(
        &self,
        graph: &Graph,
        stem: &Path,
        format: &str,
        view: bool,
    ) -> Result<PathBuf> {
        tokio::fs::write(stem, graph.to_dot()).await?;
        debug!(
            "DOT source for \"{}\" written to {}",
            graph.name(),
            stem.display()
        );

        let output_path = output_path(stem, format);
        let output = Command::new(&self.dot_binary)
            .arg(format!("-T{format}"))
            .arg("-o")
            .arg(&output_path)
            .arg(stem)
            .output()
            .await
            .map_err(|e| {
                JenvizError::Render(format!(
                    "failed to run {}: {e}",
                    self.dot_binary.display()
                ))
            })?;

        if !output.status.success() {
            return Err(JenvizError::Render(format!(
                "{} exited with {}: {}",
                self.dot_binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!("Rendered {}", output_path.display());

        if view {
            open_in_viewer(&output_path)?;
        }

        Ok(output_path)
    }
}

/// `<stem>.<format>`, appended rather than replacing any extension of `stem`.
pub fn output_path(stem: &Path, format: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(format);
    PathBuf::from(path)
}

fn open_in_viewer(path: &Path) -> Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    };

    command
        .arg(path)
        .spawn()
        .map_err(|e| JenvizError::Render(format!("failed to open {}: {e}", path.display())))?;
    Ok(())
}
