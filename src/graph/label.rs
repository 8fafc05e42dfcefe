use std::fmt;

use crate::error::Result;
use crate::jenkins::{Action, Build, JenkinsApi, Job};

const FONT_SIZE_SMALL: u32 = 11;

/// Graphviz HTML-like label markup for one job node.
///
/// Holds the bare `<TABLE>` element; the DOT writer supplies the enclosing
/// `<...>` delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label(String);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub fn from_markup(markup: &str) -> Self {
        Self(markup.to_string())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the label for `job`.
///
/// The label shows the job name (marked and shaded when disabled), its class,
/// and its parameters: the values of the last build when there is one,
/// otherwise the declared parameter names.
///
/// # Errors
///
/// Returns an error if the last build cannot be fetched.
pub async fn format_label<C: JenkinsApi>(client: &C, job: &Job) -> Result<Label> {
    let build = match job.last_build {
        Some(build_ref) => Some(client.get_build_info(&job.name, build_ref.number).await?),
        None => None,
    };

    Ok(render_label(job, build.as_ref()))
}

fn render_label(job: &Job, last_build: Option<&Build>) -> Label {
    let disabled = job.is_disabled();
    let bgcolor = if disabled { r#" BGCOLOR="grey""# } else { "" };
    let suffix = if disabled { " (disabled)" } else { "" };

    let mut html = format!(r#"<TABLE BORDER="0" CELLBORDER="1" CELLSPACING="0"{bgcolor}>"#);
    html.push_str(&format!(
        r#"<TR><TD HREF="{}">{}{suffix}</TD></TR>"#,
        escape(&job.url),
        escape(&job.name)
    ));
    html.push_str(&small_row(&escape(&job.class)));
    match last_build {
        Some(build) => html.push_str(&build_parameters(build)),
        None => html.push_str(&declared_parameters(job)),
    }
    html.push_str("</TABLE>");

    Label(html)
}

/// Parameter values of a build, or nothing if it was not parameterized.
fn build_parameters(build: &Build) -> String {
    let mut found = false;
    let mut rows = String::new();
    for params in build.actions.iter().filter_map(|action| match action {
        Action::ParameterValues(params) => Some(params),
        _ => None,
    }) {
        found = true;
        for param in params {
            rows.push_str(&small_row(&format!(
                "{}: {}",
                escape(&param.name),
                escape(&param.display_value())
            )));
        }
    }

    if !found {
        return String::new();
    }

    format!(
        r#"<TR><TD HREF="{}"><FONT POINT-SIZE="{FONT_SIZE_SMALL}"><B>Parameters (build #{}, {})</B></FONT></TD></TR>{rows}"#,
        escape(&build.url),
        build.number,
        escape(build.result_label())
    )
}

/// Declared parameter names of a job that has never been built.
fn declared_parameters(job: &Job) -> String {
    let mut found = false;
    let mut rows = String::new();
    for definitions in job.actions.iter().filter_map(|action| match action {
        Action::ParameterDefinitions(definitions) => Some(definitions),
        _ => None,
    }) {
        found = true;
        for definition in definitions {
            rows.push_str(&small_row(&escape(&definition.name)));
        }
    }

    if !found {
        return String::new();
    }

    format!(
        r#"<TR><TD><FONT POINT-SIZE="{FONT_SIZE_SMALL}"><B>Parameters (no build yet)</B></FONT></TD></TR>{rows}"#
    )
}

fn small_row(content: &str) -> String {
    format!(r#"<TR><TD><FONT POINT-SIZE="{FONT_SIZE_SMALL}">{content}</FONT></TD></TR>"#)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
