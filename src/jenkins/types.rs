use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Status color Jenkins reports for a job that has never been built.
pub const COLOR_NOT_BUILT: &str = "notbuilt";

const PARAMETERS_ACTION: &str = "hudson.model.ParametersAction";
const PARAMETERS_DEFINITION_PROPERTY: &str = "hudson.model.ParametersDefinitionProperty";

/// A Jenkins job as returned by `GET /job/<name>/api/json`.
///
/// Only the fields the graph needs are modelled. Optional fields tolerate
/// both absence and `null`, since folders, pipelines and freestyle jobs all
/// report slightly different shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Implementation class (e.g. `hudson.model.FreeStyleProject`)
    #[serde(rename = "_class", default)]
    pub class: String,
    /// Job name, unique within its folder
    pub name: String,
    /// Web URL of the job
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    disabled: Option<bool>,
    /// Status color token (e.g. "blue", "red", "notbuilt")
    #[serde(default)]
    pub color: Option<String>,
    /// Most recent build, absent when the job never ran
    #[serde(default)]
    pub last_build: Option<BuildRef>,
    /// Jobs triggered by this one
    #[serde(default)]
    pub downstream_projects: Vec<JobRef>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Job {
    /// Whether Jenkins flags the job as disabled; a missing flag means enabled.
    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }

    /// Whether the job's status color marks it as never built.
    pub fn is_not_built(&self) -> bool {
        self.color.as_deref() == Some(COLOR_NOT_BUILT)
    }
}

/// A by-name reference to another job, as listed in `downstreamProjects`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRef {
    pub name: String,
}

/// A by-number reference to a build, as found in `lastBuild`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BuildRef {
    pub number: u64,
}

/// A single Jenkins build as returned by `GET /job/<name>/<number>/api/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Build {
    pub number: u64,
    /// Final result (e.g. "SUCCESS"); `None` while the build is running
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Build {
    pub fn result_label(&self) -> &str {
        self.result.as_deref().unwrap_or("BUILDING")
    }
}

/// An entry of a job's or build's `actions` list.
///
/// Jenkins mixes dozens of action classes (and empty `{}` placeholders) in
/// this list; only the two parameter-bearing classes are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `hudson.model.ParametersAction`, attached to builds
    ParameterValues(Vec<ParameterValue>),
    /// `hudson.model.ParametersDefinitionProperty`, attached to jobs
    ParameterDefinitions(Vec<ParameterDefinition>),
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParameterValue {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
}

impl ParameterValue {
    /// Value as shown to users: strings verbatim, nothing for absent values
    /// (e.g. password parameters), JSON text otherwise.
    pub fn display_value(&self) -> String {
        match &self.value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let class = fields
            .get("_class")
            .and_then(Value::as_str)
            .map(str::to_string);

        // Payload keys are only read once the class is known; other plugins
        // reuse the same key names with unrelated shapes.
        let action = match class.as_deref() {
            Some(PARAMETERS_ACTION) => Self::ParameterValues(take_list(&mut fields, "parameters")?),
            Some(PARAMETERS_DEFINITION_PROPERTY) => {
                Self::ParameterDefinitions(take_list(&mut fields, "parameterDefinitions")?)
            }
            _ => Self::Other,
        };
        Ok(action)
    }
}

fn take_list<T: DeserializeOwned, E: de::Error>(
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<Vec<T>, E> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value).map_err(E::custom),
    }
}
