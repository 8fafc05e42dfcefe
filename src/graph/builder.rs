use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::error::Result;
use crate::jenkins::{JenkinsApi, Job};

use super::label::format_label;
use super::Graph;

/// Which downstream jobs to leave out of the graph.
///
/// A skipped job gets neither a node nor an edge, and nothing below it is
/// visited through that path.
#[derive(Debug, Clone, Default)]
pub struct TraversalOptions {
    /// Job names to skip
    pub ignore: HashSet<String>,
    /// Skip jobs Jenkins reports as disabled
    pub ignore_disabled: bool,
    /// Skip jobs that have never been built
    pub ignore_nobuild: bool,
}

/// Pending work for the depth-first walk.
enum Step {
    /// Label the job and queue its downstream projects.
    Visit(Job),
    /// Decide whether a downstream project of `upstream` belongs in the graph.
    Inspect { upstream: String, downstream: String },
    /// Draw the edge once the downstream subtree is done.
    Link { upstream: String, downstream: String },
}

/// Populates `graph` with `root` and everything downstream of it.
///
/// Jobs are walked depth-first in the order Jenkins lists their downstream
/// projects, and each edge is added after the subtree below it. Every job is
/// fetched and labeled once; reaching it again (through a second upstream or
/// a cycle) only adds the edge.
///
/// # Errors
///
/// Any failed Jenkins request aborts the walk. Jobs added before the failure
/// stay in `graph`.
pub async fn build_graph<C: JenkinsApi>(
    client: &C,
    graph: &mut Graph,
    root: &str,
    options: &TraversalOptions,
) -> Result<()> {
    let mut visited: HashMap<String, Job> = HashMap::new();
    let mut stack = vec![Step::Visit(client.get_job_info(root).await?)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Visit(job) => {
                debug!("Visiting job \"{}\"", job.name);
                let label = format_label(client, &job).await?;
                graph.add_node(&job.name, label);

                // Reversed so the first listed project is popped first.
                stack.extend(job.downstream_projects.iter().rev().map(|downstream| {
                    Step::Inspect {
                        upstream: job.name.clone(),
                        downstream: downstream.name.clone(),
                    }
                }));
                visited.insert(job.name.clone(), job);
            }
            Step::Inspect {
                upstream,
                downstream,
            } => {
                if options.ignore.contains(&downstream) {
                    info!("job \"{downstream}\" in ignore list. skipping ...");
                    continue;
                }

                if let Some(job) = visited.get(&downstream) {
                    if admit(job, options) {
                        graph.add_edge(&upstream, &job.name);
                    }
                    continue;
                }

                let job = client.get_job_info(&downstream).await?;
                if !admit(&job, options) {
                    continue;
                }
                stack.push(Step::Link {
                    upstream,
                    downstream: job.name.clone(),
                });
                stack.push(Step::Visit(job));
            }
            Step::Link {
                upstream,
                downstream,
            } => {
                debug!("Adding edge \"{upstream}\" -> \"{downstream}\"");
                graph.add_edge(&upstream, &downstream);
            }
        }
    }

    Ok(())
}

/// Applies the disabled and never-built filters to a fetched job.
fn admit(job: &Job, options: &TraversalOptions) -> bool {
    if options.ignore.contains(&job.name) {
        info!("job \"{}\" in ignore list. skipping ...", job.name);
        return false;
    }
    if options.ignore_disabled && job.is_disabled() {
        info!("job \"{}\" disabled. skipping ...", job.name);
        return false;
    }
    // Never-built jobs are dropped without a notice.
    !(options.ignore_nobuild && job.is_not_built())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JenvizError;
    use crate::jenkins::Build;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    /// In-memory Jenkins keyed by job name, recording every job lookup.
    #[derive(Default)]
    struct FakeJenkins {
        jobs: HashMap<String, Value>,
        builds: HashMap<(String, u64), Value>,
        lookups: RefCell<Vec<String>>,
    }

    impl FakeJenkins {
        fn job(mut self, name: &str, downstream: &[&str], extra: Value) -> Self {
            let mut value = json!({
                "_class": "hudson.model.FreeStyleProject",
                "name": name,
                "url": format!("https://ci/job/{name}/"),
                "color": "blue",
                "downstreamProjects": downstream
                    .iter()
                    .map(|d| json!({"name": d}))
                    .collect::<Vec<_>>(),
            });
            if let (Value::Object(base), Value::Object(extra)) = (&mut value, extra) {
                base.extend(extra);
            }
            self.jobs.insert(name.to_string(), value);
            self
        }

        fn build(mut self, name: &str, number: u64, value: Value) -> Self {
            self.builds.insert((name.to_string(), number), value);
            self
        }

        fn lookups_of(&self, name: &str) -> usize {
            self.lookups.borrow().iter().filter(|n| *n == name).count()
        }
    }

    impl JenkinsApi for FakeJenkins {
        async fn get_job_info(&self, name: &str) -> Result<Job> {
            self.lookups.borrow_mut().push(name.to_string());
            let value = self.jobs.get(name).ok_or_else(|| JenvizError::ApiError {
                status: 404,
                url: format!("https://ci/job/{name}/api/json"),
                message: "Not Found".to_string(),
            })?;
            Ok(serde_json::from_value(value.clone())?)
        }

        async fn get_build_info(&self, job_name: &str, number: u64) -> Result<Build> {
            let value = self
                .builds
                .get(&(job_name.to_string(), number))
                .ok_or_else(|| JenvizError::ApiError {
                    status: 404,
                    url: format!("https://ci/job/{job_name}/{number}/api/json"),
                    message: "Not Found".to_string(),
                })?;
            Ok(serde_json::from_value(value.clone())?)
        }
    }

    async fn run(jenkins: &FakeJenkins, root: &str, options: &TraversalOptions) -> Graph {
        let mut graph = Graph::new(root, "Jenkins jobs");
        build_graph(jenkins, &mut graph, root, options).await.unwrap();
        graph
    }

    fn node_names(graph: &Graph) -> Vec<&str> {
        graph.nodes().map(|(id, _)| id).collect()
    }

    fn edge_list(graph: &Graph) -> Vec<(&str, &str)> {
        graph.edges().collect()
    }

    struct NoticeLogger;

    thread_local! {
        static NOTICES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    impl log::Log for NoticeLogger {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Info
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                NOTICES.with(|notices| notices.borrow_mut().push(record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static NOTICE_LOGGER: NoticeLogger = NoticeLogger;

    /// Records info-level messages logged on the current thread.
    fn capture_notices() {
        let _ = log::set_logger(&NOTICE_LOGGER);
        log::set_max_level(log::LevelFilter::Info);
        NOTICES.with(|notices| notices.borrow_mut().clear());
    }

    fn take_notices() -> Vec<String> {
        NOTICES.with(RefCell::take)
    }

    fn ignoring(names: &[&str]) -> TraversalOptions {
        TraversalOptions {
            ignore: names.iter().map(|n| (*n).to_string()).collect(),
            ..TraversalOptions::default()
        }
    }

    #[tokio::test]
    async fn test_single_job_without_downstream() {
        let jenkins = FakeJenkins::default().job("a", &[], json!({}));

        let graph = run(&jenkins, "a", &TraversalOptions::default()).await;

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.node("a").is_some());
    }

    #[tokio::test]
    async fn test_linear_chain() {
        let jenkins = FakeJenkins::default()
            .job("a", &["b"], json!({}))
            .job("b", &["c"], json!({}))
            .job("c", &[], json!({}));

        let graph = run(&jenkins, "a", &TraversalOptions::default()).await;

        assert_eq!(node_names(&graph), vec!["a", "b", "c"]);
        assert_eq!(edge_list(&graph), vec![("b", "c"), ("a", "b")]);
    }

    #[tokio::test]
    async fn test_depth_first_in_listed_order() {
        let jenkins = FakeJenkins::default()
            .job("root", &["left", "right"], json!({}))
            .job("left", &["leaf"], json!({}))
            .job("right", &[], json!({}))
            .job("leaf", &[], json!({}));

        let graph = run(&jenkins, "root", &TraversalOptions::default()).await;

        assert_eq!(node_names(&graph), vec!["root", "left", "leaf", "right"]);
        assert_eq!(
            edge_list(&graph),
            vec![("left", "leaf"), ("root", "left"), ("root", "right")]
        );
    }

    #[tokio::test]
    async fn test_ignored_job_and_its_subtree_are_skipped() {
        let jenkins = FakeJenkins::default()
            .job("a", &["b", "d"], json!({}))
            .job("b", &["c"], json!({}))
            .job("c", &[], json!({}))
            .job("d", &[], json!({}));

        let graph = run(&jenkins, "a", &ignoring(&["b"])).await;

        assert_eq!(node_names(&graph), vec!["a", "d"]);
        assert_eq!(edge_list(&graph), vec![("a", "d")]);
        assert_eq!(jenkins.lookups_of("b"), 0);
        assert_eq!(jenkins.lookups_of("c"), 0);
    }

    #[tokio::test]
    async fn test_disabled_job_kept_by_default() {
        let jenkins = FakeJenkins::default()
            .job("a", &["b"], json!({}))
            .job("b", &[], json!({"disabled": true, "color": "disabled"}));

        let graph = run(&jenkins, "a", &TraversalOptions::default()).await;

        let label = graph.node("b").unwrap().label.as_str();
        assert!(label.contains(r#"BGCOLOR="grey""#));
        assert!(label.contains("b (disabled)"));
        assert_eq!(edge_list(&graph), vec![("a", "b")]);
    }

    #[tokio::test]
    async fn test_disabled_job_skipped_when_requested() {
        let jenkins = FakeJenkins::default()
            .job("a", &["b"], json!({}))
            .job("b", &["c"], json!({"disabled": true}))
            .job("c", &[], json!({}));
        let options = TraversalOptions {
            ignore_disabled: true,
            ..TraversalOptions::default()
        };

        let graph = run(&jenkins, "a", &options).await;

        assert_eq!(node_names(&graph), vec!["a"]);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(jenkins.lookups_of("c"), 0);
    }

    #[tokio::test]
    async fn test_never_built_job_skipped_only_when_requested() {
        let jenkins = FakeJenkins::default()
            .job("a", &["b"], json!({}))
            .job("b", &[], json!({"color": "notbuilt"}));

        let graph = run(&jenkins, "a", &TraversalOptions::default()).await;
        assert_eq!(node_names(&graph), vec!["a", "b"]);

        let options = TraversalOptions {
            ignore_nobuild: true,
            ..TraversalOptions::default()
        };
        let graph = run(&jenkins, "a", &options).await;
        assert_eq!(node_names(&graph), vec!["a"]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_skip_notices_only_for_ignored_and_disabled_jobs() {
        capture_notices();
        let jenkins = FakeJenkins::default()
            .job("a", &["nightly", "legacy", "fresh", "b"], json!({}))
            .job("nightly", &[], json!({}))
            .job("legacy", &[], json!({"disabled": true}))
            .job("fresh", &[], json!({"color": "notbuilt"}))
            .job("b", &[], json!({}));
        let options = TraversalOptions {
            ignore: HashSet::from(["nightly".to_string()]),
            ignore_disabled: true,
            ignore_nobuild: true,
        };

        let graph = run(&jenkins, "a", &options).await;
        let notices = take_notices();

        assert_eq!(node_names(&graph), vec!["a", "b"]);
        assert_eq!(
            notices,
            vec![
                r#"job "nightly" in ignore list. skipping ..."#.to_string(),
                r#"job "legacy" disabled. skipping ..."#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_shared_downstream_fetched_once() {
        let jenkins = FakeJenkins::default()
            .job("a", &["b", "c"], json!({}))
            .job("b", &["d"], json!({}))
            .job("c", &["d"], json!({}))
            .job("d", &["e"], json!({}))
            .job("e", &[], json!({}));

        let graph = run(&jenkins, "a", &TraversalOptions::default()).await;

        assert_eq!(graph.node_count(), 5);
        assert_eq!(
            edge_list(&graph),
            vec![("d", "e"), ("b", "d"), ("a", "b"), ("c", "d"), ("a", "c")]
        );
        assert_eq!(jenkins.lookups_of("d"), 1);
        assert_eq!(jenkins.lookups_of("e"), 1);
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let jenkins = FakeJenkins::default()
            .job("a", &["b"], json!({}))
            .job("b", &["a"], json!({}));

        let graph = run(&jenkins, "a", &TraversalOptions::default()).await;

        assert_eq!(node_names(&graph), vec!["a", "b"]);
        assert_eq!(edge_list(&graph), vec![("b", "a"), ("a", "b")]);
        assert_eq!(jenkins.lookups_of("a"), 1);
    }

    #[tokio::test]
    async fn test_cycle_back_to_disabled_root_respects_filter() {
        let jenkins = FakeJenkins::default()
            .job("a", &["b"], json!({"disabled": true}))
            .job("b", &["a"], json!({}));
        let options = TraversalOptions {
            ignore_disabled: true,
            ..TraversalOptions::default()
        };

        let graph = run(&jenkins, "a", &options).await;

        assert_eq!(node_names(&graph), vec!["a", "b"]);
        assert_eq!(edge_list(&graph), vec![("a", "b")]);
    }

    #[tokio::test]
    async fn test_labels_include_build_parameters() {
        let jenkins = FakeJenkins::default()
            .job("a", &[], json!({"lastBuild": {"number": 5}}))
            .build(
                "a",
                5,
                json!({
                    "number": 5,
                    "result": "SUCCESS",
                    "url": "https://ci/job/a/5/",
                    "actions": [{"_class": "hudson.model.ParametersAction",
                                 "parameters": [{"name": "ENV", "value": "qa"}]}]
                }),
            );

        let graph = run(&jenkins, "a", &TraversalOptions::default()).await;

        let label = graph.node("a").unwrap().label.as_str();
        assert!(label.contains("Parameters (build #5, SUCCESS)"));
        assert!(label.contains("ENV: qa"));
    }

    #[tokio::test]
    async fn test_missing_downstream_aborts() {
        let jenkins = FakeJenkins::default().job("a", &["ghost"], json!({}));
        let mut graph = Graph::new("a", "Jenkins jobs");

        let result = build_graph(&jenkins, &mut graph, "a", &TraversalOptions::default()).await;

        assert!(matches!(result, Err(JenvizError::ApiError { status: 404, .. })));
        assert_eq!(node_names(&graph), vec!["a"]);
    }
}
