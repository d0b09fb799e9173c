/*!
gcloud command construction and execution.

  GcloudCommand::for_request(req, now) -> tokens for one validated request
  execute(runner, req)                 -> run once, parse into a Payload
  runner::{CommandRunner, ProcessRunner, ExecOutput, ExecError}
  preflight::{verify, default_project}

Commands are token vectors handed straight to the child process; nothing is
passed through a shell. `Display` renders a shell-quoted form for logs.
*/

pub mod preflight;
pub mod runner;

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::ToolError;
use crate::ops::AssetRequest;

pub use preflight::{default_project, verify};
pub use runner::{CommandRunner, ExecError, ExecOutput, GcloudBinary, ProcessRunner};

/// Program name shown when a command is rendered.
pub const PROGRAM: &str = "gcloud";

/// Output format requested from gcloud.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    Json,
}

/// Tokens following the program name for one gcloud invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GcloudCommand {
    args: Vec<String>,
}

impl GcloudCommand {
    pub fn new<I, S>(subcommand: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: subcommand.into_iter().map(Into::into).collect(),
        }
    }

    /// Append `--name=value`.
    pub fn flag(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.args.push(format!("--{name}={value}"));
        self
    }

    /// Append `--name=value` when `value` is present and non-empty.
    pub fn opt_flag(self, name: &str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.flag(name, v),
            None => self,
        }
    }

    /// Append a bare `--name`.
    pub fn switch(mut self, name: &str) -> Self {
        self.args.push(format!("--{name}"));
        self
    }

    pub fn format(self, format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => self.flag("format", "json"),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Build the command for a validated request. `now` is only read by
    /// `list_assets` with `snapshot` set.
    pub fn for_request(request: &AssetRequest, now: DateTime<Utc>) -> Self {
        match request {
            AssetRequest::ListAssets(a) => {
                let mut cmd = Self::new(["asset", "list"]).opt_flag("project", a.project.as_deref());
                if !a.asset_types.is_empty() {
                    cmd = cmd.flag("asset-types", a.asset_types.join(","));
                }
                cmd = cmd
                    .flag("content-type", &a.content_type)
                    .flag("page-size", a.page_size);
                if a.snapshot {
                    cmd = cmd.flag(
                        "snapshot-time",
                        now.to_rfc3339_opts(SecondsFormat::Millis, true),
                    );
                }
                cmd.format(OutputFormat::Json)
            }
            AssetRequest::SearchAssets(a) => {
                let scope = a
                    .project
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .map(|p| format!("projects/{p}"));
                Self::new(["asset", "search-all-resources"])
                    .flag("query", &a.query)
                    .opt_flag("scope", scope.as_deref())
                    .flag("page-size", a.page_size)
                    .format(OutputFormat::Json)
            }
            AssetRequest::GetAssetHistory(a) => Self::new(["asset", "get-history"])
                .flag("asset-names", &a.asset_name)
                .opt_flag("project", a.project.as_deref())
                .opt_flag("start-time", a.start_time.as_deref())
                .opt_flag("end-time", a.end_time.as_deref())
                .flag("content-type", &a.content_type)
                .format(OutputFormat::Json),
            AssetRequest::GetProjects => Self::new(["projects", "list"]).format(OutputFormat::Json),
            AssetRequest::GetServices(a) => Self::new(["services", "list"])
                .switch("enabled")
                .opt_flag("project", a.project.as_deref())
                .format(OutputFormat::Json),
            AssetRequest::GetCurrentProject => Self::new(["config", "get-value", "project"]),
        }
    }
}

impl fmt::Display for GcloudCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = std::iter::once(PROGRAM).chain(self.args.iter().map(String::as_str));
        f.write_str(&shell_words::join(tokens))
    }
}

/// Successful result of one call.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Text handed back to the MCP caller.
    pub fn render(&self) -> String {
        match self {
            Payload::Json(v) => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
            Payload::Text(s) => s.clone(),
        }
    }
}

/// Build, run and parse one request. Single attempt, no retries.
pub async fn execute(runner: &dyn CommandRunner, request: &AssetRequest) -> Result<Payload, ToolError> {
    let operation = request.operation();
    let command = GcloudCommand::for_request(request, Utc::now());
    tracing::debug!(%operation, command = %command, "running gcloud");

    let output = runner
        .run(&command)
        .await
        .and_then(ExecOutput::into_success)
        .map_err(|e| ToolError::execution(operation, e))?;

    if !output.stderr.trim().is_empty() {
        tracing::warn!(%operation, stderr = %output.stderr.trim(), "gcloud wrote diagnostics");
    }

    if operation.expects_json() {
        serde_json::from_str(&output.stdout)
            .map(Payload::Json)
            .map_err(|e| ToolError::execution(operation, ExecError::Parse(e)))
    } else {
        Ok(Payload::Text(output.stdout.trim().to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ops::request::{AssetHistoryArgs, ListAssetsArgs, SearchAssetsArgs, ServicesArgs};
    use crate::ops::{AssetRequest, Operation};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Runner returning a canned output and recording every command it sees.
    pub(crate) struct FakeRunner {
        result: Box<dyn Fn() -> Result<ExecOutput, ExecError> + Send + Sync>,
        pub seen: Mutex<Vec<GcloudCommand>>,
    }

    impl FakeRunner {
        pub(crate) fn ok(stdout: &str) -> Self {
            Self::with_output(ExecOutput::new(true, stdout, ""))
        }

        pub(crate) fn with_output(out: ExecOutput) -> Self {
            Self {
                result: Box::new(move || Ok(out.clone())),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn spawn_error() -> Self {
            Self {
                result: Box::new(|| {
                    Err(ExecError::Spawn {
                        program: "gcloud".into(),
                        source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
                    })
                }),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn commands(&self) -> Vec<GcloudCommand> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, command: &GcloudCommand) -> Result<ExecOutput, ExecError> {
            self.seen.lock().unwrap().push(command.clone());
            (self.result)()
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-06T07:08:09.123Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn list(args: ListAssetsArgs) -> Vec<String> {
        GcloudCommand::for_request(&AssetRequest::ListAssets(args), now()).args().to_vec()
    }

    fn base_list() -> ListAssetsArgs {
        ListAssetsArgs {
            content_type: "RESOURCE".into(),
            page_size: 100,
            ..Default::default()
        }
    }

    #[test]
    fn list_assets_minimal() {
        assert_eq!(
            list(base_list()),
            vec![
                "asset",
                "list",
                "--content-type=RESOURCE",
                "--page-size=100",
                "--format=json"
            ]
        );
    }

    #[test]
    fn list_assets_all_flags_in_order() {
        let args = ListAssetsArgs {
            project: Some("demo".into()),
            asset_types: vec![
                "compute.googleapis.com/Instance".into(),
                "storage.googleapis.com/Bucket".into(),
            ],
            content_type: "IAM_POLICY".into(),
            page_size: 25,
            snapshot: true,
        };
        assert_eq!(
            list(args),
            vec![
                "asset",
                "list",
                "--project=demo",
                "--asset-types=compute.googleapis.com/Instance,storage.googleapis.com/Bucket",
                "--content-type=IAM_POLICY",
                "--page-size=25",
                "--snapshot-time=2024-05-06T07:08:09.123Z",
                "--format=json"
            ]
        );
    }

    #[test]
    fn list_assets_empty_project_is_omitted() {
        let args = ListAssetsArgs {
            project: Some(String::new()),
            ..base_list()
        };
        assert!(!list(args).iter().any(|t| t.starts_with("--project")));
    }

    #[test]
    fn snapshot_time_uses_call_time() {
        let before = Utc::now();
        let req = AssetRequest::ListAssets(ListAssetsArgs {
            snapshot: true,
            ..base_list()
        });
        let cmd = GcloudCommand::for_request(&req, Utc::now());
        let after = Utc::now();
        let value = cmd
            .args()
            .iter()
            .find_map(|t| t.strip_prefix("--snapshot-time="))
            .expect("snapshot flag");
        let at = DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc);
        assert!(at >= before - chrono::Duration::milliseconds(1) && at <= after);
    }

    #[test]
    fn search_assets_template() {
        let req = AssetRequest::SearchAssets(SearchAssetsArgs {
            project: None,
            query: "name:my-instance".into(),
            page_size: 100,
        });
        let cmd = GcloudCommand::for_request(&req, now());
        assert_eq!(
            cmd.args(),
            [
                "asset",
                "search-all-resources",
                "--query=name:my-instance",
                "--page-size=100",
                "--format=json"
            ]
        );
    }

    #[test]
    fn search_assets_project_scope() {
        let req = AssetRequest::SearchAssets(SearchAssetsArgs {
            project: Some("demo".into()),
            query: "state:RUNNING".into(),
            page_size: 10,
        });
        assert_eq!(
            GcloudCommand::for_request(&req, now()).args(),
            [
                "asset",
                "search-all-resources",
                "--query=state:RUNNING",
                "--scope=projects/demo",
                "--page-size=10",
                "--format=json"
            ]
        );
    }

    #[test]
    fn history_flags() {
        let minimal = AssetRequest::GetAssetHistory(AssetHistoryArgs {
            asset_name: "//storage.googleapis.com/b".into(),
            content_type: "RESOURCE".into(),
            ..Default::default()
        });
        assert_eq!(
            GcloudCommand::for_request(&minimal, now()).args(),
            [
                "asset",
                "get-history",
                "--asset-names=//storage.googleapis.com/b",
                "--content-type=RESOURCE",
                "--format=json"
            ]
        );

        let full = AssetRequest::GetAssetHistory(AssetHistoryArgs {
            project: Some("demo".into()),
            asset_name: "//storage.googleapis.com/b".into(),
            start_time: Some("2024-01-01T00:00:00Z".into()),
            end_time: Some("2024-02-01T00:00:00Z".into()),
            content_type: "ORG_POLICY".into(),
        });
        assert_eq!(
            GcloudCommand::for_request(&full, now()).args(),
            [
                "asset",
                "get-history",
                "--asset-names=//storage.googleapis.com/b",
                "--project=demo",
                "--start-time=2024-01-01T00:00:00Z",
                "--end-time=2024-02-01T00:00:00Z",
                "--content-type=ORG_POLICY",
                "--format=json"
            ]
        );
    }

    #[test]
    fn fixed_commands() {
        assert_eq!(
            GcloudCommand::for_request(&AssetRequest::GetProjects, now()).args(),
            ["projects", "list", "--format=json"]
        );
        assert_eq!(
            GcloudCommand::for_request(&AssetRequest::GetCurrentProject, now()).args(),
            ["config", "get-value", "project"]
        );
        let services = AssetRequest::GetServices(ServicesArgs {
            project: Some("demo".into()),
        });
        assert_eq!(
            GcloudCommand::for_request(&services, now()).args(),
            ["services", "list", "--enabled", "--project=demo", "--format=json"]
        );
        let services = AssetRequest::GetServices(ServicesArgs::default());
        assert_eq!(
            GcloudCommand::for_request(&services, now()).args(),
            ["services", "list", "--enabled", "--format=json"]
        );
    }

    #[test]
    fn display_includes_program_name() {
        let cmd = GcloudCommand::new(["projects", "list"]);
        assert_eq!(cmd.to_string(), "gcloud projects list");
        let cmd = GcloudCommand::new(["asset", "search-all-resources"]).flag("query", "name:a b");
        let split = shell_words::split(&cmd.to_string()).unwrap();
        assert_eq!(
            split,
            ["gcloud", "asset", "search-all-resources", "--query=name:a b"]
        );
    }

    #[tokio::test]
    async fn execute_parses_json() {
        let runner = FakeRunner::ok(r#"[{"name":"a"}]"#);
        let out = execute(&runner, &AssetRequest::GetProjects).await.unwrap();
        assert_eq!(out, Payload::Json(json!([{ "name": "a" }])));
        assert_eq!(runner.commands().len(), 1);
    }

    #[tokio::test]
    async fn execute_trims_plain_text() {
        let runner = FakeRunner::ok("my-project\n");
        let out = execute(&runner, &AssetRequest::GetCurrentProject).await.unwrap();
        assert_eq!(out, Payload::Text("my-project".into()));
        assert_eq!(out.render(), "my-project");
    }

    #[tokio::test]
    async fn stderr_on_success_is_not_a_failure() {
        let runner = FakeRunner::with_output(ExecOutput::new(
            true,
            "[]",
            "WARNING: some quota notice",
        ));
        let out = execute(&runner, &AssetRequest::GetProjects).await.unwrap();
        assert_eq!(out, Payload::Json(json!([])));
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_execution_error() {
        let runner = FakeRunner::with_output(ExecOutput::new(
            false,
            "",
            "ERROR: (gcloud.asset.list) PERMISSION_DENIED\n",
        ));
        let req = AssetRequest::parse(Operation::ListAssets, None).unwrap();
        let err = execute(&runner, &req).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("list_assets"), "got: {msg}");
        assert!(msg.contains("PERMISSION_DENIED"), "got: {msg}");
        assert_eq!(err.kind(), "execution");
    }

    #[tokio::test]
    async fn non_json_output_is_a_parse_error() {
        let runner = FakeRunner::ok("Listed 0 items.");
        let err = execute(&runner, &AssetRequest::GetProjects).await.unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert!(err.to_string().starts_with("get_projects failed:"));
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let runner = FakeRunner::spawn_error();
        let err = execute(&runner, &AssetRequest::GetProjects).await.unwrap_err();
        assert!(err.to_string().contains("No such file or directory"));
    }
}
