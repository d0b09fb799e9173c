/*!
Operation catalog.

One `Operation` variant per tool exposed over MCP. Each variant owns a static
`OperationDescriptor` (name, description, parameter table); the table is the
single source for argument validation, for the advertised input schema, and
for the `tools` subcommand listing.

  list_assets         -> gcloud asset list
  search_assets       -> gcloud asset search-all-resources
  get_asset_history   -> gcloud asset get-history
  get_projects        -> gcloud projects list
  get_services        -> gcloud services list --enabled
  get_current_project -> gcloud config get-value project
*/

pub mod request;
pub mod schema;

use std::fmt;

use schema::{DefaultValue, ParamKind, ParamSpec};

pub use request::AssetRequest;

/// Content types accepted by `gcloud asset list` / `get-history`.
pub const CONTENT_TYPES: &[&str] = &[
    "RESOURCE",
    "IAM_POLICY",
    "ORG_POLICY",
    "OS_INVENTORY",
    "RELATIONSHIP",
];

pub const DEFAULT_PAGE_SIZE: u64 = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Operation {
    ListAssets,
    SearchAssets,
    GetAssetHistory,
    GetProjects,
    GetServices,
    GetCurrentProject,
}

/// Static description of one operation.
#[derive(Debug)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl Operation {
    /// All operations, in the order they are advertised.
    pub const fn variants() -> &'static [Operation] {
        &[
            Operation::ListAssets,
            Operation::SearchAssets,
            Operation::GetAssetHistory,
            Operation::GetProjects,
            Operation::GetServices,
            Operation::GetCurrentProject,
        ]
    }

    /// Exact (case-sensitive) lookup by tool name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|op| op.name() == name)
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    pub fn descriptor(&self) -> &'static OperationDescriptor {
        match self {
            Operation::ListAssets => &LIST_ASSETS,
            Operation::SearchAssets => &SEARCH_ASSETS,
            Operation::GetAssetHistory => &GET_ASSET_HISTORY,
            Operation::GetProjects => &GET_PROJECTS,
            Operation::GetServices => &GET_SERVICES,
            Operation::GetCurrentProject => &GET_CURRENT_PROJECT,
        }
    }

    /// Whether gcloud is asked for JSON (everything but the config lookup).
    pub fn expects_json(&self) -> bool {
        !matches!(self, Operation::GetCurrentProject)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/* ---- Parameter tables ---- */

const PROJECT: ParamSpec = ParamSpec::optional(
    "project",
    ParamKind::String,
    "Project ID (defaults to the active gcloud project)",
);

const PAGE_SIZE: ParamSpec = ParamSpec::optional(
    "page_size",
    ParamKind::Integer { minimum: 1 },
    "Maximum number of results per page",
)
.with_default(DefaultValue::Integer(DEFAULT_PAGE_SIZE));

const CONTENT_TYPE: ParamSpec = ParamSpec::optional(
    "content_type",
    ParamKind::Enum(CONTENT_TYPES),
    "Asset content type to return",
)
.with_default(DefaultValue::Str("RESOURCE"));

static LIST_ASSETS: OperationDescriptor = OperationDescriptor {
    name: "list_assets",
    description: "List Cloud Asset Inventory assets in a project, optionally filtered by asset type",
    params: &[
        PROJECT,
        ParamSpec::optional(
            "asset_types",
            ParamKind::StringArray,
            "Asset types to include, e.g. compute.googleapis.com/Instance",
        ),
        CONTENT_TYPE,
        PAGE_SIZE,
        ParamSpec::optional(
            "snapshot",
            ParamKind::Boolean,
            "Pin the listing to the current moment via --snapshot-time",
        )
        .with_default(DefaultValue::Bool(false)),
    ],
};

static SEARCH_ASSETS: OperationDescriptor = OperationDescriptor {
    name: "search_assets",
    description: "Search all resources visible to the caller using a Cloud Asset query",
    params: &[
        PROJECT,
        ParamSpec::required(
            "query",
            ParamKind::String,
            "Search query, e.g. name:my-instance or state:RUNNING",
        ),
        PAGE_SIZE,
    ],
};

static GET_ASSET_HISTORY: OperationDescriptor = OperationDescriptor {
    name: "get_asset_history",
    description: "Get the change history of a single asset over a time window",
    params: &[
        PROJECT,
        ParamSpec::required(
            "asset_name",
            ParamKind::String,
            "Full resource name, e.g. //compute.googleapis.com/projects/p/zones/z/instances/i",
        ),
        ParamSpec::optional(
            "start_time",
            ParamKind::DateTime,
            "Start of the window (RFC3339)",
        ),
        ParamSpec::optional("end_time", ParamKind::DateTime, "End of the window (RFC3339)"),
        CONTENT_TYPE,
    ],
};

static GET_PROJECTS: OperationDescriptor = OperationDescriptor {
    name: "get_projects",
    description: "List the projects the active account can access",
    params: &[],
};

static GET_SERVICES: OperationDescriptor = OperationDescriptor {
    name: "get_services",
    description: "List the services enabled in a project",
    params: &[PROJECT],
};

static GET_CURRENT_PROJECT: OperationDescriptor = OperationDescriptor {
    name: "get_current_project",
    description: "Show the project configured as the gcloud default",
    params: &[],
};
