//! Stable identifiers for schemas, file names, and naming conventions.
//!
//! These are the defaults; most of them can be overridden through `scpguard.toml`.

// Schemas
pub const SCHEMA_CONFIG_V1: &str = "scpguard.config.v1";
pub const SCHEMA_ORG_SNAPSHOT_V1: &str = "scpguard.org-snapshot.v1";
pub const SCHEMA_MIRROR_V1: &str = "scpguard.mirror.v1";

// Mirror layout
pub const DEFAULT_MIRROR_DIR: &str = "service_control_policies";
pub const DEFAULT_ROOT_DIR: &str = "ROOT";
pub const DEFAULT_SHARED_DIR: &str = "SHARED";
pub const DEFAULT_ACCOUNT_SUFFIX: &str = "_ACCOUNT";
pub const MIRROR_SNAPSHOT_FILE: &str = ".scpguard-mirror.json";

// File extensions inside a node directory
pub const EXT_DEFINITION: &str = "json";
pub const EXT_SHARED: &str = "shared";
pub const EXT_GUARDRAIL: &str = "guardrail";
pub const EXT_PLACEHOLDER: &str = "placeholder";

// Classification
pub const DEFAULT_BASELINE_POLICY: &str = "FullAWSAccess";
pub const DEFAULT_GUARDRAIL_PREFIX: &str = "aws-guardrails";

// Limits
pub const DEFAULT_MAX_ATTACHMENTS: usize = 4;
pub const DEFAULT_MAX_CUSTOM_PER_UNIT: usize = 2;

// Directory service
pub const DEFAULT_PAGE_SIZE: usize = 20;

// Generated artifacts
pub const DEFAULT_MANIFEST_FILE: &str = "scp_define_attach_auto.tf";
pub const DEFAULT_ATTACHMENT_IMPORTS_FILE: &str = "import_policy_attachments.tf";
pub const DEFAULT_POLICY_IMPORTS_FILE: &str = "import_policies.tf";
pub const DEFAULT_MODULE_SOURCE: &str = "./scp_module";

// Condition keys understood by the condition evaluator
pub const KEY_REQUESTED_REGION: &str = "aws:RequestedRegion";
pub const KEY_PRINCIPAL_ARN: &str = "aws:PrincipalARN";
pub const KEY_PRINCIPAL_ACCOUNT: &str = "aws:PrincipalAccount";
pub const KEY_PRINCIPAL_ORG_ID: &str = "aws:PrincipalOrgID";

// Condition operators understood by the condition evaluator
pub const OP_STRING_NOT_EQUALS: &str = "StringNotEquals";
pub const OP_ARN_NOT_LIKE: &str = "ArnNotLike";
pub const OP_ARN_LIKE: &str = "ArnLike";
