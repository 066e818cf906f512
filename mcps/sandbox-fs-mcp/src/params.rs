//! Parameter types for the sandboxed filesystem tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::edit::EditOperation;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    #[schemars(description = "Path to the file to read")]
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReadMultipleFilesParams {
    #[schemars(description = "Paths of the files to read")]
    pub paths: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WriteFileParams {
    #[schemars(description = "Path to the file to write")]
    pub path: String,

    #[schemars(description = "Content to write to the file")]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EditParam {
    #[schemars(description = "Text to search for; every occurrence is replaced")]
    #[serde(alias = "oldText")]
    pub old_text: String,

    #[schemars(description = "Replacement text")]
    #[serde(alias = "newText")]
    pub new_text: String,
}

impl From<EditParam> for EditOperation {
    fn from(edit: EditParam) -> Self {
        EditOperation::new(edit.old_text, edit.new_text)
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EditFileParams {
    #[schemars(description = "Path to the file to edit")]
    pub path: String,

    #[schemars(description = "Edits applied in order")]
    pub edits: Vec<EditParam>,

    #[schemars(
        description = "Preview the result without writing (default: false)",
        with = "bool"
    )]
    #[serde(
        default,
        alias = "dryRun",
        deserialize_with = "crate::types::deserialize_lenient_bool"
    )]
    pub dry_run: bool,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateDirParams {
    #[schemars(description = "Path of the directory to create; parents are created as needed")]
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListDirParams {
    #[schemars(description = "Path to the directory to list")]
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MoveFileParams {
    #[schemars(description = "Source path")]
    pub source: String,

    #[schemars(description = "Destination path; must not exist")]
    pub destination: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchFilesParams {
    #[schemars(description = "Base directory to search from")]
    pub path: String,

    #[schemars(description = "Glob pattern relative to the base (e.g., '*.rs', '**/*.json')")]
    pub pattern: String,

    #[schemars(description = "Glob patterns to exclude, relative to the base")]
    #[serde(default, alias = "excludePatterns")]
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FileInfoParams {
    #[schemars(description = "Path to the file or directory")]
    pub path: String,
}
