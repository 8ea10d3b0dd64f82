//! Wire protocol between the sidebar client and the file-mutating server.
//!
//! Every exchange is one request envelope answered by exactly one response
//! envelope carrying the same `id`:
//!
//! ```text
//! → {"op": "move-slide-up", "id": "slideset-3", "payload": {"storyImportPath": ..., "previousImportPath": ...}}
//! ← {"op": "move-slide-up", "id": "slideset-3", "success": true, "error": null, "payload": {}}
//! ← {"op": "move-slide-up", "id": "slideset-3", "success": false, "error": "NotFound: ..."}
//! ```
//!
//! Payloads are camelCase JSON objects. The payload types here implement
//! [`Request`], which ties each one to its operation name and response type
//! so the client and router cannot disagree about shapes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Named operations the router dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetSlideSource,
    SaveSlide,
    MoveSlideUp,
    MoveSlideDown,
    DeleteSlide,
    InsertSlide,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::GetSlideSource,
        Operation::SaveSlide,
        Operation::MoveSlideUp,
        Operation::MoveSlideDown,
        Operation::DeleteSlide,
        Operation::InsertSlide,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::GetSlideSource => "get-slide-source",
            Operation::SaveSlide => "save-slide",
            Operation::MoveSlideUp => "move-slide-up",
            Operation::MoveSlideDown => "move-slide-down",
            Operation::DeleteSlide => "delete-slide",
            Operation::InsertSlide => "insert-slide",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure families reported in a response's `error` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidContent,
    IoError,
    UnknownError,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidContent => "InvalidContent",
            ErrorKind::IoError => "IOError",
            ErrorKind::UnknownError => "UnknownError",
        }
    }
}

/// A typed request payload.
pub trait Request: Serialize + DeserializeOwned {
    const OP: Operation;
    type Response: Serialize + DeserializeOwned;

    /// Identifying fields for log lines.
    fn describe(&self) -> String;
}

/// Response payload of operations that return nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSlideSourceRequest {
    pub story_id: String,
    pub import_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSlideSourceResponse {
    pub content: String,
    pub story_id: String,
}

impl Request for GetSlideSourceRequest {
    const OP: Operation = Operation::GetSlideSource;
    type Response = GetSlideSourceResponse;

    fn describe(&self) -> String {
        format!("story={} path={}", self.story_id, self.import_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSlideRequest {
    pub story_id: String,
    pub import_path: String,
    pub content: String,
}

impl Request for SaveSlideRequest {
    const OP: Operation = Operation::SaveSlide;
    type Response = Empty;

    fn describe(&self) -> String {
        format!("story={} path={}", self.story_id, self.import_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSlideUpRequest {
    pub story_import_path: String,
    pub previous_import_path: String,
}

impl Request for MoveSlideUpRequest {
    const OP: Operation = Operation::MoveSlideUp;
    type Response = Empty;

    fn describe(&self) -> String {
        format!(
            "path={} previous={}",
            self.story_import_path, self.previous_import_path
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSlideDownRequest {
    pub story_import_path: String,
    pub next_import_path: String,
}

impl Request for MoveSlideDownRequest {
    const OP: Operation = Operation::MoveSlideDown;
    type Response = Empty;

    fn describe(&self) -> String {
        format!("path={} next={}", self.story_import_path, self.next_import_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSlideRequest {
    pub target_import_path: String,
    pub all_slide_import_paths: Vec<String>,
}

impl Request for DeleteSlideRequest {
    const OP: Operation = Operation::DeleteSlide;
    type Response = Empty;

    fn describe(&self) -> String {
        format!(
            "target={} deck_len={}",
            self.target_import_path,
            self.all_slide_import_paths.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertSlideRequest {
    pub insert_at_index: usize,
    pub all_slide_import_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertSlideResponse {
    pub new_import_path: String,
}

impl Request for InsertSlideRequest {
    const OP: Operation = Operation::InsertSlide;
    type Response = InsertSlideResponse;

    fn describe(&self) -> String {
        format!(
            "index={} deck_len={}",
            self.insert_at_index,
            self.all_slide_import_paths.len()
        )
    }
}

/// A request on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub op: String,
    pub id: String,
    #[serde(default)]
    pub payload: Value,
}

impl RequestEnvelope {
    pub fn new<R: Request>(id: impl Into<String>, request: &R) -> Result<Self, serde_json::Error> {
        Ok(Self {
            op: R::OP.name().to_string(),
            id: id.into(),
            payload: serde_json::to_value(request)?,
        })
    }
}

/// A response on the wire. `payload` is present only on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub op: String,
    pub id: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ResponseEnvelope {
    pub fn success(request: &RequestEnvelope, payload: Value) -> Self {
        Self {
            op: request.op.clone(),
            id: request.id.clone(),
            success: true,
            error: None,
            payload: Some(payload),
        }
    }

    pub fn failure(request: &RequestEnvelope, kind: ErrorKind, message: impl fmt::Display) -> Self {
        Self {
            op: request.op.clone(),
            id: request.id.clone(),
            success: false,
            error: Some(format!("{}: {message}", kind.label())),
            payload: None,
        }
    }
}
