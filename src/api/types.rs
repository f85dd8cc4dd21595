//! Control protocol request/response types
//!
//! One JSON object per line in each direction. Requests carry a `method`
//! field naming the operation; responses carry a `status` of ok or error.

use serde::{Deserialize, Serialize};

/// Snapshot ids arrive as either a JSON string or an integer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdArg {
    Num(i64),
    Str(String),
}

impl IdArg {
    pub fn as_string(&self) -> String {
        match self {
            IdArg::Num(n) => n.to_string(),
            IdArg::Str(s) => s.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum Request {
    Alive,
    Start,
    Stop,
    Suspend,
    Reset,
    List,
    ListSnapshots,
    Snapshot {
        snap_name: String,
    },
    DeleteSnapshot {
        #[serde(default)]
        snap_id: Option<IdArg>,
    },
    RevertToSnapshot {
        #[serde(default)]
        snap_id: Option<IdArg>,
    },
    RestartTarget,
    Wait,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Ok {
        /// Raw hypervisor output for the string-returning operations.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alive: Option<bool>,
    },
    Error {
        error: String,
        message: String,
    },
}

impl Response {
    /// Completion of a blocking void operation (wait, restartTarget).
    pub fn done() -> Self {
        Response::Ok {
            output: None,
            alive: None,
        }
    }

    pub fn alive(alive: bool) -> Self {
        Response::Ok {
            output: None,
            alive: Some(alive),
        }
    }

    pub fn error(error: impl Into<String>, message: impl Into<String>) -> Self {
        Response::Error {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn from_output(result: crate::Result<String>) -> Self {
        match result {
            Ok(output) => Response::Ok {
                output: Some(output),
                alive: None,
            },
            Err(e) => Self::from_error(e),
        }
    }

    pub fn from_unit(result: crate::Result<()>) -> Self {
        match result {
            Ok(()) => Self::done(),
            Err(e) => Self::from_error(e),
        }
    }

    fn from_error(e: crate::Error) -> Self {
        let kind = match &e {
            crate::Error::Spawn { .. } => "Spawn",
            crate::Error::RetriesExhausted { .. } => "RetriesExhausted",
            crate::Error::Config(_) => "Config",
            crate::Error::Io(_) => "Io",
            crate::Error::Json(_) => "Json",
        };
        Response::Error {
            error: kind.to_string(),
            message: e.to_string(),
        }
    }
}
