//! # Typed RPC surface.
//!
//! The registry's IPC object surface as explicit, serde-tagged
//! request/response enumerations: every operation is a variant with a fixed
//! schema, validated at this boundary, instead of being discovered through
//! runtime introspection. The transport that carries these frames across
//! process boundaries is out of scope; [`dispatch`] is the whole surface.
//!
//! ## Error mapping
//! - Validation failures answer with a null path or `ok = false`, never an
//!   abort.
//! - The one fatal condition (`reload` hitting an unsupported settings
//!   version) answers with [`Response::Failed`] carrying the error label.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::apps::AppConfig;
use crate::registry::Registry;

/// One invokable registry operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    /// Register a new application from a full configuration record.
    RegisterApplication {
        /// The record to register.
        config: AppConfig,
    },
    /// Remove the application at `path`.
    UnregisterApplication {
        /// Object path of the target.
        path: String,
    },
    /// Re-run reconciliation and persist the result.
    Reload,
    /// Bring the application at `path` to the foreground.
    Launch {
        /// Object path of the target.
        path: String,
    },
    /// Resolve a name to its object path.
    GetApplicationPath {
        /// Application name.
        name: String,
    },
    /// Point the startup reference at `path`.
    SetStartupApplication {
        /// Object path of the target.
        path: String,
    },
    /// All registered applications.
    Applications,
    /// Applications in the foreground or background.
    RunningApplications,
    /// Applications parked in `Paused`.
    PausedApplications,
    /// The unique foreground application.
    CurrentApplication,
    /// The configured startup application.
    StartupApplication,
}

/// Answer to one [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum Response {
    /// A single (possibly absent) object path.
    Path {
        /// Resolved path, or `None` for an invalid/unknown target.
        path: Option<String>,
    },
    /// A boolean outcome.
    Flag {
        /// Operation outcome.
        ok: bool,
    },
    /// A name → object path collection snapshot.
    Paths {
        /// Point-in-time entries.
        entries: BTreeMap<String, String>,
    },
    /// Completed with nothing to report.
    Done,
    /// The operation failed.
    Failed {
        /// Stable error label.
        label: String,
        /// Human-readable message.
        message: String,
    },
}

impl Response {
    fn paths(entries: BTreeMap<String, crate::apps::ObjectPath>) -> Self {
        Response::Paths {
            entries: entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

/// Executes one request against the registry.
pub async fn dispatch(registry: &Registry, request: Request) -> Response {
    match request {
        Request::RegisterApplication { config } => {
            match registry.register_application(config).await {
                Ok(path) => Response::Path { path: Some(path.into()) },
                Err(err) => {
                    tracing::debug!(label = err.as_label(), %err, "registration rejected");
                    Response::Path { path: None }
                }
            }
        }
        Request::UnregisterApplication { path } => Response::Flag {
            ok: registry.unregister_application(&path).await,
        },
        Request::Reload => match registry.reload().await {
            Ok(()) => Response::Done,
            Err(err) => Response::Failed {
                label: err.as_label().to_string(),
                message: err.to_string(),
            },
        },
        Request::Launch { path } => match registry.launch(&path).await {
            Ok(()) => Response::Done,
            Err(err) => Response::Failed {
                label: err.as_label().to_string(),
                message: err.to_string(),
            },
        },
        Request::GetApplicationPath { name } => Response::Path {
            path: registry.get_application_path(&name).await.map(Into::into),
        },
        Request::SetStartupApplication { path } => {
            registry.set_startup_application(&path).await;
            Response::Done
        }
        Request::Applications => Response::paths(registry.applications().await),
        Request::RunningApplications => Response::paths(registry.running_applications().await),
        Request::PausedApplications => Response::paths(registry.paused_applications().await),
        Request::CurrentApplication => Response::Path {
            path: registry.current_application().await.map(Into::into),
        },
        Request::StartupApplication => Response::Path {
            path: registry.startup_application().await.map(Into::into),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_have_fixed_tagged_schemas() {
        let req: Request =
            serde_json::from_str(r#"{"op": "getApplicationPath", "name": "reader"}"#).unwrap();
        assert_eq!(req, Request::GetApplicationPath { name: "reader".into() });

        let json = serde_json::to_value(&Request::Reload).unwrap();
        assert_eq!(json["op"], "reload");
    }

    #[test]
    fn unknown_operations_are_rejected_at_the_boundary() {
        let err = serde_json::from_str::<Request>(r#"{"op": "formatDisk"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn responses_round_trip() {
        let resp = Response::Flag { ok: false };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(serde_json::from_str::<Response>(&json).unwrap(), resp);
    }
}
