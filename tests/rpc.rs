//! RPC dispatch over a live registry: operation semantics and the error
//! mapping at the boundary.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use appvisor::{
    dispatch, AppConfig, AppType, Bus, Config, Registry, Request, Response, PROCESS_MANAGER,
};

fn stub_bin(dir: &Path, name: &str) -> String {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\nwhile true; do sleep 1; done\n").unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().into_owned()
}

async fn fresh(root: &Path) -> Arc<Registry> {
    std::fs::create_dir_all(root.join("descriptors")).unwrap();
    let cfg = Config {
        settings_path: root.join("applications.json"),
        descriptor_dir: root.join("descriptors"),
        bus_capacity: 256,
        grace: Duration::from_secs(5),
        process_manager: PROCESS_MANAGER.to_string(),
    };
    let bus = Bus::new(cfg.bus_capacity_clamped());
    let registry = Registry::new(cfg, bus);
    registry.startup().await.unwrap();
    registry
}

#[tokio::test]
async fn register_answers_the_object_path() {
    let dir = TempDir::new().unwrap();
    let registry = fresh(dir.path()).await;
    let bin = stub_bin(dir.path(), "idle");

    let resp = dispatch(
        &registry,
        Request::RegisterApplication {
            config: AppConfig::new("reader", &bin, AppType::Foreground),
        },
    )
    .await;
    let Response::Path { path: Some(path) } = resp else {
        panic!("expected a path, got {resp:?}");
    };

    let resp = dispatch(&registry, Request::GetApplicationPath { name: "reader".into() }).await;
    assert_eq!(resp, Response::Path { path: Some(path) });
}

#[tokio::test]
async fn invalid_registration_answers_a_null_path() {
    let dir = TempDir::new().unwrap();
    let registry = fresh(dir.path()).await;

    let resp = dispatch(
        &registry,
        Request::RegisterApplication {
            config: AppConfig::new("ghost", "/no/such/binary", AppType::Foreground),
        },
    )
    .await;
    assert_eq!(resp, Response::Path { path: None });

    let resp = dispatch(&registry, Request::Applications).await;
    assert_eq!(resp, Response::Paths { entries: Default::default() });
}

#[tokio::test]
async fn launch_and_listings_flow_through_dispatch() {
    let dir = TempDir::new().unwrap();
    let registry = fresh(dir.path()).await;
    let bin = stub_bin(dir.path(), "idle");

    let resp = dispatch(
        &registry,
        Request::RegisterApplication {
            config: AppConfig::new("clock", &bin, AppType::Foreground),
        },
    )
    .await;
    let Response::Path { path: Some(path) } = resp else {
        panic!("expected a path, got {resp:?}");
    };

    assert_eq!(
        dispatch(&registry, Request::Launch { path: path.clone() }).await,
        Response::Done
    );
    assert_eq!(
        dispatch(&registry, Request::CurrentApplication).await,
        Response::Path { path: Some(path.clone()) }
    );

    let resp = dispatch(&registry, Request::RunningApplications).await;
    let Response::Paths { entries } = resp else {
        panic!("expected paths, got {resp:?}");
    };
    assert_eq!(entries.get("clock"), Some(&path));

    assert_eq!(
        dispatch(&registry, Request::Launch { path: "/nowhere".into() }).await,
        Response::Failed {
            label: "registry_unknown_application".into(),
            message: "no application registered at \"/nowhere\"".into(),
        }
    );

    registry.shutdown().await;
}

#[tokio::test]
async fn startup_reference_is_settable_over_rpc() {
    let dir = TempDir::new().unwrap();
    let registry = fresh(dir.path()).await;
    let bin = stub_bin(dir.path(), "idle");

    let Response::Path { path: Some(path) } = dispatch(
        &registry,
        Request::RegisterApplication {
            config: AppConfig::new("reader", &bin, AppType::Foreground),
        },
    )
    .await
    else {
        panic!("registration failed");
    };

    // Unresolvable targets are ignored, not errors.
    assert_eq!(
        dispatch(&registry, Request::SetStartupApplication { path: "/nowhere".into() }).await,
        Response::Done
    );
    assert_eq!(
        dispatch(&registry, Request::StartupApplication).await,
        Response::Path { path: None }
    );

    dispatch(&registry, Request::SetStartupApplication { path: path.clone() }).await;
    assert_eq!(
        dispatch(&registry, Request::StartupApplication).await,
        Response::Path { path: Some(path) }
    );
}
