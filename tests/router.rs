//! The SIGUSR1/SIGUSR2 delivery path end-to-end: OS signal in, notification
//! to the unique foreground process out, observable as `ApplicationSignaled`.
//!
//! Runs in its own test binary because it raises real user signals against
//! the test process.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tempfile::TempDir;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast::error::TryRecvError;

use appvisor::{AppConfig, AppType, Bus, Config, EventKind, Registry, PROCESS_MANAGER};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// The stub must outlive user signals aimed at it.
fn signal_tolerant_bin(dir: &Path) -> String {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("tolerant");
    std::fs::write(
        &path,
        "#!/bin/sh\ntrap : USR1 USR2\nwhile true; do sleep 1; done\n",
    )
    .unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().into_owned()
}

async fn fresh(root: &Path) -> (Arc<Registry>, Bus) {
    init_tracing();
    std::fs::create_dir_all(root.join("descriptors")).unwrap();
    let cfg = Config {
        settings_path: root.join("applications.json"),
        descriptor_dir: root.join("descriptors"),
        bus_capacity: 256,
        grace: Duration::from_secs(5),
        process_manager: PROCESS_MANAGER.to_string(),
    };
    let bus = Bus::new(cfg.bus_capacity_clamped());
    let registry = Registry::new(cfg, bus.clone());
    registry.startup().await.unwrap();
    (registry, bus)
}

#[tokio::test]
async fn user_signals_reach_only_the_foreground_application() {
    let dir = TempDir::new().unwrap();
    let (registry, bus) = fresh(dir.path()).await;
    let bin = signal_tolerant_bin(dir.path());

    // Keep the user-signal dispositions non-fatal for this process even
    // before the router has registered its own listeners.
    let _usr1_guard = signal(SignalKind::user_defined1()).unwrap();
    let _usr2_guard = signal(SignalKind::user_defined2()).unwrap();

    let router = registry.signal_router();
    tokio::spawn(router.run(registry.cancellation_token()));
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Nothing foreground: the signal is swallowed, no event is published.
    let mut rx = bus.subscribe();
    kill(Pid::this(), Signal::SIGUSR1).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    let reader = registry
        .register_application(AppConfig::new("reader", &bin, AppType::Foreground))
        .await
        .unwrap();
    registry.launch(reader.as_str()).await.unwrap();

    let mut rx = bus.subscribe();
    kill(Pid::this(), Signal::SIGUSR1).unwrap();

    let signaled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let ev = rx.recv().await.expect("bus closed");
            if ev.kind == EventKind::ApplicationSignaled {
                return ev;
            }
        }
    })
    .await
    .expect("no ApplicationSignaled event arrived");

    assert_eq!(signaled.path.as_deref(), Some(reader.as_str()));
    assert_eq!(signaled.signal, Some(Signal::SIGUSR1 as i32));

    registry.shutdown().await;
}
