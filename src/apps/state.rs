//! # Application lifecycle transition table.
//!
//! The lifecycle is an explicit enumerated state machine: one pure function
//! maps (current state × event × application type) to the next state, so the
//! pause/stop coupling lives in exactly one place and can be tested over the
//! full product of inputs.
//!
//! ```text
//!            Launch                    Launch (resume)
//! Inactive ─────────► InForeground ◄───────────────── InBackground / Paused
//!                          │
//!                          │ Pause(stopping = false)
//!                          ├── Backgroundable ──► InBackground   (process alive)
//!                          └── otherwise ───────► Inactive       (implicit stop)
//!                          │
//!                          │ Pause(stopping = true)
//!                          ├── Backgroundable ──► InBackground
//!                          └── otherwise ───────► Paused         (SIGSTOP, device suspend)
//!
//! any state ── Stop / Exited ──► Inactive
//! ```

use super::config::AppType;

/// Lifecycle state of one managed application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// No process is supposed to be running. Initial state.
    Inactive,
    /// The single application currently holding the foreground.
    InForeground,
    /// Running off-foreground (Backgroundable applications only).
    InBackground,
    /// Process alive but suspended (device-suspend parking).
    Paused,
}

/// Input to the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppEvent {
    /// Bring the application to the foreground.
    Launch,
    /// Yield the foreground; `stopping` marks a mass device-suspend pause.
    Pause { stopping: bool },
    /// Terminate the application.
    Stop,
    /// The OS process exited.
    Exited,
}

impl AppState {
    /// Computes the next state for `event` given the application's type.
    ///
    /// Pure bookkeeping: the caller performs the matching process side
    /// effects (spawn, hook, signal). Repeated events converge on the target
    /// state rather than erroring.
    pub(crate) fn next(self, ty: AppType, event: AppEvent) -> AppState {
        match (self, event) {
            (_, AppEvent::Launch) => AppState::InForeground,
            (_, AppEvent::Stop) | (_, AppEvent::Exited) => AppState::Inactive,

            (AppState::Inactive, AppEvent::Pause { .. }) => AppState::Inactive,
            (AppState::Paused, AppEvent::Pause { .. }) => AppState::Paused,
            (AppState::InForeground, AppEvent::Pause { stopping })
            | (AppState::InBackground, AppEvent::Pause { stopping }) => {
                if ty == AppType::Backgroundable {
                    AppState::InBackground
                } else if stopping {
                    AppState::Paused
                } else {
                    AppState::Inactive
                }
            }
        }
    }

    /// True while the application occupies or may re-enter the screen
    /// without a fresh spawn (a live process is expected).
    pub fn is_running(self) -> bool {
        matches!(self, AppState::InForeground | AppState::InBackground)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [AppState; 4] = [
        AppState::Inactive,
        AppState::InForeground,
        AppState::InBackground,
        AppState::Paused,
    ];
    const TYPES: [AppType; 3] = [
        AppType::Foreground,
        AppType::Background,
        AppType::Backgroundable,
    ];

    #[test]
    fn launch_always_reaches_foreground() {
        for state in STATES {
            for ty in TYPES {
                assert_eq!(state.next(ty, AppEvent::Launch), AppState::InForeground);
            }
        }
    }

    #[test]
    fn stop_and_exit_always_reach_inactive() {
        for state in STATES {
            for ty in TYPES {
                assert_eq!(state.next(ty, AppEvent::Stop), AppState::Inactive);
                assert_eq!(state.next(ty, AppEvent::Exited), AppState::Inactive);
            }
        }
    }

    #[test]
    fn backgroundable_pause_keeps_process() {
        for stopping in [false, true] {
            assert_eq!(
                AppState::InForeground.next(AppType::Backgroundable, AppEvent::Pause { stopping }),
                AppState::InBackground
            );
        }
    }

    #[test]
    fn foreground_only_pause_stops_or_parks() {
        assert_eq!(
            AppState::InForeground.next(AppType::Foreground, AppEvent::Pause { stopping: false }),
            AppState::Inactive
        );
        assert_eq!(
            AppState::InForeground.next(AppType::Foreground, AppEvent::Pause { stopping: true }),
            AppState::Paused
        );
    }

    #[test]
    fn pause_is_idempotent_on_settled_states() {
        for ty in TYPES {
            for stopping in [false, true] {
                assert_eq!(
                    AppState::Inactive.next(ty, AppEvent::Pause { stopping }),
                    AppState::Inactive
                );
                assert_eq!(
                    AppState::Paused.next(ty, AppEvent::Pause { stopping }),
                    AppState::Paused
                );
            }
        }
    }

    #[test]
    fn transition_table_is_total() {
        // Every (state, type, event) input produces a state without panicking.
        for state in STATES {
            for ty in TYPES {
                for event in [
                    AppEvent::Launch,
                    AppEvent::Pause { stopping: false },
                    AppEvent::Pause { stopping: true },
                    AppEvent::Stop,
                    AppEvent::Exited,
                ] {
                    let _ = state.next(ty, event);
                }
            }
        }
    }
}
