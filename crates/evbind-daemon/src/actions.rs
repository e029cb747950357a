//! Binding actions
//!
//! Turns configured [`Action`]s into engine callbacks. Spawned programs are
//! detached from the callback that started them.

use std::process::ExitStatus;
use std::thread;

use anyhow::{bail, Context, Result};
use evbind_config::{Action, Binding};
use evbind_core::ComboEngine;
use tokio::runtime::Handle;

/// Register every binding with the engine, skipping malformed combos.
///
/// Returns the number of bindings registered.
pub fn register_all(engine: &ComboEngine, bindings: &[Binding]) -> usize {
    let mut registered = 0;

    for binding in bindings {
        let action = binding.action.clone();
        let label = binding.combo.clone();

        match engine.register_binding(&binding.combo, move || {
            if let Err(e) = run_action(&action) {
                tracing::warn!("Action for {} failed: {:#}", label, e);
            }
        }) {
            Ok(combo) => {
                tracing::debug!("Bound {} -> {:?}", combo, binding.action);
                registered += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping binding '{}': {}", binding.combo, e);
            }
        }
    }

    registered
}

/// Run an action.
///
/// Spawned programs are not waited on; their exit status is collected in the
/// background so a long-lived program never holds a dispatcher thread or
/// delays runtime shutdown.
pub fn run_action(action: &Action) -> Result<()> {
    match action {
        Action::Spawn(argv) => {
            let Some((program, args)) = argv.split_first() else {
                bail!("Empty command");
            };

            tracing::info!("Spawning {:?}", argv);
            spawn_detached(program, args)
        }
        Action::Log(message) => {
            tracing::info!("{}", message);
            Ok(())
        }
    }
}

/// Start `program` and reap it without blocking the caller.
///
/// Inside a tokio runtime the child is reaped by a runtime task, which is
/// dropped on shutdown. Outside one, a detached thread waits for it.
fn spawn_detached(program: &str, args: &[String]) -> Result<()> {
    match Handle::try_current() {
        Ok(handle) => {
            let mut child = tokio::process::Command::new(program)
                .args(args)
                .spawn()
                .with_context(|| format!("Failed to spawn '{}'", program))?;

            let program = program.to_string();
            handle.spawn(async move {
                let status = child.wait().await;
                log_exit(&program, status);
            });
        }
        Err(_) => {
            let mut child = std::process::Command::new(program)
                .args(args)
                .spawn()
                .with_context(|| format!("Failed to spawn '{}'", program))?;

            let program = program.to_string();
            thread::Builder::new()
                .name("evbind-reaper".to_string())
                .spawn(move || {
                    let status = child.wait();
                    log_exit(&program, status);
                })
                .context("Failed to start reaper thread")?;
        }
    }
    Ok(())
}

fn log_exit(program: &str, status: std::io::Result<ExitStatus>) {
    match status {
        Ok(status) if status.success() => {
            tracing::debug!("'{}' exited successfully", program);
        }
        Ok(status) => {
            tracing::warn!("'{}' exited with {}", program, status);
        }
        Err(e) => {
            tracing::warn!("Failed to wait for '{}': {}", program, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evbind_core::{Dispatch, TokioDispatch};
    use std::sync::{mpsc, Arc, Mutex};
    use std::time::{Duration, Instant};

    fn binding(combo: &str, action: Action) -> Binding {
        Binding {
            combo: combo.to_string(),
            action,
        }
    }

    #[test]
    fn test_run_log_action() {
        assert!(run_action(&Action::Log("hello".to_string())).is_ok());
    }

    #[test]
    fn test_run_spawn_action() {
        assert!(run_action(&Action::Spawn(vec!["true".to_string()])).is_ok());
    }

    #[test]
    fn test_run_spawn_does_not_wait_for_exit_status() {
        // A failing exit status is only logged by the reaper
        assert!(run_action(&Action::Spawn(vec!["false".to_string()])).is_ok());
    }

    #[test]
    fn test_run_spawn_returns_before_child_exits() {
        let started = Instant::now();
        let argv = vec!["sleep".to_string(), "3".to_string()];
        assert!(run_action(&Action::Spawn(argv)).is_ok());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_runtime_shutdown_not_held_by_running_child() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        let dispatcher = TokioDispatch::new(runtime.handle().clone());

        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        dispatcher.dispatch(Arc::new(move || {
            let argv = vec!["sleep".to_string(), "3".to_string()];
            let spawned = run_action(&Action::Spawn(argv)).is_ok();
            let _ = tx.lock().unwrap().send(spawned);
        }));
        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());

        let started = Instant::now();
        drop(runtime);
        let waited = started.elapsed();
        assert!(waited < Duration::from_secs(1), "runtime drop waited {:?}", waited);
    }

    #[tokio::test]
    async fn test_run_spawn_missing_program_in_runtime() {
        let result = run_action(&Action::Spawn(vec!["/nonexistent/evbind-test".to_string()]));
        assert!(result.is_err());
    }

    #[test]
    fn test_run_spawn_missing_program() {
        let result = run_action(&Action::Spawn(vec!["/nonexistent/evbind-test".to_string()]));
        assert!(result.is_err());
    }

    #[test]
    fn test_run_spawn_empty_command() {
        assert!(run_action(&Action::Spawn(Vec::new())).is_err());
    }

    #[test]
    fn test_register_all_skips_malformed() {
        let engine = ComboEngine::new();
        let bindings = vec![
            binding("Ctrl+Alt+T", Action::Log("terminal".to_string())),
            binding("Ctrl+Alt", Action::Log("modifier only".to_string())),
            binding("ctrl+alt+t", Action::Log("replaces the first".to_string())),
            binding("F12", Action::Spawn(vec!["true".to_string()])),
        ];

        assert_eq!(register_all(&engine, &bindings), 3);
        assert_eq!(engine.binding_count(), 2);
        assert!(engine.has_binding("CTRL+ALT+T"));
        assert!(engine.has_binding("F12"));
    }
}
