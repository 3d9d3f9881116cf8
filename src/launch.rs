//! Detached launching of entry commands.

use std::process::{Command, Stdio};

use tracing::{error, info};

/// Starts `command` through the platform shell, detached: no stdio, no
/// wait, no exit status. The pre-launch line is logged unconditionally,
/// before the attempt.
pub(crate) fn launch(command: &str) {
    info!("Launching '{command}'");

    let spawned = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(err) = spawned {
        error!(command, %err, "failed to start command");
    }
}
