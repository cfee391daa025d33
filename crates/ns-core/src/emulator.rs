//! Hand-off to the external network emulator.
//!
//! The emulator consumes a saved topology file. NetSketch only builds the
//! command line and starts the process; it does not inspect the emulator's
//! output or exit status.

use crate::error::LaunchError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Child, Command};

/// Placeholder replaced by the topology path in every argument.
pub const TOPOLOGY_PLACEHOLDER: &str = "{topology}";

/// The command used to run a topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            program: "xterm".to_string(),
            args: vec![
                "-e".to_string(),
                format!("sudo python3 mininet_launcher.py '{TOPOLOGY_PLACEHOLDER}'"),
            ],
        }
    }
}

impl EmulatorConfig {
    /// Build the command for `topology` without starting it.
    pub fn command(&self, topology: &Path) -> Result<Command, LaunchError> {
        if self.program.trim().is_empty() {
            return Err(LaunchError::EmptyCommand);
        }
        let path = topology.to_string_lossy();
        let mut cmd = Command::new(&self.program);
        cmd.args(
            self.args
                .iter()
                .map(|arg| arg.replace(TOPOLOGY_PLACEHOLDER, &path)),
        );
        Ok(cmd)
    }
}

/// Start the emulator on a saved topology file.
pub fn launch(config: &EmulatorConfig, topology: &Path) -> Result<Child, LaunchError> {
    let mut cmd = config.command(topology)?;
    log::info!("launching emulator: {cmd:?}");
    cmd.spawn().map_err(|source| LaunchError::Spawn {
        program: config.program.clone(),
        source,
    })
}
