use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use crate::error::ArchicadError;

/// First release whose bundle is named `ARCHICAD` instead of `ArchiCAD`.
const UPPERCASE_BUNDLE_SINCE: u32 = 22;
const OPEN_PROGRAM: &str = "open";
const KILL_PROGRAM: &str = "kill";
const PGREP_PROGRAM: &str = "pgrep";
/// `open` returns before the application process is listed.
const PID_LOOKUP_ATTEMPTS: u32 = 20;
const PID_LOOKUP_INTERVAL: Duration = Duration::from_millis(250);

/// Program plus arguments of one process lifecycle command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl std::fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LaunchedApplication {
    pub version: u32,
    pub file_name: Option<PathBuf>,
    pub pid: u32,
}

pub fn application_name(version: u32) -> String {
    if version >= UPPERCASE_BUNDLE_SINCE {
        format!("ARCHICAD {version}")
    } else {
        format!("ArchiCAD {version}")
    }
}

pub fn launch_command(version: u32, file_name: Option<&Path>) -> LaunchCommand {
    let mut args = vec![
        "-n".to_string(),
        "-a".to_string(),
        application_name(version),
    ];
    if let Some(file_name) = file_name {
        args.push(file_name.display().to_string());
    }

    LaunchCommand {
        program: OPEN_PROGRAM.to_string(),
        args,
    }
}

/// Newest process whose command line names the application bundle.
pub fn find_pid_command(version: u32) -> LaunchCommand {
    LaunchCommand {
        program: PGREP_PROGRAM.to_string(),
        args: vec!["-n".to_string(), "-f".to_string(), application_name(version)],
    }
}

pub fn kill_command(pid: u32) -> LaunchCommand {
    LaunchCommand {
        program: KILL_PROGRAM.to_string(),
        args: vec![pid.to_string()],
    }
}

/// Starts the application, waits for `open` to hand it off and looks up the
/// pid of the application process itself.
pub fn start_archicad(
    version: u32,
    file_name: Option<&Path>,
) -> Result<LaunchedApplication, ArchicadError> {
    run(&launch_command(version, file_name))?;
    let pid = find_application_pid(version)?;
    tracing::debug!(version, pid, "application process started");

    Ok(LaunchedApplication {
        version,
        file_name: file_name.map(Path::to_path_buf),
        pid,
    })
}

/// Sends `SIGTERM` to a process started by [`start_archicad`].
pub fn kill_archicad(pid: u32) -> Result<(), ArchicadError> {
    run(&kill_command(pid)).map(|_| ())
}

fn find_application_pid(version: u32) -> Result<u32, ArchicadError> {
    let command = find_pid_command(version);
    for _ in 0..PID_LOOKUP_ATTEMPTS {
        // pgrep exits 1 while nothing matches yet.
        if let Ok(stdout) = run(&command) {
            if let Some(pid) = parse_pid(&stdout) {
                return Ok(pid);
            }
        }
        thread::sleep(PID_LOOKUP_INTERVAL);
    }

    Err(ArchicadError::Launch {
        command: command.to_string(),
        reason: format!("no `{}` process appeared", application_name(version)),
    })
}

fn parse_pid(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())?
        .parse()
        .ok()
}

/// Runs `command` to completion and returns its standard output.
fn run(command: &LaunchCommand) -> Result<String, ArchicadError> {
    let rendered = command.to_string();
    tracing::debug!(command = %rendered, "running process command");

    let child = Command::new(&command.program)
        .args(&command.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| ArchicadError::Launch {
            command: rendered.clone(),
            reason: err.to_string(),
        })?;
    let output = child.wait_with_output().map_err(|err| ArchicadError::Launch {
        command: rendered.clone(),
        reason: err.to_string(),
    })?;

    if !output.status.success() {
        let code = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |code| code.to_string());
        return Err(ArchicadError::Launch {
            command: rendered,
            reason: format!(
                "exit code {code}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
