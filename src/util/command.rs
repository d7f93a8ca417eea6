//! Subprocess runner shared by the gpg and git adapters.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::thread;
use zeroize::Zeroizing;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("cannot run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {}: {stderr}", status_label(.status))]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
}

fn status_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

fn check(program: String, output: Output) -> Result<Output, CommandError> {
    if output.status.success() {
        return Ok(output);
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(CommandError::Failed {
        program,
        status: output.status.code(),
        stderr: format!("{}{}", stdout, stderr).trim().to_string(),
    })
}

/// Run to completion and return stdout, failing on a non-zero exit.
pub fn run(mut cmd: Command) -> Result<Vec<u8>, CommandError> {
    let program = program_name(&cmd);
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;
    check(program, output).map(|o| o.stdout)
}

/// Run with `input` piped to stdin and return stdout.
///
/// Stdin is fed from a separate thread so a child that streams output before
/// draining its input cannot deadlock us.
pub fn run_with_input(mut cmd: Command, input: &[u8]) -> Result<Vec<u8>, CommandError> {
    let program = program_name(&cmd);
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

    let writer = child.stdin.take().map(|mut stdin| {
        let data = Zeroizing::new(input.to_vec());
        thread::spawn(move || {
            // A child that exits early closes the pipe; its exit status reports why.
            let _ = stdin.write_all(&data);
        })
    });

    let output = child
        .wait_with_output()
        .map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;
    if let Some(handle) = writer {
        let _ = handle.join();
    }
    check(program, output).map(|o| o.stdout)
}

/// Whether `program --version` runs successfully.
pub fn available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
