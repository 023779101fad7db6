//! Camera adapter that shells out to `fswebcam`.
//!
//! Implements [`CameraPort`].  Each capture spawns one process and waits
//! for it with a deadline; a hung camera is killed and reported as
//! [`IoError::Timeout`] so the control loop never stalls.

use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::app::ports::{Artifact, CameraPort, CaptureRequest};
use crate::error::IoError;

const POLL_STEP: Duration = Duration::from_millis(20);

pub struct FswebcamCamera {
    program: String,
    resolution: String,
    font: String,
    skip_frames: u32,
    deadline: Duration,
}

impl Default for FswebcamCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FswebcamCamera {
    pub fn new() -> Self {
        Self {
            program: "fswebcam".to_owned(),
            resolution: "2592x1944".to_owned(),
            font: "sans:60".to_owned(),
            skip_frames: 1,
            deadline: Duration::from_secs(20),
        }
    }

    /// Use a different executable (e.g. a wrapper script).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    fn command(&self, request: &CaptureRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--title")
            .arg(&request.annotation)
            .arg("--font")
            .arg(&self.font)
            .arg("-r")
            .arg(&self.resolution)
            .arg("-S")
            .arg(self.skip_frames.to_string())
            .arg(&request.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl CameraPort for FswebcamCamera {
    fn capture(&mut self, request: &CaptureRequest) -> Result<Artifact, IoError> {
        let mut child = self.command(request).spawn().map_err(|e| {
            warn!("{} not runnable: {}", self.program, e);
            IoError::Disconnected
        })?;

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => break,
                Ok(Some(status)) => {
                    debug!("{} exited with {}", self.program, status);
                    return Err(IoError::Device("camera exited with failure"));
                }
                Ok(None) if started.elapsed() >= self.deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(IoError::Timeout);
                }
                Ok(None) => thread::sleep(POLL_STEP),
                Err(_) => return Err(IoError::Device("camera process lost")),
            }
        }

        Ok(Artifact {
            path: request.destination.clone(),
        })
    }

    fn prepare_destination(&mut self, folder: &str) -> Result<(), IoError> {
        std::fs::create_dir_all(Path::new(folder)).map_err(|e| {
            warn!("Cannot create {}: {}", folder, e);
            IoError::Device("destination not writable")
        })
    }
}
