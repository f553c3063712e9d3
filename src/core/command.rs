use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::core::locator::EngineLocation;

/// Win32 `CREATE_NO_WINDOW` process creation flag.
#[cfg(windows)]
pub const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, Clone)]
pub struct EngineCommand {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl EngineCommand {
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.input.to_string_lossy().to_string(),
            self.output.to_string_lossy().to_string(),
            // Always overwrite: repeated runs to the same target must not prompt.
            "-y".to_string(),
        ]
    }

    pub fn build(&self, engine: &EngineLocation) -> Command {
        let mut cmd = Command::new(engine.program());
        cmd.arg("-i")
            .arg(&self.input)
            .arg(&self.output)
            .arg("-y")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd
    }
}
