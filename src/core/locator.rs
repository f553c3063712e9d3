use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const ENGINE_NAME: &str = "ffmpeg";

/// Where the bundled copy lives, relative to the working directory.
const BUNDLED_DIR: [&str; 2] = ["ffmpeg", "bin"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLocation {
    Path(PathBuf),
    /// Launch by bare name and let the OS search `PATH`.
    SearchPath,
}

impl EngineLocation {
    pub fn program(&self) -> &OsStr {
        match self {
            EngineLocation::Path(path) => path.as_os_str(),
            EngineLocation::SearchPath => OsStr::new(ENGINE_NAME),
        }
    }

    pub fn display(&self) -> String {
        match self {
            EngineLocation::Path(path) => path.display().to_string(),
            EngineLocation::SearchPath => format!("{ENGINE_NAME} (system PATH)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Locator {
    root: Option<PathBuf>,
    explicit: Option<PathBuf>,
}

impl Locator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_engine(mut self, engine: impl Into<PathBuf>) -> Self {
        self.explicit = Some(engine.into());
        self
    }

    pub fn locate(&self) -> EngineLocation {
        if let Some(path) = &self.explicit {
            return EngineLocation::Path(path.clone());
        }

        let root = match &self.root {
            Some(root) => root.clone(),
            None => match env::current_dir() {
                Ok(dir) => dir,
                Err(err) => {
                    tracing::debug!(error = %err, "working directory unavailable, using PATH");
                    return EngineLocation::SearchPath;
                }
            },
        };

        let candidate = bundled_path(&root);
        if candidate.exists() {
            EngineLocation::Path(candidate)
        } else {
            EngineLocation::SearchPath
        }
    }
}

pub fn bundled_path(root: &Path) -> PathBuf {
    let mut path = root.to_path_buf();
    for part in BUNDLED_DIR {
        path.push(part);
    }
    path.push(format!("{ENGINE_NAME}{}", env::consts::EXE_SUFFIX));
    path
}

#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub program: String,
    pub available: bool,
    pub version: Option<String>,
    pub resolved: Option<PathBuf>,
}

/// Runs `<engine> -version` to report whether the engine can be started.
pub fn check_engine(location: &EngineLocation) -> EngineInfo {
    let resolved = match location {
        EngineLocation::Path(path) => Some(path.clone()),
        EngineLocation::SearchPath => which::which(ENGINE_NAME).ok(),
    };

    let mut cmd = Command::new(location.program());
    cmd.arg("-version").stdin(Stdio::null());
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(super::command::CREATE_NO_WINDOW);
    }

    match cmd.output() {
        Ok(output) if output.status.success() => EngineInfo {
            program: location.display(),
            available: true,
            version: String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|line| line.trim().to_string()),
            resolved,
        },
        _ => EngineInfo {
            program: location.display(),
            available: false,
            version: None,
            resolved,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    #[test]
    fn missing_bundle_falls_back_to_search_path() {
        let root = tempfile::tempdir().unwrap();
        let locator = Locator::new().with_root(root.path());
        assert_eq!(locator.locate(), EngineLocation::SearchPath);
        assert_eq!(locator.locate().program(), OsStr::new("ffmpeg"));
    }

    #[test]
    fn bundled_copy_is_preferred_when_present() {
        let root = tempfile::tempdir().unwrap();
        let candidate = bundled_path(root.path());
        fs::create_dir_all(candidate.parent().unwrap()).unwrap();
        fs::write(&candidate, b"").unwrap();

        let locator = Locator::new().with_root(root.path());
        assert_eq!(locator.locate(), EngineLocation::Path(candidate.clone()));

        // Re-resolved each call: removing the bundle switches back to PATH.
        fs::remove_file(&candidate).unwrap();
        assert_eq!(locator.locate(), EngineLocation::SearchPath);
    }

    #[test]
    fn bundled_name_follows_platform_suffix() {
        let path = bundled_path(Path::new("base"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        if cfg!(windows) {
            assert_eq!(name, "ffmpeg.exe");
        } else {
            assert_eq!(name, "ffmpeg");
        }
        assert!(path.starts_with(Path::new("base").join("ffmpeg").join("bin")));
    }

    #[test]
    fn explicit_engine_is_returned_even_if_missing() {
        let locator = Locator::new().with_engine("/definitely/not/here/ffmpeg");
        assert_eq!(
            locator.locate(),
            EngineLocation::Path(PathBuf::from("/definitely/not/here/ffmpeg"))
        );
    }

    #[test]
    fn check_engine_reports_unavailable_binary() {
        let info = check_engine(&EngineLocation::Path(PathBuf::from(
            "/definitely/not/here/ffmpeg",
        )));
        assert!(!info.available);
        assert!(info.version.is_none());
    }
}
