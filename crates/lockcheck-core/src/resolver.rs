use crate::config::EngineConfig;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("failed to start resolver '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("resolver '{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{0}")]
    Other(String),
}

/// Installer run after the installed manifest has been repaired, so the
/// project picks up the new versions. Wired explicitly by the host.
pub trait ExternalResolver: Send + Sync {
    fn name(&self) -> &str;

    fn trigger(&self) -> Result<(), ResolverError>;
}

/// Runs a program; a non-zero exit status counts as failure.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandResolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl ExternalResolver for CommandResolver {
    fn name(&self) -> &str {
        &self.program
    }

    fn trigger(&self) -> Result<(), ResolverError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        debug!("running resolver: {} {}", self.program, self.args.join(" "));
        let output = cmd.output().map_err(|source| ResolverError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(ResolverError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(())
    }
}

/// Build the configured resolver, if any, running in `project_root`.
pub fn resolver_from_config(
    config: &EngineConfig,
    project_root: impl Into<PathBuf>,
) -> Option<CommandResolver> {
    let (program, args) = config.resolver_command.split_first()?;
    Some(
        CommandResolver::new(program.clone())
            .with_args(args.iter().cloned())
            .in_dir(project_root),
    )
}

/// Resolver that records how often it was triggered, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MockResolver {
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExternalResolver for MockResolver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn trigger(&self) -> Result<(), ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(reason) => Err(ResolverError::Other(reason.clone())),
            None => Ok(()),
        }
    }
}
