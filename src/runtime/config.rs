//! Runtime configuration resolved at graph-build time.

use std::path::PathBuf;

use uuid::Uuid;

/// Tunables the executor and demo binary read from the compiled workflow.
///
/// All fields have working defaults; environment overrides are picked up
/// through `dotenvy`, so a local `.env` file works the same as exported
/// variables.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Thread id used when the caller does not pick one.
    pub default_thread_id: String,
    /// Hard cap on node executions per run, so a routing cycle cannot spin
    /// forever.
    pub max_steps: u64,
    /// Where the best-effort PNG rendering of the graph lands.
    pub visualization_path: PathBuf,
}

impl RuntimeConfig {
    pub const DEFAULT_MAX_STEPS: u64 = 64;
    pub const DEFAULT_VIZ_PATH: &'static str = "graph_visualization.png";

    fn resolve_visualization_path(provided: Option<PathBuf>) -> PathBuf {
        if let Some(path) = provided {
            return path;
        }
        dotenvy::dotenv().ok();
        std::env::var("THREADLOOM_VIZ_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(Self::DEFAULT_VIZ_PATH))
    }

    fn resolve_thread_id(provided: Option<String>) -> String {
        if let Some(id) = provided {
            return id;
        }
        dotenvy::dotenv().ok();
        std::env::var("THREADLOOM_THREAD_ID")
            .unwrap_or_else(|_| format!("thread-{}", Uuid::new_v4()))
    }

    #[must_use]
    pub fn new(default_thread_id: Option<String>, visualization_path: Option<PathBuf>) -> Self {
        Self {
            default_thread_id: Self::resolve_thread_id(default_thread_id),
            max_steps: Self::DEFAULT_MAX_STEPS,
            visualization_path: Self::resolve_visualization_path(visualization_path),
        }
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = if max_steps == 0 {
            Self::DEFAULT_MAX_STEPS
        } else {
            max_steps
        };
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(None, None)
    }
}
