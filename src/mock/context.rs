//! The reload controller: owns the live rule list and its lifecycle.
//!
//! One `MockContext` is created per process. It starts by compiling the mock
//! configuration; success puts it in `Healthy` mode, failure in `Degraded`
//! mode with an empty rule list. File changes are fed back through
//! [`MockContext::handle_change`], which recompiles and swaps the rule list
//! in a single atomic store. Requests take one snapshot of the list, so they
//! see either the old or the new rules, never a mix.

use std::{
    path::PathBuf,
    sync::{
        Arc, Mutex, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use arc_swap::ArcSwap;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{error, info, warn};

use crate::{
    config::MockSettings,
    errors::MockError,
    mock::{compiler::compile, handler::HandlerRegistry, loader::ConfigLoader, rule::RuleList},
    utils::{diagnostic::render_diagnostic, hot_reload},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMode {
    /// The last initial compile succeeded; later failures keep the old rules.
    Healthy,
    /// The initial compile failed; every request falls through.
    Degraded,
}

pub struct MockContext {
    settings: MockSettings,
    loader: ConfigLoader,
    registry: HandlerRegistry,
    cwd: PathBuf,
    rules: ArcSwap<RuleList>,
    mode: RwLock<ReloadMode>,
    last_error: RwLock<Option<MockError>>,
    failures: AtomicU64,
    watch_task: Mutex<Option<JoinHandle<()>>>,
}

impl MockContext {
    /// Builds a context without compiling anything yet.
    pub fn new(settings: MockSettings, registry: HandlerRegistry) -> Arc<Self> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Arc::new(Self {
            loader: ConfigLoader::new(settings.dir.clone()),
            settings,
            registry,
            cwd,
            rules: ArcSwap::from_pointee(RuleList::default()),
            mode: RwLock::new(ReloadMode::Degraded),
            last_error: RwLock::new(None),
            failures: AtomicU64::new(0),
            watch_task: Mutex::new(None),
        })
    }

    /// Compiles the configuration and, when enabled, starts watching the
    /// mock directory. Watching needs a tokio runtime; outside one it is
    /// skipped with a warning.
    pub fn start(settings: MockSettings, registry: HandlerRegistry) -> Arc<Self> {
        let ctx = Self::new(settings, registry);
        let mode = ctx.apply();
        info!(mode = ?mode, rules = ctx.rules().len(), "Mock middleware ready");

        if ctx.settings.watch {
            match Handle::try_current() {
                Ok(runtime) => {
                    let handle = hot_reload::spawn_watch_task(&runtime, ctx.clone());
                    *ctx.watch_task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                }
                Err(e) => warn!("Not watching mock config: {}", e),
            }
        }
        ctx
    }

    /// Whether a watcher task is currently attached.
    pub fn is_watching(&self) -> bool {
        self.watch_task.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn settings(&self) -> &MockSettings {
        &self.settings
    }

    pub fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    /// Current rule list snapshot.
    pub fn rules(&self) -> Arc<RuleList> {
        self.rules.load_full()
    }

    pub fn mode(&self) -> ReloadMode {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn last_error(&self) -> Option<MockError> {
        self.last_error.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of failed compile attempts, each of which printed one report.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    fn set_mode(&self, mode: ReloadMode) {
        *self.mode.write().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    fn compile_current(&self) -> Result<RuleList, MockError> {
        let mapping = self.loader.load()?;
        compile(&mapping, &self.registry)
    }

    fn install(&self, rules: RuleList) -> usize {
        let count = rules.len();
        self.rules.store(Arc::new(rules));
        *self.last_error.write().unwrap_or_else(PoisonError::into_inner) = None;
        count
    }

    /// Records a failure and prints the console report for it.
    fn report(&self, error: MockError) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        error!(error = %error, "Failed to parse mock config");
        eprintln!("{}", render_diagnostic(&error, &self.loader.display_path(), &self.cwd));
        *self.last_error.write().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Initial transition: compile from scratch. Failure installs an empty
    /// rule list and enters `Degraded`.
    pub fn apply(&self) -> ReloadMode {
        match self.compile_current() {
            Ok(rules) => {
                let count = self.install(rules);
                self.set_mode(ReloadMode::Healthy);
                info!(rules = count, "Mock config applied");
                ReloadMode::Healthy
            }
            Err(e) => {
                self.rules.store(Arc::new(RuleList::default()));
                self.report(e);
                self.set_mode(ReloadMode::Degraded);
                ReloadMode::Degraded
            }
        }
    }

    /// Healthy-mode recompile. On failure the previous rules stay live.
    pub fn reload(&self) -> Result<usize, MockError> {
        match self.compile_current() {
            Ok(rules) => Ok(self.install(rules)),
            Err(e) => {
                self.report(e.clone());
                warn!("Keeping previous mock rules");
                Err(e)
            }
        }
    }

    /// Reacts to one configuration change event and returns the new mode.
    pub fn handle_change(&self) -> ReloadMode {
        match self.mode() {
            ReloadMode::Healthy => {
                let _ = self.reload();
                ReloadMode::Healthy
            }
            ReloadMode::Degraded => self.apply(),
        }
    }

    /// Stops watching. The rule list stays as it is.
    pub fn dispose(&self) {
        if let Some(handle) = self.watch_task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
            info!("Mock config watcher stopped");
        }
    }
}

impl std::fmt::Debug for MockContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockContext")
            .field("mock_dir", &self.settings.dir)
            .field("mode", &self.mode())
            .field("rules", &self.rules().len())
            .field("failures", &self.failure_count())
            .finish()
    }
}
