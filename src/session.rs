//! Generation session
//!
//! Owns everything a shell needs to drive generation: configuration, the
//! Data Store, the history, the random source and the remote backend. Every
//! generating call takes `&mut self`, so one session's history is never
//! mutated from two calls at once.

use crate::core::config::AppConfig;
use crate::core::error::Result;
use crate::core::types::{Gender, Generated, Mode};
use crate::data::store::DataStore;
use crate::generator::batch::{run_batch, BatchPlan, Pause};
use crate::generator::offline;
use crate::generator::remote::RemoteGenerator;
use crate::history::HistoryLog;
use crate::llm::client::{BlockingClient, CompletionBackend};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use std::time::Duration;

pub struct Session {
    config: AppConfig,
    data: DataStore,
    history: HistoryLog,
    rng: ChaCha8Rng,
    remote: RemoteGenerator,
}

impl Session {
    /// Build a session from already-loaded parts with an empty history
    pub fn new(config: AppConfig, data: DataStore, backend: Box<dyn CompletionBackend>) -> Self {
        let rng = match config.settings.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let remote = RemoteGenerator::new(config.remote_service(), backend);
        Self {
            config,
            data,
            history: HistoryLog::new(),
            rng,
            remote,
        }
    }

    /// Load config, data and (when saving is enabled) the previous history.
    ///
    /// Unreadable config or data files fall back to defaults; only failing
    /// to set up the HTTP client is an error.
    pub fn open(config_path: &Path) -> Result<Self> {
        let config = AppConfig::load_or_default(config_path);
        let data = DataStore::load_or_empty(&config.data_file);
        let backend = BlockingClient::new(Duration::from_secs(
            config.settings.request_timeout_secs,
        ))?;

        let mut session = Self::new(config, data, Box::new(backend));
        if session.config.settings.save_history {
            session.history = HistoryLog::load_or_empty(&session.config.settings.history_file);
        }
        Ok(session)
    }

    /// Replace the history, e.g. with one loaded elsewhere
    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = history;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Bare name from the Data Store; never recorded in the history
    pub fn generate_name(&mut self, gender: Gender, style: &str) -> String {
        offline::generate_name(&self.data, gender, style, &mut self.rng)
    }

    /// Name followed by a title when one resolves
    pub fn generate_name_with_title(&mut self, gender: Gender, style: &str) -> String {
        offline::generate_name_with_title(&self.data, gender, style, &mut self.rng)
    }

    /// Offline generation; detailed records are appended to the history
    pub fn generate_offline(&mut self, gender: Gender, style: &str, detailed: bool) -> Generated {
        if !detailed {
            return Generated::Name(self.generate_name(gender, style));
        }
        let record = offline::generate_character(&self.data, gender, style, &mut self.rng);
        tracing::debug!("Generated offline character {}", record.name);
        self.history.append(record.clone());
        Generated::Character(record)
    }

    /// Remote generation; returned records are appended to the history
    pub fn generate_remote(
        &mut self,
        gender: Gender,
        style: &str,
        detailed: bool,
    ) -> Result<Generated> {
        let generated = self
            .remote
            .generate(&self.data, gender, style, detailed, &mut self.rng)?;
        if let Generated::Character(record) = &generated {
            self.history.append(record.clone());
        }
        Ok(generated)
    }

    pub fn generate(
        &mut self,
        mode: Mode,
        gender: Gender,
        style: &str,
        detailed: bool,
    ) -> Result<Generated> {
        match mode {
            Mode::Offline => Ok(self.generate_offline(gender, style, detailed)),
            Mode::Remote => self.generate_remote(gender, style, detailed),
        }
    }

    /// Generate `count` items one after another, reporting each as it lands
    #[allow(clippy::too_many_arguments)]
    pub fn generate_batch<P, F>(
        &mut self,
        mode: Mode,
        gender: Gender,
        style: &str,
        detailed: bool,
        count: usize,
        pause: &mut P,
        on_progress: F,
    ) -> Vec<Result<Generated>>
    where
        P: Pause + ?Sized,
        F: FnMut(usize, &Result<Generated>),
    {
        let plan = BatchPlan {
            mode,
            count,
            delay: Duration::from_millis(self.config.settings.batch_delay_ms),
        };
        tracing::info!("Generating {} characters ({:?} mode)", count, mode);
        run_batch(
            plan,
            || self.generate(mode, gender, style, detailed),
            pause,
            on_progress,
        )
    }

    /// Whether the history is loaded from and written to the configured file
    pub fn history_saving_enabled(&self) -> bool {
        self.config.settings.save_history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Write the history to an arbitrary path
    pub fn export_history(&self, path: &Path) -> Result<()> {
        self.history.save(path)?;
        tracing::info!("History exported to {}", path.display());
        Ok(())
    }

    /// Write the history to the configured file when saving is enabled.
    ///
    /// Returns whether anything was written.
    pub fn persist_history(&self) -> Result<bool> {
        if !self.history_saving_enabled() {
            return Ok(false);
        }
        self.history.save(&self.config.settings.history_file)?;
        Ok(true)
    }
}
