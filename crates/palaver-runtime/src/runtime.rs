//! Main runtime orchestration.
//!
//! The runtime owns the loaded configuration, collects handler chains by
//! path, and serves them over HTTP until a shutdown signal arrives.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use palaver_runtime::PalaverRuntime;
//!
//! // Auto-loads config from the current directory
//! let runtime = PalaverRuntime::new();
//!
//! // Custom configuration path
//! let runtime = PalaverRuntime::builder()
//!     .config_file("config/palaver.toml")
//!     .build()?;
//!
//! runtime.register("/greet", chain)?;
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::{ConfigLoader, ConfigResult, PalaverConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use palaver_framework::{DispatchObserver, Endpoint, HandlerChain, TracingObserver};
use palaver_transport::http::{Router, normalize_path};

/// The Palaver runtime: a set of endpoints served on one HTTP listener.
pub struct PalaverRuntime {
    config: PalaverConfig,
    /// Mounted endpoints keyed by their full path, in registration order.
    routes: Arc<RwLock<Vec<(String, Endpoint)>>>,
    /// Observer attached to chains registered through [`register`](Self::register).
    observer: Arc<dyn DispatchObserver>,
    shutdown: CancellationToken,
}

impl PalaverRuntime {
    /// Creates a runtime with automatic configuration loading.
    ///
    /// Searches the current directory for `palaver.toml` (and the other
    /// supported names), applies `PALAVER_*` environment overrides and
    /// initializes logging. Falls back to defaults if loading fails.
    pub fn new() -> Self {
        Self::builder().build().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config ({e}), using defaults");
            Self::from_config(&PalaverConfig::default())
        })
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a new runtime from configuration and initializes logging.
    pub fn from_config(config: &PalaverConfig) -> Self {
        if let Err(e) = logging::init_from_config(&config.logging) {
            eprintln!("Warning: Failed to initialize logging ({e}), continuing without it");
        }

        info!(
            addr = %config.server.bind_addr(),
            base_path = %config.server.base_path,
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            routes: Arc::new(RwLock::new(Vec::new())),
            observer: Arc::new(TracingObserver),
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &PalaverConfig {
        &self.config
    }

    /// Replaces the observer used for chains registered afterwards.
    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Registers a handler chain at `path`, relative to `server.base_path`.
    ///
    /// Returns the full mounted path.
    pub fn register(&self, path: &str, chain: HandlerChain) -> RuntimeResult<String> {
        let endpoint = Endpoint::new(chain).with_observer(Arc::clone(&self.observer));
        self.register_endpoint(path, endpoint)
    }

    /// Registers a prebuilt endpoint at `path`, relative to `server.base_path`.
    pub fn register_endpoint(&self, path: &str, endpoint: Endpoint) -> RuntimeResult<String> {
        let full_path = join_path(&self.config.server.base_path, path);

        let mut routes = self.routes.write();
        if routes.iter().any(|(existing, _)| *existing == full_path) {
            return Err(RuntimeError::DuplicateRoute(full_path));
        }

        info!(
            path = %full_path,
            handlers = endpoint.chain().len(),
            "Registered route"
        );
        routes.push((full_path.clone(), endpoint));
        Ok(full_path)
    }

    /// Returns the mounted paths in registration order.
    pub fn paths(&self) -> Vec<String> {
        self.routes.read().iter().map(|(p, _)| p.clone()).collect()
    }

    /// Returns the number of registered routes.
    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }

    /// Returns a token that stops a running server when cancelled.
    ///
    /// The token is single-use: once cancelled, later runs stop immediately.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the runtime until Ctrl+C or SIGTERM is received.
    pub async fn run(&self) -> RuntimeResult<()> {
        info!("Palaver runtime is starting. Press Ctrl+C to stop.");
        self.run_until(shutdown_signal()).await
    }

    /// Binds `server.host:server.port` and runs until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let router = self.build_router()?;

        let addr = self.config.server.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RuntimeError::Bind { addr, source })?;

        self.serve_router(listener, router, shutdown).await
    }

    /// Runs on an already bound listener until `shutdown` completes.
    pub async fn serve_on<F>(&self, listener: TcpListener, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let router = self.build_router()?;
        self.serve_router(listener, router, shutdown).await
    }

    fn build_router(&self) -> RuntimeResult<Router> {
        let routes = self.routes.read();
        if routes.is_empty() {
            return Err(RuntimeError::NoRoutes);
        }

        debug!(routes = routes.len(), "Building router");
        let router = palaver_transport::router(
            routes
                .iter()
                .map(|(path, endpoint)| (path.as_str(), endpoint.clone())),
        )?;
        Ok(router)
    }

    async fn serve_router<F>(
        &self,
        listener: TcpListener,
        router: Router,
        shutdown: F,
    ) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let token = self.shutdown.clone();
        let server = palaver_transport::serve(listener, router, token.clone());
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => {
                result?;
                info!("Palaver runtime stopped");
                return Ok(());
            }
            () = shutdown => {
                info!("Shutdown requested, draining in-flight requests");
                token.cancel();
            }
        }

        server.await?;
        info!("Palaver runtime stopped");
        Ok(())
    }
}

impl Default for PalaverRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves when the process receives Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Joins a base path and a route path into one normalized path.
pub fn join_path(base: &str, path: &str) -> String {
    let base = normalize_path(base);
    let path = normalize_path(path);
    match (base.as_str(), path.as_str()) {
        ("/", _) => path,
        (_, "/") => base,
        _ => format!("{base}{path}"),
    }
}

/// Builder for creating a [`PalaverRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Applies `PALAVER_*` environment overrides (the default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Ignores `PALAVER_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: PalaverConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads, validates and builds the runtime.
    pub fn build(self) -> ConfigResult<PalaverRuntime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;
        Ok(PalaverRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
