//! Proxy engine: the owned state behind every control operation.
//!
//! # Responsibilities
//! - Own the route table, log store, forwarder and listener handle
//! - Implement the control surface (status, port, routes, start/stop, logs, replay)
//! - Persist port and routes after every mutation
//!
//! # Design Decisions
//! - One engine instance per proxy; nothing is process-global
//! - Route mutations take effect immediately, running or not
//! - Persistence failures are logged and never fail the operation

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::capture::{LogEntry, LogStore};
use crate::config::{ProxySettings, RelayConfig, SettingsStore};
use crate::error::{ControlError, ReplayError};
use crate::http::{Forwarder, ProxyServer, ProxyState};
use crate::lifecycle::RunningProxy;
use crate::observability::metrics;
use crate::replay::{ReplayOutcome, Replayer};
use crate::routing::{Route, RouteTable};

/// Snapshot returned by [`ProxyEngine::status`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub running: bool,
    pub port: u16,
    pub routes: Vec<Route>,
    pub logs: Vec<LogEntry>,
}

/// The reverse-proxy engine.
pub struct ProxyEngine {
    state: ProxyState,
    replayer: Replayer,
    settings: SettingsStore,
    host: IpAddr,
    max_connections: usize,
    port: AtomicU16,
    running: tokio::sync::Mutex<Option<RunningProxy>>,
    mutation: Mutex<()>,
}

impl ProxyEngine {
    /// Build an engine from the application config and persisted settings.
    pub fn new(config: &RelayConfig, settings: SettingsStore) -> Result<Self, reqwest::Error> {
        let persisted = settings.load();
        let port = persisted
            .port
            .filter(|p| *p != 0)
            .unwrap_or(config.listener.default_port);

        let host = config.listener.host.parse().unwrap_or_else(|_| {
            tracing::warn!(host = %config.listener.host, "Invalid listener host, using 0.0.0.0");
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        });

        let state = ProxyState {
            routes: Arc::new(RouteTable::new(persisted.routes)),
            logs: Arc::new(LogStore::new(config.capture.max_logs)),
            forwarder: Forwarder::new(config.capture.body_limit_bytes)?,
        };

        Ok(Self {
            state,
            replayer: Replayer::new()?,
            settings,
            host,
            max_connections: config.listener.max_connections,
            port: AtomicU16::new(port),
            running: tokio::sync::Mutex::new(None),
            mutation: Mutex::new(()),
        })
    }

    pub fn routes(&self) -> &RouteTable {
        &self.state.routes
    }

    pub fn logs(&self) -> &LogStore {
        &self.state.logs
    }

    pub fn port(&self) -> u16 {
        self.port.load(Ordering::SeqCst)
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Address the data plane is listening on, if running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(RunningProxy::local_addr)
    }

    pub async fn status(&self) -> StatusReport {
        StatusReport {
            running: self.is_running().await,
            port: self.port(),
            routes: self.state.routes.snapshot().as_ref().clone(),
            logs: self.state.logs.list(),
        }
    }

    /// Change the listening port. Only allowed while stopped.
    pub async fn set_port(&self, port: i64) -> Result<(), ControlError> {
        let running = self.running.lock().await;
        if running.is_some() {
            return Err(ControlError::PortWhileRunning);
        }
        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or(ControlError::InvalidPort)?;

        let _guard = self.mutation.lock();
        self.port.store(port, Ordering::SeqCst);
        self.persist();
        tracing::info!(port, "Proxy port changed");
        Ok(())
    }

    pub fn add_route(&self, path_prefix: &str, target_base_url: &str) -> Result<Route, ControlError> {
        let _guard = self.mutation.lock();
        let route = self.state.routes.add(path_prefix, target_base_url)?;
        self.persist();
        tracing::info!(
            route_id = %route.id,
            path_prefix = %route.path_prefix,
            target = %route.target_base_url,
            "Route added"
        );
        Ok(route)
    }

    pub fn remove_route(&self, route_id: &str) -> Result<(), ControlError> {
        let _guard = self.mutation.lock();
        self.state.routes.remove(route_id)?;
        self.persist();
        tracing::info!(route_id, "Route removed");
        Ok(())
    }

    pub fn edit_route(
        &self,
        route_id: &str,
        path_prefix: &str,
        target_base_url: &str,
    ) -> Result<Route, ControlError> {
        let _guard = self.mutation.lock();
        let route = self.state.routes.edit(route_id, path_prefix, target_base_url)?;
        self.persist();
        tracing::info!(
            route_id,
            path_prefix = %route.path_prefix,
            target = %route.target_base_url,
            "Route edited"
        );
        Ok(route)
    }

    /// Flip a route's enabled flag, returning the new value.
    pub fn toggle_route(&self, route_id: &str) -> Result<bool, ControlError> {
        let _guard = self.mutation.lock();
        let enabled = self.state.routes.toggle(route_id)?;
        self.persist();
        tracing::info!(route_id, enabled, "Route toggled");
        Ok(enabled)
    }

    /// Bind the configured port on the listener host and start serving.
    pub async fn start(&self) -> Result<SocketAddr, ControlError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(ControlError::AlreadyRunning);
        }
        if self.state.routes.is_empty() {
            return Err(ControlError::NoRoutes);
        }

        let addr = SocketAddr::new(self.host, self.port());
        let server = ProxyServer::bind(addr, self.max_connections, self.state.clone())
            .await
            .map_err(|source| ControlError::Bind { addr, source })?;
        let local_addr = server.local_addr().unwrap_or(addr);

        *running = Some(RunningProxy::spawn(server, local_addr));
        tracing::info!(address = %local_addr, "Proxy server started");
        Ok(local_addr)
    }

    /// Close the listening socket, aborting in-flight connections.
    pub async fn stop(&self) -> Result<(), ControlError> {
        let mut running = self.running.lock().await;
        let proxy = running.take().ok_or(ControlError::NotRunning)?;
        proxy.stop().await;
        tracing::info!("Proxy server stopped");
        Ok(())
    }

    pub fn clear_logs(&self) {
        self.state.logs.clear();
        tracing::info!("Proxy logs cleared");
    }

    /// Re-issue a captured request against its recorded target.
    pub async fn repeat_request(&self, log_id: &str) -> Result<ReplayOutcome, ReplayError> {
        let entry = self
            .state
            .logs
            .find(log_id)
            .ok_or(ReplayError::LogNotFound)?;

        let result = self.replayer.replay(&entry).await;
        metrics::record_replay(result.is_ok());
        match &result {
            Ok(outcome) => tracing::info!(log_id, status = outcome.status, "Request replayed"),
            Err(e) => tracing::warn!(log_id, error = %e, "Replay failed"),
        }
        result
    }

    fn persist(&self) {
        let settings = ProxySettings {
            port: Some(self.port()),
            routes: self.state.routes.snapshot().as_ref().clone(),
        };
        if let Err(e) = self.settings.save(&settings) {
            tracing::error!(path = ?self.settings.path(), error = %e, "Error saving proxy settings");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(dir: &tempfile::TempDir) -> ProxyEngine {
        let mut config = RelayConfig::default();
        config.listener.host = "127.0.0.1".into();
        let store = SettingsStore::new(dir.path().join("proxy-config.json"));
        ProxyEngine::new(&config, store).unwrap()
    }

    #[tokio::test]
    async fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        let status = engine.status().await;

        assert!(!status.running);
        assert_eq!(status.port, 8080);
        assert!(status.routes.is_empty());
        assert!(status.logs.is_empty());
    }

    #[tokio::test]
    async fn test_set_port_range() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);

        assert!(matches!(engine.set_port(0).await, Err(ControlError::InvalidPort)));
        assert!(matches!(engine.set_port(65536).await, Err(ControlError::InvalidPort)));
        assert!(matches!(engine.set_port(-1).await, Err(ControlError::InvalidPort)));
        engine.set_port(65535).await.unwrap();
        assert_eq!(engine.port(), 65535);
    }

    #[tokio::test]
    async fn test_start_without_routes_fails() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);

        assert!(matches!(engine.start().await, Err(ControlError::NoRoutes)));
        assert!(!engine.is_running().await);
    }

    #[tokio::test]
    async fn test_stop_while_stopped_fails() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        assert!(matches!(engine.stop().await, Err(ControlError::NotRunning)));
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        {
            let engine = engine(&dir);
            engine.set_port(9100).await.unwrap();
            let route = engine.add_route("/svc", "http://localhost:9000").unwrap();
            engine.toggle_route(&route.id).unwrap();
        }

        let reloaded = engine(&dir);
        assert_eq!(reloaded.port(), 9100);
        let routes = reloaded.routes().snapshot();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path_prefix, "/svc");
        assert!(!routes[0].enabled);
    }

    #[tokio::test]
    async fn test_route_errors_do_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);

        assert!(matches!(
            engine.add_route("svc", "http://h"),
            Err(ControlError::InvalidPathPrefix)
        ));
        assert!(matches!(
            engine.remove_route("missing"),
            Err(ControlError::RouteNotFound)
        ));
        assert!(!dir.path().join("proxy-config.json").exists());
    }

    #[tokio::test]
    async fn test_repeat_unknown_log() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        assert!(matches!(
            engine.repeat_request("nope").await,
            Err(ReplayError::LogNotFound)
        ));
    }

    #[tokio::test]
    async fn test_invalid_persisted_port_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("proxy-config.json"),
            r#"{"port":70000,"routes":[{"id":"r1","pathPrefix":"/a","targetBaseUrl":"http://h","enabled":true}]}"#,
        )
        .unwrap();

        let engine = engine(&dir);
        assert_eq!(engine.port(), 8080);
        assert_eq!(engine.routes().len(), 1);
    }
}
