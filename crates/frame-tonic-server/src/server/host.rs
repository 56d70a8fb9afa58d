//! Process-level orchestration of the RPC and health listeners.
//!
//! [`ServiceHost`] launches each listener's `start` as an independent Tokio
//! task in a [`JoinSet`] and then only waits for tasks to *finish*; it never
//! waits for a listener to become ready. Listener tasks report their outcome
//! as a value and never end the process themselves. The host is the single
//! owner of that decision:
//!
//! - the first listener error moves the host to [`HostState::Failed`], the
//!   remaining task is aborted and the error is returned (exit status 1);
//! - a listener task that panics counts as a serve failure of that listener;
//! - a listener that returns cleanly is recorded and the host keeps waiting;
//!   once none are left the host is [`HostState::Stopped`];
//! - if the stop future (SIGINT/SIGTERM for [`ServiceHost::run`]) resolves
//!   while both listeners are healthy, the host stops and returns `Ok`.

use crate::server::{
    config::HostConfig,
    error::{HostError, ListenerError, report},
    listener::{ListenerKind, health::HealthListener, rpc::RpcListener},
    telemetry::increment_listener_failures,
};
use std::collections::HashMap;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::{Id, JoinError, JoinSet};

/// Lifecycle of the service host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostState {
    /// Nothing launched yet.
    Initial,
    /// Listener tasks are being spawned.
    Launching,
    /// Both listener tasks are spawned and binding or serving.
    Running,
    /// A listener failed. Terminal.
    Failed {
        listener: ListenerKind,
        error: String,
    },
    /// Stopped externally, or every listener returned without error. Terminal.
    Stopped,
}

impl HostState {
    #[cfg(test)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, HostState::Failed { .. } | HostState::Stopped)
    }
}

pub struct ServiceHost {
    config: HostConfig,
    state: watch::Sender<HostState>,
}

impl ServiceHost {
    pub fn new(config: HostConfig) -> Self {
        let (state, _) = watch::channel(HostState::Initial);
        Self { config, state }
    }

    /// Observes state transitions. Receivers stay valid after the host is
    /// gone and keep the last published state.
    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<HostState> {
        self.state.subscribe()
    }

    /// Runs both listeners until one fails or the process receives SIGINT or
    /// SIGTERM.
    pub async fn run(self) -> Result<(), HostError> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs both listeners until one fails or `stop` resolves.
    pub async fn run_until<F>(self, stop: F) -> Result<(), HostError>
    where
        F: Future<Output = ()>,
    {
        self.transition(HostState::Launching);

        let mut tasks = JoinSet::new();
        let mut listeners: HashMap<Id, ListenerKind> = HashMap::with_capacity(2);

        // RPC goes first by convention. Spawning never waits on the task, so
        // its serve loop cannot delay the health listener.
        let rpc = tasks.spawn(RpcListener::start(self.config.rpc.clone()));
        listeners.insert(rpc.id(), ListenerKind::Rpc);
        let health = tasks.spawn(HealthListener::start(self.config.health.clone()));
        listeners.insert(health.id(), ListenerKind::Health);

        self.transition(HostState::Running);
        self.supervise(tasks, &listeners, stop).await
    }

    /// Waits for the first listener task to fail, or for `stop`. Dropping
    /// `tasks` on return aborts whatever is still running.
    async fn supervise<F>(
        &self,
        mut tasks: JoinSet<Result<(), ListenerError>>,
        listeners: &HashMap<Id, ListenerKind>,
        stop: F,
    ) -> Result<(), HostError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        loop {
            tokio::select! {
                joined = tasks.join_next_with_id() => match joined {
                    None => {
                        self.transition(HostState::Stopped);
                        return Ok(());
                    }
                    Some(Ok((_id, Ok(())))) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("{} listener returned without error", listeners[&_id]);
                    }
                    Some(Ok((_, Err(err)))) => return Err(self.fail(err)),
                    Some(Err(err)) => {
                        let listener = listeners[&err.id()];
                        return Err(self.fail(panicked(listener, err)));
                    }
                },
                () = &mut stop => {
                    #[cfg(feature = "tracing")]
                    tracing::info!("Stop requested, shutting listeners down");
                    self.transition(HostState::Stopped);
                    return Ok(());
                }
            }
        }
    }

    fn fail(&self, err: ListenerError) -> HostError {
        let listener = err.listener();

        #[cfg(feature = "tracing")]
        tracing::error!("{}", report(&err));

        increment_listener_failures(listener);
        self.transition(HostState::Failed {
            listener,
            error: report(&err),
        });
        HostError::from(err)
    }

    fn transition(&self, next: HostState) {
        #[cfg(feature = "tracing")]
        tracing::debug!("Service host: {:?}", next);

        self.state.send_replace(next);
    }
}

fn panicked(listener: ListenerKind, err: JoinError) -> ListenerError {
    ListenerError::serve(listener, err)
}

/// Resolves on Ctrl+C, or SIGTERM on unix. If a handler cannot be installed
/// that branch never resolves.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Failed to install SIGTERM handler: {_e}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    let ctrl_c = async {
        if let Err(_e) = signal::ctrl_c().await {
            #[cfg(feature = "tracing")]
            tracing::warn!("Failed to install Ctrl+C handler: {_e}");
            core::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received SIGTERM signal");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::ListenerConfig;
    use crate::server::listener::test_support::{free_addr, http_request};
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    const DEADLINE: Duration = Duration::from_secs(10);

    fn config(rpc: impl Into<String>, health: impl Into<String>) -> HostConfig {
        HostConfig {
            rpc: ListenerConfig::new(rpc),
            health: ListenerConfig::new(health),
        }
    }

    async fn wait_for_health(addr: std::net::SocketAddr) -> String {
        timeout(DEADLINE, async {
            loop {
                if tokio::net::TcpStream::connect(addr).await.is_ok() {
                    return http_request(addr, "GET", "/health").await;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("health listener never came up")
    }

    #[test]
    fn starts_in_initial_state() {
        let host = ServiceHost::new(config("127.0.0.1:0", "127.0.0.1:0"));
        assert_eq!(*host.subscribe().borrow(), HostState::Initial);
    }

    #[tokio::test]
    async fn rpc_bind_failure_names_the_rpc_listener() {
        let host = ServiceHost::new(config("not-an-address", "127.0.0.1:0"));
        let state = host.subscribe();

        let err = timeout(DEADLINE, host.run_until(core::future::pending()))
            .await
            .expect("host should fail fast")
            .unwrap_err();

        assert_eq!(err.listener(), ListenerKind::Rpc);
        let HostError::ListenerFailed { source, .. } = &err;
        assert!(matches!(source, ListenerError::Bind { .. }));
        assert!(matches!(
            &*state.borrow(),
            HostState::Failed {
                listener: ListenerKind::Rpc,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn occupied_health_address_fails_the_host() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap().to_string();
        let host = ServiceHost::new(config("127.0.0.1:0", addr.clone()));
        let state = host.subscribe();

        let err = timeout(DEADLINE, host.run_until(core::future::pending()))
            .await
            .expect("host should fail fast")
            .unwrap_err();

        assert_eq!(err.listener(), ListenerKind::Health);
        match &*state.borrow() {
            HostState::Failed { listener, error } => {
                assert_eq!(*listener, ListenerKind::Health);
                assert!(error.contains(&addr), "{error}");
            }
            other => panic!("expected failed state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn same_address_for_both_listeners_fails_one_of_them() {
        let addr = free_addr().to_string();
        let host = ServiceHost::new(config(addr.clone(), addr));

        let err = timeout(DEADLINE, host.run_until(core::future::pending()))
            .await
            .expect("host should fail fast")
            .unwrap_err();

        assert!(matches!(
            err,
            HostError::ListenerFailed {
                source: ListenerError::Bind { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn health_comes_up_while_rpc_fails() {
        let health_addr = free_addr();
        let rpc = tokio::spawn(RpcListener::start(ListenerConfig::new("not-an-address")));
        let health = tokio::spawn(HealthListener::start(ListenerConfig::new(
            health_addr.to_string(),
        )));

        let rpc_err = rpc.await.unwrap().unwrap_err();
        assert_eq!(rpc_err.listener(), ListenerKind::Rpc);

        let response = wait_for_health(health_addr).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
        health.abort();
    }

    #[tokio::test]
    async fn healthy_host_runs_until_stopped() {
        let health_addr = free_addr();
        let host = ServiceHost::new(config("127.0.0.1:0", health_addr.to_string()));
        let mut state = host.subscribe();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let running = tokio::spawn(host.run_until(async {
            let _ = stop_rx.await;
        }));

        state
            .wait_for(|s| *s == HostState::Running)
            .await
            .expect("host state channel");
        let response = wait_for_health(health_addr).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");

        stop_tx.send(()).unwrap();
        timeout(DEADLINE, running)
            .await
            .expect("host should stop")
            .unwrap()
            .expect("stopping a healthy host is not an error");
        assert_eq!(*state.borrow(), HostState::Stopped);
        assert!(state.borrow().is_terminal());
    }

    #[tokio::test]
    async fn panicking_listener_fails_the_host() {
        let host = ServiceHost::new(config("127.0.0.1:0", "127.0.0.1:0"));
        let state = host.subscribe();
        let mut tasks = JoinSet::new();
        let mut listeners = HashMap::new();

        let rpc = tasks.spawn(core::future::pending::<Result<(), ListenerError>>());
        listeners.insert(rpc.id(), ListenerKind::Rpc);
        let health = tasks.spawn(async { panic!("health listener exploded") });
        listeners.insert(health.id(), ListenerKind::Health);

        let err = timeout(
            DEADLINE,
            host.supervise(tasks, &listeners, core::future::pending()),
        )
        .await
        .expect("host should fail fast")
        .unwrap_err();

        assert_eq!(err.listener(), ListenerKind::Health);
        let HostError::ListenerFailed { source, .. } = &err;
        assert!(matches!(
            source,
            ListenerError::Serve {
                listener: ListenerKind::Health,
                ..
            }
        ));
        assert!(matches!(
            &*state.borrow(),
            HostState::Failed {
                listener: ListenerKind::Health,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn listeners_returning_cleanly_stop_the_host() {
        let host = ServiceHost::new(config("127.0.0.1:0", "127.0.0.1:0"));
        let state = host.subscribe();
        let mut tasks = JoinSet::new();
        let mut listeners = HashMap::new();

        let rpc = tasks.spawn(async { Ok::<(), ListenerError>(()) });
        listeners.insert(rpc.id(), ListenerKind::Rpc);
        let health = tasks.spawn(async { Ok(()) });
        listeners.insert(health.id(), ListenerKind::Health);

        timeout(
            DEADLINE,
            host.supervise(tasks, &listeners, core::future::pending()),
        )
        .await
        .expect("host should stop once no listener is left")
        .expect("clean returns are not an error");

        assert_eq!(*state.borrow(), HostState::Stopped);
        assert!(state.borrow().is_terminal());
    }
}
