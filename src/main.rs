//! Process entrypoint: load configuration, connect the database, build the
//! shared service bundle, then bind one TCP listener per role/dialect port
//! plus the admin HTTP listener, all driven off the same [`AppState`].

mod config;
mod database;
mod errors;
mod http;
mod protocol;
mod roles;
mod services;
mod session;
mod state;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info};
use tokio::net::TcpListener;
use tokio::signal;

use config::Config;
use protocol::Dialect;
use services::Services;
use session::Router;
use state::AppState;

#[tokio::main]
async fn main() {
    let config = config::load_config().unwrap_or_default();
    utils::logging::setup(config.logging);
    log_panics::init();

    let config = Arc::new(config);

    let db = match database::connect(&config.database_file).await {
        Ok(db) => db,
        Err(err) => {
            error!("failed to connect to database: {err:?}");
            std::process::exit(1);
        }
    };

    let services = Arc::new(Services::new(&config));
    let state = Arc::new(AppState {
        config: config.clone(),
        db: db.clone(),
        services: services.clone(),
    });

    tokio::spawn(services::wan_ip::run(
        services.wan_ip.clone(),
        services.http_client.clone(),
        config.ip_detect_url.clone(),
        config.server_ip.clone(),
    ));
    tokio::spawn(services::tasks::run_day_change_loop(services.lobbies.clone()));
    tokio::spawn(services::tasks::run_rank_recompute_loop(
        db.clone(),
        config.rank_recompute_interval,
    ));

    spawn_dialect_listener(state.clone(), config.ports.news_a, Dialect::A, |_| roles::news::router());
    spawn_dialect_listener(state.clone(), config.ports.news_b, Dialect::B, |_| roles::news::router());

    spawn_dialect_listener(state.clone(), config.ports.login_a, Dialect::A, roles::login::router);
    spawn_dialect_listener(state.clone(), config.ports.login_b, Dialect::B, roles::login::router);

    spawn_role_listener(state.clone(), config.ports.network_menu, |stream, addr, state| {
        tokio::spawn(session::serve_connection(stream, addr, Dialect::A, state, roles::network_menu::router()));
    });

    spawn_dialect_listener(state.clone(), config.ports.main_a, Dialect::A, roles::main_role::router);
    spawn_dialect_listener(state.clone(), config.ports.main_b, Dialect::B, roles::main_role::router);

    tokio::spawn(http::serve(state.clone()));

    info!("fiveserver is up");

    if let Err(err) = signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err:?}");
    }
    info!("shutting down");
}

/// Binds a listener that always builds its router the same way, regardless
/// of which dialect a given connection turns out to carry (News and
/// NetworkMenu have no dialect-specific opcodes).
fn spawn_role_listener<F>(state: Arc<AppState>, port: u16, handle: F)
where
    F: Fn(tokio::net::TcpStream, SocketAddr, Arc<AppState>) + Send + Sync + 'static,
{
    let addr = SocketAddr::from((state.config.host, port));
    tokio::spawn(async move {
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                error!("failed to bind listener on {addr}: {err:?}");
                return;
            }
        };
        info!("listening on {addr}");
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => handle(stream, peer_addr, state.clone()),
                Err(err) => error!("accept failed on {addr}: {err:?}"),
            }
        }
    });
}

/// Binds a listener for a role whose router differs per dialect (Login,
/// Main): the dialect is fixed by which port the client connected to.
fn spawn_dialect_listener<F>(state: Arc<AppState>, port: u16, dialect: Dialect, router_fn: F)
where
    F: Fn(Dialect) -> Router + Send + Sync + 'static,
{
    let addr = SocketAddr::from((state.config.host, port));
    tokio::spawn(async move {
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                error!("failed to bind listener on {addr}: {err:?}");
                return;
            }
        };
        info!("listening on {addr} (dialect {dialect:?})");
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let router = router_fn(dialect);
                    tokio::spawn(session::serve_connection(stream, peer_addr, dialect, state.clone(), router));
                }
                Err(err) => error!("accept failed on {addr}: {err:?}"),
            }
        }
    });
}
