use anyhow::{anyhow, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use sentinel_application::commands::sentinel_commands;
use sentinel_application::AppState;
use sentinel_infrastructure::schedule_sentinel;
use sentinel_interfaces_http::build_router;

use crate::context::AppContext;

fn build_router_with_layers(state: AppState) -> Router {
    build_router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(
            usize::try_from(state.config.max_body_bytes).unwrap_or(usize::MAX),
        ))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(
            state.config.request_timeout_seconds,
        )))
        .layer(TraceLayer::new_for_http())
}

pub async fn run_standalone() -> Result<()> {
    let context = AppContext::new().await?;
    let state = context.state;

    if state.config.scan_interval_seconds > 0 {
        tokio::spawn(schedule_sentinel(state.clone()));
    } else {
        info!("periodic sentinel disabled; passes run on demand only");
    }

    let app = build_router_with_layers(state.clone());
    let addr: std::net::SocketAddr = state.config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    state.notifier.flush().await;
    Ok(())
}

pub async fn run_once() -> Result<()> {
    let context = AppContext::new().await?;
    run_pass_and_print(&context.state).await
}

async fn run_pass_and_print(state: &AppState) -> Result<()> {
    let pass = sentinel_commands::run_sentinel_pass(state)
        .await
        .map_err(|err| anyhow!("sentinel pass failed: {:#}", err))?;
    for report in &pass.reports {
        println!("{}", report);
    }
    state.notifier.flush().await;
    if pass.users_failed > 0 {
        warn!(users_failed = pass.users_failed, "some users were skipped");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("ctrl-c handler failed: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("sigterm handler failed: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
