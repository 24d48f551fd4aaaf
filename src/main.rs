#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod openapi;
mod route;
mod store;
#[cfg(test)]
mod test;
mod trace;

use route::post::PostService;

pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access.
/// Handlers extract the parts they need through [`axum::extract::FromRef`].
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub posts: PostService,
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = config::Config::from_env().expect("invalid configuration");

	trace::init_tracing_subscriber(config.log_level);

	let store = store::from_config(&config).expect("invalid database configuration");

	if let Err(error) = store.connect().await {
		tracing::error!(%error, "error connecting to database");
		std::process::exit(1);
	}

	tracing::debug!(state = ?store.state(), "store ready");

	let app = route::app(State {
		posts: PostService::new(store.clone()),
	});

	let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on http://{}:{}", config.host, config.port);

	let served = axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await;

	// in-flight requests are done, the connection can go
	store.close().await;

	if let Err(error) = served {
		tracing::error!(%error, "server error");
		std::process::exit(1);
	}
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(error) = tokio::signal::ctrl_c().await {
			tracing::error!(%error, "failed to listen for ctrl+c");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(error) => {
				tracing::error!(%error, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}

	tracing::info!("shutting down");
}
