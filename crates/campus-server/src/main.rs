mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{
    HeaderValue, Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use argon2::Params;
use campus_api::password::Passwords;
use campus_api::session::{CookieSettings, SessionKeys};
use campus_api::state::{AppState, AppStateInner};
use campus_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "campus=debug,campus_api=debug,campus_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {:#}", e);
            eprintln!("       Check your environment or .env file and restart.");
            std::process::exit(1);
        }
    };

    // Init database
    let db = Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        sessions: SessionKeys::new(&config.jwt_secret),
        passwords: Passwords::new(Params::default())
            .map_err(|e| anyhow::anyhow!("password hasher setup failed: {}", e))?,
        cookies: CookieSettings {
            domain: config.cookie_domain.clone(),
            secure: config.cookie_secure,
        },
    });

    let app = campus_api::router(state)
        .layer(cors_layer(&config.cors_origins)?)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Campus server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router, and with it the last handle to the database, is dropped here
    info!("Server stopped");
    Ok(())
}

/// Credentialed CORS for the configured frontends. With none configured any origin
/// may call, but browsers will not attach the session cookie cross-site.
fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.is_empty() {
        warn!("CAMPUS_CORS_ORIGINS is empty, cross-site requests will not carry the session cookie");
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|o| o.parse())
        .collect::<Result<Vec<HeaderValue>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, header},
        routing::get,
    };
    use tower::ServiceExt;

    async fn preflight(origins: &[String], origin: &str) -> axum::http::HeaderMap {
        let app = Router::new()
            .route("/api/auth/user", get(|| async { "ok" }))
            .layer(cors_layer(origins).unwrap());
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/auth/user")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        app.oneshot(req).await.unwrap().headers().clone()
    }

    #[tokio::test]
    async fn configured_origins_get_credentials() {
        let origins = vec!["https://app.example".to_string()];
        let headers = preflight(&origins, "https://app.example").await;

        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn no_origins_means_no_credentials() {
        let headers = preflight(&[], "https://app.example").await;

        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS));
    }

    #[test]
    fn malformed_origin_is_an_error() {
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
