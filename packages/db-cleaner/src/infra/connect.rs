use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{info, warn};

use crate::dialect::Dialect;
use crate::error::CleanerError;

const NETWORK_CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Open a pool pinned to exactly one session.
///
/// Session switches such as `SET FOREIGN_KEY_CHECKS` must land on the same
/// physical connection as the truncation that follows, which a wider pool
/// does not guarantee. Network databases get a few retries while the server
/// comes up; SQLite connects once.
pub async fn connect_single_session(url: &str) -> Result<DatabaseConnection, CleanerError> {
    let dialect = Dialect::from_url(url)?;
    let attempts = match dialect {
        Dialect::MySql | Dialect::Postgres => NETWORK_CONNECT_ATTEMPTS,
        Dialect::Sqlite => 1,
    };
    open_single_session(url, dialect, attempts, CONNECT_RETRY_INTERVAL).await
}

async fn open_single_session(
    url: &str,
    dialect: Dialect,
    attempts: u32,
    interval: Duration,
) -> Result<DatabaseConnection, CleanerError> {
    let sanitized = sanitize_db_url(url);
    let mut opt = ConnectOptions::new(url);
    opt.min_connections(1)
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(2))
        .sqlx_logging(false);

    let mut attempt = 0;
    loop {
        attempt += 1;
        match Database::connect(opt.clone()).await {
            Ok(conn) => {
                info!(%dialect, url = %sanitized, attempt, "connected");
                return Ok(conn);
            }
            Err(e) if attempt < attempts => {
                warn!(
                    %dialect,
                    url = %sanitized,
                    attempt,
                    attempts,
                    error = %e,
                    "database not reachable yet, retrying"
                );
                tokio::time::sleep(interval).await;
            }
            Err(e) => {
                return Err(CleanerError::config(format!(
                    "cannot open a cleaning session on {sanitized} after {attempt} attempt(s): {e}"
                )));
            }
        }
    }
}

/// Mask the password of a connection URL for logging.
pub fn sanitize_db_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    let Some(at) = authority.rfind('@') else {
        return url.to_string();
    };
    let (userinfo, host) = authority.split_at(at);
    match userinfo.find(':') {
        Some(colon) => format!("{scheme}://{}:***{host}{tail}", &userinfo[..colon]),
        None => url.to_string(),
    }
}
