use std::future::Future;

use sea_orm::ConnectionTrait;
use tracing::{debug, warn};

use crate::dialect::TruncationAdapter;
use crate::error::CleanerError;

/// Run `f` with referential integrity suspended.
///
/// Enforcement is restored once `f` has finished, whether it succeeded or
/// not. If `f` fails, its error is returned and a restore failure is only
/// logged; if `f` succeeds, a restore failure is the result.
///
/// A failure while disabling is returned immediately and `f` never runs.
pub async fn without_referential_integrity<A, C, F, Fut, R>(
    adapter: &A,
    conn: &C,
    f: F,
) -> Result<R, CleanerError>
where
    A: TruncationAdapter,
    C: ConnectionTrait,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<R, CleanerError>>,
{
    let dialect = adapter.dialect();
    let saved = adapter.disable_referential_integrity(conn).await?;
    debug!(%dialect, "referential_integrity=disabled");

    let out = f().await;

    let restored = adapter.restore_referential_integrity(conn, saved).await;
    match (out, restored) {
        (Ok(val), Ok(())) => {
            debug!(%dialect, "referential_integrity=restored");
            Ok(val)
        }
        (Ok(_), Err(restore_err)) => Err(restore_err.into()),
        (Err(err), Ok(())) => {
            debug!(%dialect, "referential_integrity=restored after failure");
            Err(err)
        }
        (Err(err), Err(restore_err)) => {
            warn!(
                %dialect,
                error = %restore_err,
                "failed to restore referential integrity after failed clean"
            );
            Err(err)
        }
    }
}
