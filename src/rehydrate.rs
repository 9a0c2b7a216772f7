//! Session rehydration
//!
//! Reconstructs a completed session purely from its shareable identifier:
//! refetch the result table, the generated summary, and the original images
//! named by the manifest, then show every fixed pipeline stage completed.
//!
//! Rehydration fails as a unit. If any fetch fails (table, summary, or any
//! single asset) the whole reconstruction aborts: the identifier is
//! cleared, zero assets are retained, and the failure surfaces as
//! [`Error::ExpiredSession`] so the user sees "expired" rather than a
//! generic fault.

use tracing::{info, warn};

use crate::assets::FileAsset;
use crate::client::Backend;
use crate::error::{Error, Result};
use crate::models::record::{manifest_file_names, Record};
use crate::models::session::{Session, SessionPhase};
use crate::table;

/// Rehydrate `session` (which must be idle) from a session identifier.
///
/// On success the session is `Completed` and fully populated; on failure it
/// is `Failed(Expired)` with `id == None` and no partial state, and the
/// underlying error is returned for display.
pub async fn rehydrate<B: Backend>(
    backend: &B,
    session: &mut Session,
    session_id: &str,
) -> Result<()> {
    debug_assert_eq!(session.phase(), SessionPhase::Idle);
    session.begin_rehydration(session_id);

    match fetch_completed_run(backend, session_id).await {
        Ok((table, summary, assets)) => {
            info!(
                session_id = %session_id,
                rows = table.len(),
                assets = assets.len(),
                "Session rehydrated"
            );
            session.complete_rehydration(table, summary, assets);
            Ok(())
        }
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Rehydration failed");
            session.fail_rehydration();
            match e {
                expired @ Error::ExpiredSession(_) => Err(expired),
                other => Err(Error::ExpiredSession(other.to_string())),
            }
        }
    }
}

/// The suspension points, in contract order: table, summary, then each
/// asset sequentially. The sequential loop is what guarantees that asset
/// materialization order matches manifest order, which last-write-wins
/// name indexing depends on.
async fn fetch_completed_run<B: Backend>(
    backend: &B,
    session_id: &str,
) -> Result<(Vec<Record>, String, Vec<FileAsset>)> {
    let table_text = backend.fetch_result_table(session_id).await?;
    let records = table::parse_delimited(&table_text)?;

    let summary = backend.fetch_summary(session_id).await?;

    let file_names = manifest_file_names(&records);
    let mut assets = Vec::with_capacity(file_names.len());
    for name in &file_names {
        let asset = backend.fetch_asset(session_id, name).await?;
        assets.push(asset);
    }

    Ok((records, summary, assets))
}
