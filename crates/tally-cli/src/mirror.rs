//! Post-write mirroring of the statistics document to a second file.
//!
//! Mirroring is best effort: a failed copy is logged and never fails the
//! command that triggered it.

use std::path::PathBuf;

use tally_core::{BlobStore, Clock, StatsEngine};
use tally_db::JsonFileStore;

/// Rewrites `path` with the full document after every successful write.
pub fn install<S: BlobStore, C: Clock>(engine: &mut StatsEngine<S, C>, path: PathBuf) {
    let key = engine.options().document_key.clone();
    let mut target = JsonFileStore::single(&path);
    tracing::debug!(path = %path.display(), "mirroring statistics document");

    engine.set_post_write_hook(move |doc| {
        let json = match doc.to_json() {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode document for mirror");
                return;
            }
        };
        if let Err(err) = target.set(&key, &json) {
            tracing::warn!(path = %path.display(), error = %err, "failed to mirror statistics document");
        }
    });
}
