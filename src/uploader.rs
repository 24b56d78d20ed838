use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::model::RawItem;
use crate::normalize::Normalizer;
use crate::store::{DocumentStore, WriteBatch, MAX_BATCH_WRITES};

pub const DEFAULT_BATCH_SIZE: usize = MAX_BATCH_WRITES;

/// Outcome tallies for one upload run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadStats {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    pub batches: usize,
    pub failed_batches: usize,
}

/// Normalize `items` and upsert them into `collection`, one atomic commit
/// per chunk of `batch_size`. Item and chunk failures are counted and
/// logged; every chunk is attempted.
pub fn upload(
    store: &mut dyn DocumentStore,
    collection: &str,
    items: &[RawItem],
    batch_size: usize,
    normalizer: &Normalizer,
) -> UploadStats {
    let batch_size = batch_size.max(1);
    let mut stats = UploadStats {
        total: items.len(),
        ..Default::default()
    };

    let pb = ProgressBar::new(items.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    for (index, chunk) in items.chunks(batch_size).enumerate() {
        let first = index * batch_size + 1;
        let last = first + chunk.len() - 1;
        let mut batch = WriteBatch::new();
        let mut chunk_errors = 0;

        for item in chunk {
            let place = normalizer.normalize(item);
            if place.place_id.is_empty() {
                warn!("Skipping item without contentsid: {}", item.display_title());
                chunk_errors += 1;
                continue;
            }
            let staged = place
                .to_fields()
                .map_err(StoreError::from)
                .and_then(|fields| batch.set_merge(&place.place_id, fields));
            if let Err(e) = staged {
                warn!("Failed to stage {}: {}", item.display_title(), e);
                chunk_errors += 1;
            }
        }

        let staged = batch.len();
        if batch.is_empty() {
            warn!("Items {}~{}: nothing to commit", first, last);
            stats.errors += chunk_errors;
            pb.inc(chunk.len() as u64);
            continue;
        }
        stats.batches += 1;
        match store.commit(collection, batch) {
            Ok(()) => {
                stats.success += staged;
                stats.errors += chunk_errors;
                info!(
                    "Items {}~{} committed ({}/{} uploaded)",
                    first, last, stats.success, stats.total
                );
            }
            Err(e) => {
                warn!("Batch commit failed for items {}~{}: {}", first, last, e);
                stats.failed_batches += 1;
                stats.errors += chunk.len();
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    info!(
        success = stats.success,
        errors = stats.errors,
        failed_batches = stats.failed_batches,
        "Upload complete"
    );
    stats
}
