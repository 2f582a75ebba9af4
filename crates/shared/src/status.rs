//! Status-transition rules for tracked entries.
//!
//! These keep status and progress consistent with each other and with the
//! entry's episode/chapter total.

use crate::models::{Category, TrackingData, TrackingStatus};

/// Normalize a requested status/progress pair against the entry's total.
///
/// - Completed pins progress at the total (0 when unknown)
/// - Plan to Watch/Read and Dropped reset progress to 0
/// - Watching/Reading clamp to the total and promote to Completed on reaching it
/// - On Hold clamps to the total without promotion
pub fn resolve(requested: TrackingData, total: Option<u32>) -> TrackingData {
    let TrackingData { status, progress } = requested;

    match status {
        TrackingStatus::Completed => TrackingData {
            status,
            progress: total.unwrap_or(0),
        },
        TrackingStatus::Dropped | TrackingStatus::PlanToWatch | TrackingStatus::PlanToRead => {
            TrackingData {
                status,
                progress: 0,
            }
        }
        TrackingStatus::Watching | TrackingStatus::Reading => match total {
            Some(total) if progress >= total => TrackingData {
                status: TrackingStatus::Completed,
                progress: total,
            },
            _ => TrackingData { status, progress },
        },
        TrackingStatus::OnHold => TrackingData {
            status,
            progress: clamp(progress, total),
        },
    }
}

/// Progress after a +/- step of a Watching/Reading entry, or `None` when the
/// total is unknown.
///
/// Reaching the total switches the status to Completed; otherwise only the
/// progress changes.
pub fn step(
    current: TrackingData,
    delta: i64,
    total: Option<u32>,
) -> Option<TrackingData> {
    let total = total.filter(|t| *t > 0)?;
    let stepped = (i64::from(current.progress) + delta).clamp(0, i64::from(total));
    let progress = u32::try_from(stepped).unwrap_or(0);

    if progress >= total {
        Some(TrackingData {
            status: TrackingStatus::Completed,
            progress: total,
        })
    } else {
        Some(TrackingData {
            status: current.status,
            progress,
        })
    }
}

/// Coerce a status that does not belong to the category into its counterpart
/// (Watching <-> Reading, Plan to Watch <-> Plan to Read)
pub fn for_category(status: TrackingStatus, category: Category) -> TrackingStatus {
    if status.is_active() {
        TrackingStatus::active_for(category)
    } else if status.is_planned() {
        TrackingStatus::default_for(category)
    } else {
        status
    }
}

fn clamp(progress: u32, total: Option<u32>) -> u32 {
    match total {
        Some(total) => progress.min(total),
        None => progress,
    }
}
