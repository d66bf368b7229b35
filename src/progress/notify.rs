//! Notification delivery for unlocks and resets.
//!
//! The engine calls into a [`NotificationSink`] and never waits on it. The
//! bundled [`BannerPresenter`] keeps a single on-screen banner with an
//! auto-dismiss timer; a newer banner cancels the pending timer instead of
//! queueing behind it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info};
use tokio::task::JoinHandle;

use crate::logutil::achievement_label;
use crate::progress::types::{Achievement, ProgressState};

/// Receiver of user-visible progress signals. Implementations must return
/// promptly; display timing is their own concern.
pub trait NotificationSink: Send + Sync {
    /// An achievement was unlocked and `points_awarded` were added.
    fn on_unlock(&self, achievement: &Achievement, points_awarded: u32);

    /// Progress was wiped back to the zero state.
    fn on_reset(&self);

    /// A mutation completed and `state` is the committed result.
    fn on_state_changed(&self, _state: &ProgressState) {}
}

/// Sink that drops everything. Useful for batch tools and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn on_unlock(&self, _achievement: &Achievement, _points_awarded: u32) {}
    fn on_reset(&self) {}
}

/// Sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn on_unlock(&self, achievement: &Achievement, points_awarded: u32) {
        info!(
            "achievement unlocked: {} (+{} XP)",
            achievement_label(&achievement.icon, &achievement.title),
            points_awarded
        );
    }

    fn on_reset(&self) {
        info!("progress reset");
    }
}

/// Content of the banner currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub icon: String,
    pub points: Option<u32>,
}

#[derive(Default)]
struct BannerSlot {
    current: Option<Banner>,
    generation: u64,
    hide_task: Option<JoinHandle<()>>,
    shown_total: u64,
}

/// Single-banner presenter with a superseding auto-dismiss timer.
///
/// Must be driven from inside a tokio runtime: each banner spawns a sleep task
/// that hides it after `dismiss_after`.
#[derive(Clone)]
pub struct BannerPresenter {
    dismiss_after: Duration,
    slot: Arc<Mutex<BannerSlot>>,
}

impl BannerPresenter {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            dismiss_after,
            slot: Arc::new(Mutex::new(BannerSlot::default())),
        }
    }

    /// Show a banner, cancelling any pending dismiss timer.
    pub fn show(&self, message: &str, icon: &str, points: Option<u32>) {
        let Ok(mut slot) = self.slot.lock() else {
            return;
        };
        if let Some(pending) = slot.hide_task.take() {
            pending.abort();
        }
        slot.generation = slot.generation.wrapping_add(1);
        slot.shown_total += 1;
        slot.current = Some(Banner {
            message: message.to_string(),
            icon: icon.to_string(),
            points,
        });
        debug!("banner shown: {}", achievement_label(icon, message));

        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        let delay = self.dismiss_after;
        slot.hide_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(mut slot) = shared.lock() {
                // A newer banner owns the slot now.
                if slot.generation == generation {
                    slot.current = None;
                    slot.hide_task = None;
                }
            }
        }));
    }

    /// Banner currently visible, if any.
    pub fn current(&self) -> Option<Banner> {
        self.slot.lock().ok().and_then(|s| s.current.clone())
    }

    pub fn is_showing(&self) -> bool {
        self.current().is_some()
    }

    /// Banners shown since creation.
    pub fn shown_total(&self) -> u64 {
        self.slot.lock().map(|s| s.shown_total).unwrap_or(0)
    }

    /// Hide immediately and cancel the timer.
    pub fn dismiss(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(pending) = slot.hide_task.take() {
                pending.abort();
            }
            slot.current = None;
        }
    }
}

impl NotificationSink for BannerPresenter {
    fn on_unlock(&self, achievement: &Achievement, points_awarded: u32) {
        self.show(
            &format!("Achievement Unlocked: {}", achievement.title),
            &achievement.icon,
            Some(points_awarded),
        );
    }

    fn on_reset(&self) {
        self.show("Progress reset", "🔄", None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::types::RequirementType;

    #[tokio::test]
    async fn banner_auto_dismisses() {
        let presenter = BannerPresenter::new(Duration::from_millis(30));
        presenter.on_reset();
        assert_eq!(presenter.current().unwrap().message, "Progress reset");
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!presenter.is_showing());
    }

    #[tokio::test]
    async fn newer_banner_supersedes_pending_timer() {
        let presenter = BannerPresenter::new(Duration::from_millis(80));
        let first = Achievement::new("a", "First", RequirementType::VisitCount, 1, 5);
        let second = Achievement::new("b", "Second", RequirementType::VisitCount, 2, 7);
        presenter.on_unlock(&first, 5);
        tokio::time::sleep(Duration::from_millis(50)).await;
        presenter.on_unlock(&second, 7);
        // Past the first banner's deadline but inside the second's.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let banner = presenter.current().expect("second banner still visible");
        assert_eq!(banner.message, "Achievement Unlocked: Second");
        assert_eq!(banner.points, Some(7));
        assert_eq!(presenter.shown_total(), 2);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!presenter.is_showing());
    }

    #[tokio::test]
    async fn dismiss_clears_immediately() {
        let presenter = BannerPresenter::new(Duration::from_secs(10));
        presenter.show("Hello", "👋", None);
        presenter.dismiss();
        assert!(presenter.current().is_none());
    }
}
