use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::hover_service::EngineInput;
use crate::debug_if_enabled;

/// Идентификатор запланированного таймера. Токены не переиспользуются.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    CategoryHover,
    FavoritesHover,
    /// Возврат к выбранной категории после ухода с избранного
    FavoritesCleanup,
    /// Возврат к выбранной категории после ухода указателя с меню
    Restore,
}

/// Отменяемые отложенные срабатывания.
///
/// Срабатывание доставляется владельцу движка как `(TimerToken, TimerKind)`;
/// после `cancel` оно не доставляется вовсе.
pub trait TimerScheduler {
    fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerToken;
    fn cancel(&mut self, token: TimerToken);
}

/// Таймеры на задачах tokio: каждый таймер — отдельная задача со sleep,
/// отмена — abort задачи
pub struct TokioScheduler {
    next_id: AtomicU64,
    inputs: mpsc::UnboundedSender<EngineInput>,
    active: Arc<DashMap<u64, JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new(inputs: mpsc::UnboundedSender<EngineInput>) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            inputs,
            active: Arc::new(DashMap::new()),
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn cancel_all(&mut self) {
        let keys: Vec<u64> = self.active.iter().map(|entry| *entry.key()).collect();
        for key in keys {
            if let Some((_, handle)) = self.active.remove(&key) {
                handle.abort();
            }
        }
    }
}

impl TimerScheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerToken {
        let token = TimerToken(self.next_id.fetch_add(1, Ordering::Relaxed));
        let inputs = self.inputs.clone();
        let active = Arc::clone(&self.active);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            active.remove(&token.value());
            // Получатель закрыт только при остановке сервиса
            let _ = inputs.send(EngineInput::TimerExpired(token, kind));
        });

        debug_if_enabled!("Таймер {:?} #{} на {:?}", kind, token.value(), delay);
        self.active.insert(token.value(), handle);
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some((_, handle)) = self.active.remove(&token.value()) {
            handle.abort();
            debug_if_enabled!("Таймер #{} отменён", token.value());
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
