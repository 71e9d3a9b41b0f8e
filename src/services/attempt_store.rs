//! 加载尝试记录 - 业务能力层
//!
//! 按表单 id 保存最近的加载尝试，每个 id 只保留固定条数，最旧的先淘汰。
//! 由调用方创建并注入，不是全局单例

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// 默认每个表单保留的条数
pub const DEFAULT_ATTEMPT_CAPACITY: usize = 10;

/// 一次加载尝试
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAttempt {
    /// 本轮加载中的第几次（从 1 开始）
    pub attempt: usize,
    pub at: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
}

/// 加载尝试记录
#[derive(Debug)]
pub struct LoadAttemptStore {
    capacity: usize,
    attempts: Mutex<HashMap<String, VecDeque<LoadAttempt>>>,
}

impl Default for LoadAttemptStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ATTEMPT_CAPACITY)
    }
}

impl LoadAttemptStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<LoadAttempt>>> {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, form_id: &str, attempt: LoadAttempt) {
        let mut map = self.lock();
        let entries = map.entry(form_id.to_string()).or_default();
        entries.push_back(attempt);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// 某个表单的记录，旧的在前
    pub fn attempts(&self, form_id: &str) -> Vec<LoadAttempt> {
        self.lock()
            .get(form_id)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn last(&self, form_id: &str) -> Option<LoadAttempt> {
        self.lock().get(form_id).and_then(|e| e.back().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(n: usize, success: bool) -> LoadAttempt {
        LoadAttempt {
            attempt: n,
            at: Utc::now(),
            success,
            error: (!success).then(|| "boom".to_string()),
        }
    }

    #[test]
    fn test_store_is_bounded_per_key() {
        let store = LoadAttemptStore::default();
        for n in 1..=15 {
            store.record("42", attempt(n, false));
        }
        store.record("7", attempt(1, true));

        let kept = store.attempts("42");
        assert_eq!(kept.len(), DEFAULT_ATTEMPT_CAPACITY);
        assert_eq!(kept.first().unwrap().attempt, 6);
        assert_eq!(kept.last().unwrap().attempt, 15);
        assert_eq!(store.attempts("7").len(), 1);
    }

    #[test]
    fn test_last_is_newest() {
        let store = LoadAttemptStore::with_capacity(3);
        assert!(store.last("1").is_none());
        store.record("1", attempt(1, false));
        store.record("1", attempt(2, true));
        assert!(store.last("1").unwrap().success);
    }
}
