//! 提示消息
//!
//! 页面顶部的可关闭提示条。这里只保存状态，怎么显示由界面层决定

use std::fmt;

/// 提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Danger,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "success",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Danger => "danger",
        }
    }
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一条提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

/// 提示列表
///
/// 同级别同内容的提示只保留一条
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
    next_id: u64,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加提示，返回它的 id；已存在相同提示时返回已有的 id
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) -> u64 {
        let message = message.into();
        if let Some(existing) = self
            .notices
            .iter()
            .find(|n| n.level == level && n.message == message)
        {
            return existing.id;
        }

        self.next_id += 1;
        self.notices.push(Notice {
            id: self.next_id,
            level,
            message,
        });
        self.next_id
    }

    /// 关闭一条提示
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn last(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn contains(&self, level: NoticeLevel, message: &str) -> bool {
        self.notices
            .iter()
            .any(|n| n.level == level && n.message == message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_notice_is_not_added_twice() {
        let mut board = NoticeBoard::new();
        let first = board.push(NoticeLevel::Warning, "Maximum 20 metadata fields allowed");
        let second = board.push(NoticeLevel::Warning, "Maximum 20 metadata fields allowed");
        assert_eq!(first, second);
        assert_eq!(board.len(), 1);

        board.push(NoticeLevel::Danger, "Maximum 20 metadata fields allowed");
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_dismiss() {
        let mut board = NoticeBoard::new();
        let id = board.push(NoticeLevel::Info, "hello");
        assert!(board.dismiss(id));
        assert!(!board.dismiss(id));
        assert!(board.is_empty());

        // 关闭后可以再次出现
        board.push(NoticeLevel::Info, "hello");
        assert!(board.contains(NoticeLevel::Info, "hello"));
    }
}
