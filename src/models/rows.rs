//! 有上限的有序行列表
//!
//! 元数据容器和活动日期共用：每行有稳定的 `RowId`，删除按 id 进行且幂等

use serde::{Deserialize, Serialize};

/// 行标识，在所属列表内唯一，删除后不复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u32);

/// 带 id 的一行
#[derive(Debug, Clone, PartialEq)]
pub struct Row<T> {
    pub id: RowId,
    pub value: T,
}

/// 有上限的有序行列表
#[derive(Debug, Clone, PartialEq)]
pub struct RowList<T> {
    rows: Vec<Row<T>>,
    next_id: u32,
    max: usize,
}

impl<T> RowList<T> {
    pub fn with_max(max: usize) -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
            max,
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.max
    }

    /// 追加一行；已满时返回 `None`，不插入
    pub fn push(&mut self, value: T) -> Option<RowId> {
        if self.is_full() {
            return None;
        }
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.rows.push(Row { id, value });
        Some(id)
    }

    /// 按 id 删除；不存在时返回 `None`
    pub fn remove(&mut self, id: RowId) -> Option<T> {
        let pos = self.rows.iter().position(|r| r.id == id)?;
        Some(self.rows.remove(pos).value)
    }

    /// 删除最后一行；空列表时不做任何事
    pub fn pop(&mut self) -> Option<T> {
        self.rows.pop().map(|r| r.value)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn get(&self, id: RowId) -> Option<&T> {
        self.rows.iter().find(|r| r.id == id).map(|r| &r.value)
    }

    pub fn get_mut(&mut self, id: RowId) -> Option<&mut T> {
        self.rows
            .iter_mut()
            .find(|r| r.id == id)
            .map(|r| &mut r.value)
    }

    pub fn ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.rows.iter().map(|r| r.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row<T>> {
        self.rows.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.iter().map(|r| &r.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_refuses_past_max() {
        let mut list = RowList::with_max(2);
        assert!(list.push("a").is_some());
        assert!(list.push("b").is_some());
        assert!(list.push("c").is_none());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut list = RowList::with_max(5);
        let a = list.push(1).unwrap();
        let b = list.push(2).unwrap();
        assert_eq!(list.remove(a), Some(1));
        assert_eq!(list.remove(a), None);
        assert_eq!(list.ids().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut list = RowList::with_max(5);
        let a = list.push(1).unwrap();
        list.pop();
        let b = list.push(2).unwrap();
        assert_ne!(a, b);
    }
}
