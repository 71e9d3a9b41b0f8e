//! 活动日期与有效期

use super::rows::{RowId, RowList};
use crate::error::FormError;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// 活动日期上限
pub const MAX_EVENT_DATES: usize = 20;

/// datetime-local 输入框的格式
pub const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

const ACCEPTED_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// 解析日期时间；接受带秒、带毫秒和纯日期的写法
pub fn parse_event_datetime(value: &str) -> Result<NaiveDateTime, FormError> {
    let value = value.trim();
    let value = value.strip_suffix('Z').unwrap_or(value);
    for format in ACCEPTED_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(FormError::InvalidDateTime {
        value: value.to_string(),
    })
}

/// 提交字段 `eventDatesInput` 的结构
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDatesPayload {
    pub dates: Vec<String>,
}

/// 活动日期列表
#[derive(Debug, Clone, PartialEq)]
pub struct EventDates {
    rows: RowList<NaiveDateTime>,
}

impl Default for EventDates {
    fn default() -> Self {
        Self {
            rows: RowList::with_max(MAX_EVENT_DATES),
        }
    }
}

impl EventDates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 追加日期；未给出时取当前本地时间（精确到分钟）
    pub fn add(&mut self, value: Option<NaiveDateTime>) -> Option<RowId> {
        let value = value.unwrap_or_else(now_to_minute);
        self.rows.push(value)
    }

    pub fn remove(&mut self, id: RowId) -> bool {
        self.rows.remove(id).is_some()
    }

    pub fn set(&mut self, id: RowId, value: NaiveDateTime) -> bool {
        match self.rows.get_mut(id) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowId, &NaiveDateTime)> {
        self.rows.iter().map(|r| (r.id, &r.value))
    }

    /// 清空后按顺序载入；跳过空串，无法解析的值返回错误
    pub fn load(&mut self, dates: &[String]) -> Result<usize, FormError> {
        let mut parsed = Vec::with_capacity(dates.len());
        for date in dates.iter().filter(|d| !d.trim().is_empty()) {
            parsed.push(parse_event_datetime(date)?);
        }
        self.rows.clear();
        for dt in parsed {
            if self.rows.push(dt).is_none() {
                return Err(FormError::CapacityExceeded {
                    max: MAX_EVENT_DATES,
                });
            }
        }
        Ok(self.rows.len())
    }

    /// 清空后载入能解析的日期，超过上限的部分不载入；返回被丢弃的原始值
    pub fn load_valid(&mut self, dates: &[String]) -> Vec<String> {
        self.rows.clear();
        let mut rejected = Vec::new();
        for date in dates.iter().filter(|d| !d.trim().is_empty()) {
            match parse_event_datetime(date) {
                Ok(dt) if self.rows.push(dt).is_some() => {}
                _ => rejected.push(date.clone()),
            }
        }
        rejected
    }

    pub fn to_payload(&self) -> EventDatesPayload {
        EventDatesPayload {
            dates: self
                .rows
                .values()
                .map(|dt| dt.format(DATETIME_LOCAL_FORMAT).to_string())
                .collect(),
        }
    }
}

fn now_to_minute() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_second(0)
        .and_then(|dt| dt.with_nanosecond(0))
        .unwrap_or(now)
}

/// 有效期：开始不晚于结束
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl ValidityWindow {
    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// 依次设置开始和结束日期，同样适用夹紧规则
    pub fn from_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let mut window = Self::default();
        window.set_start(start);
        window.set_end(end);
        window
    }

    /// 设置开始日期；结束日期早于它时被推到同一天
    pub fn set_start(&mut self, start: Option<NaiveDate>) {
        self.start = start;
        if let (Some(s), Some(e)) = (self.start, self.end) {
            if s > e {
                self.end = Some(s);
            }
        }
    }

    /// 设置结束日期；开始日期晚于它时被拉回同一天
    pub fn set_end(&mut self, end: Option<NaiveDate>) {
        self.end = end;
        if let (Some(s), Some(e)) = (self.start, self.end) {
            if e < s {
                self.start = Some(e);
            }
        }
    }
}
