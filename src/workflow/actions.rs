//! 界面控件 → 编辑动作 对照表
//!
//! 每个控件名只对应一个动作，界面层只需要把控件名和目标交给 `FormEditor::dispatch`

use crate::error::FormError;
use crate::models::form::{ContainerRef, QuestionId};
use crate::models::rows::RowId;
use crate::workflow::editor::FormEditor;
use phf::phf_map;
use tracing::debug;

/// 编辑动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    AddQuestion,
    RemoveQuestion,
    IncreaseMetadata,
    DecreaseMetadata,
    RemoveMetadataField,
    AddEventDate,
    RemoveEventDate,
    EnableAi,
    DisableAi,
    Validate,
}

static AFFORDANCES: phf::Map<&'static str, ActionKind> = phf_map! {
    "add-question" => ActionKind::AddQuestion,
    "remove-question" => ActionKind::RemoveQuestion,
    "increase-count" => ActionKind::IncreaseMetadata,
    "add-metadata" => ActionKind::IncreaseMetadata,
    "decrease-count" => ActionKind::DecreaseMetadata,
    "remove-last-field" => ActionKind::DecreaseMetadata,
    "remove-field" => ActionKind::RemoveMetadataField,
    "add-event-date" => ActionKind::AddEventDate,
    "remove-date" => ActionKind::RemoveEventDate,
    "ai-toggle-on" => ActionKind::EnableAi,
    "ai-toggle-off" => ActionKind::DisableAi,
    "validate" => ActionKind::Validate,
};

/// 按控件名查动作
pub fn action_for(affordance: &str) -> Option<ActionKind> {
    AFFORDANCES.get(affordance).copied()
}

/// 所有已登记的控件名
pub fn affordances() -> impl Iterator<Item = &'static str> {
    AFFORDANCES.keys().copied()
}

/// 事件作用的对象
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    None,
    Question(QuestionId),
    Container(ContainerRef),
    MetadataRow(ContainerRef, RowId),
    EventDate(RowId),
}

/// 动作执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// 新增了题目卡片
    QuestionAdded(QuestionId),
    /// 新增了一行
    RowAdded(RowId),
    /// 是否产生了改动（拒绝、已删除过等情况为 false）
    Changed(bool),
    /// 校验结果
    Validated(bool),
}

impl FormEditor {
    /// 执行控件对应的动作
    pub fn dispatch(
        &mut self,
        affordance: &str,
        target: ActionTarget,
    ) -> Result<ActionOutcome, FormError> {
        let kind = action_for(affordance).ok_or_else(|| FormError::UnknownAffordance {
            name: affordance.to_string(),
        })?;
        debug!("控件 {} → {:?}", affordance, kind);

        let missing = |expected: &'static str| FormError::MissingTarget {
            affordance: affordance.to_string(),
            expected,
        };

        let outcome = match (kind, target) {
            (ActionKind::AddQuestion, _) => match self.add_question(None) {
                Some(id) => ActionOutcome::QuestionAdded(id),
                None => ActionOutcome::Changed(false),
            },
            (ActionKind::RemoveQuestion, ActionTarget::Question(id)) => {
                ActionOutcome::Changed(self.remove_question(&id))
            }
            (ActionKind::EnableAi, ActionTarget::Question(id)) => {
                ActionOutcome::Changed(self.set_ai_enabled(&id, true))
            }
            (ActionKind::DisableAi, ActionTarget::Question(id)) => {
                ActionOutcome::Changed(self.set_ai_enabled(&id, false))
            }
            (ActionKind::IncreaseMetadata, ActionTarget::Container(container)) => {
                match self.increase_metadata(&container) {
                    Some(row) => ActionOutcome::RowAdded(row),
                    None => ActionOutcome::Changed(false),
                }
            }
            (ActionKind::DecreaseMetadata, ActionTarget::Container(container)) => {
                ActionOutcome::Changed(self.decrease_metadata(&container))
            }
            (ActionKind::RemoveMetadataField, ActionTarget::MetadataRow(container, row)) => {
                ActionOutcome::Changed(self.remove_metadata_field(&container, row))
            }
            (ActionKind::AddEventDate, _) => match self.add_event_date(None) {
                Some(row) => ActionOutcome::RowAdded(row),
                None => ActionOutcome::Changed(false),
            },
            (ActionKind::RemoveEventDate, ActionTarget::EventDate(row)) => {
                ActionOutcome::Changed(self.remove_event_date(row))
            }
            (ActionKind::Validate, _) => ActionOutcome::Validated(self.validate_form()),
            (ActionKind::RemoveQuestion | ActionKind::EnableAi | ActionKind::DisableAi, _) => {
                return Err(missing("question"))
            }
            (ActionKind::IncreaseMetadata | ActionKind::DecreaseMetadata, _) => {
                return Err(missing("metadata container"))
            }
            (ActionKind::RemoveMetadataField, _) => return Err(missing("metadata row")),
            (ActionKind::RemoveEventDate, _) => return Err(missing("event date")),
        };

        Ok(outcome)
    }
}
