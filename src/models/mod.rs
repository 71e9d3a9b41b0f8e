pub mod event_dates;
pub mod form;
pub mod loaders;
pub mod metadata;
pub mod record;
pub mod rows;

pub use event_dates::{EventDates, EventDatesPayload, ValidityWindow};
pub use form::{AnswerType, ContainerRef, Form, Question, QuestionId};
pub use loaders::{load_all_drafts, load_form_draft, save_form_draft};
pub use metadata::{Metadata, MetadataContainer, MetadataEntry};
pub use record::{
    FormEnvelope, FormRecord, HiddenFields, LoadHistoryEntry, LoadHistoryPage, LoadHistoryRecord,
    QuestionRecord,
};
pub use rows::RowId;
