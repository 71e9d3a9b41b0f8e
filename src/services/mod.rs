pub mod attempt_store;
pub mod serializer;
pub mod validator;

pub use attempt_store::{LoadAttempt, LoadAttemptStore};
pub use serializer::Serializer;
pub use validator::{
    ErrorSummary, FieldPath, MetadataPart, QuestionField, ValidationError, ValidationReport,
    Validator,
};
