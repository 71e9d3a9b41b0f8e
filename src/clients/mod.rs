pub mod form_client;

pub use form_client::{CreatedForm, FormApi, FormClient, SubmitReceipt};
