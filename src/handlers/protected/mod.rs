// handlers/protected/mod.rs - handlers that require an authenticated caller
//
// Every handler here extracts `CurrentUser`, performs one collaborator call
// scoped to the caller, and maps the result to a JSON envelope.

pub mod dashboard;
pub mod dentists;
pub mod leads;
pub mod onboarding;
pub mod payments;
pub mod storage;
pub mod utils;
