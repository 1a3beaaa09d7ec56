// Application layer: validation and orchestration on top of the repository.
// Every client (CLI, tests, a future GUI) goes through `LedgerService`.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
