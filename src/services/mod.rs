//! Service layer for doclabel business logic.
//!
//! This module contains domain logic separated from HTTP concerns.
//! Services can be used by the CLI, the web server, or tests.

pub mod export;
pub mod intake;
pub mod labeling;
pub mod validation;

pub use export::{ExportBatchService, ExportError, ExportReport, UploadFailure, UploadSuccess};
pub use intake::{IngestOutcome, IntakeError, IntakePipeline};
pub use labeling::{LabelCorrectionService, LabelError, LabelRequest};
pub use validation::{default_allowed_extensions, ValidationError};
