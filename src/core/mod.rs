pub mod cancellation;
pub mod clock;
pub mod error;
pub mod fiscal_document;
pub mod period;
pub mod text;

pub use cancellation::CancellationFlag;
pub use clock::{Clock, SystemClock};
pub use error::{AppError, Result};
pub use fiscal_document::{DocumentKind, FiscalDocument};
pub use period::Period;
