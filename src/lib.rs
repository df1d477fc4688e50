pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod evidence;
pub mod loan;
pub mod payments;
pub mod serialization;
pub mod state;
pub mod types;

// re-export key types
pub use config::{BillingPolicy, DocumentConfig, LoanConfig, LoanTerms, OriginationLimits};
pub use decimal::{Money, Rate};
pub use errors::{LoanError, Result};
pub use events::{Event, EventStore};
pub use evidence::{ApprovalInfo, DisbursementInfo, InvestmentInfo, Investor};
pub use loan::Loan;
pub use payments::{payable_amount, AmortizationSchedule, PaymentLedger, PaymentOutcome};
pub use serialization::LoanView;
pub use state::{LoanState, Transition};
pub use types::{Installment, LoanId, PaymentKind, PaymentRecord, ScheduleOrder};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
