//! Data models for Bibliotech

pub mod book;
pub mod enums;
pub mod fine;
pub mod loan;
pub mod reservation;

// Re-export commonly used types
pub use book::Book;
pub use enums::{FineStatus, LoanStatus, ReservationStatus};
pub use fine::{Fine, LateFee};
pub use loan::{Loan, ReturnOutcome};
pub use reservation::Reservation;
