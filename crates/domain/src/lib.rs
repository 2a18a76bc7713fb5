mod admission;
mod booking;
mod checkout;
mod event;
mod job_task;
mod queue;
mod reservation;
mod seats;
mod shared;
mod subscription;
mod ticket;
mod transaction;

pub use admission::{Admission, AdmissionCode, AdmissionKind, AdmissionStatus};
pub use booking::{Booking, BookingStatus};
pub use checkout::{merge_items, CheckoutItem, CheckoutPlan, CheckoutPlanError};
pub use event::{Event, EventMode, EventStatus, ScheduleError, TransitionTrigger};
pub use job_task::{JobPayload, JobTask, JobTaskStatus, JobType};
pub use queue::{dead_letter_queue, StatusSwap, SwapOutcome, Topic, TransactionUpdate};
pub use reservation::{Reservation, ReservationStatus};
pub use seats::Seats;
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use shared::status::{InvalidTransition, Status, UnknownStatus};
pub use subscription::{EventSubscription, SubscriptionStatus};
pub use ticket::{Ticket, TicketStatus};
pub use transaction::{PaymentSource, Transaction, TransactionStatus};
