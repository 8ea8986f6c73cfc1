pub mod event;
pub mod payment;
pub mod seat;
pub mod seat_transaction;
pub mod seat_type;
pub mod ticket;
pub mod user;

pub use event::{Event, EventStatus};
pub use payment::Payment;
pub use seat::{Seat, SeatStatus};
pub use seat_transaction::SeatTransaction;
pub use seat_type::SeatType;
pub use ticket::{PurchasedTicket, Ticket};
pub use user::User;
