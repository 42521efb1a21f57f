mod audit;
mod users;

pub use audit::AuditTrail;
pub use users::{NewUser, UserStore};
