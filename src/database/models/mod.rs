pub mod billing;
pub mod building;
pub mod contract;
pub mod customer;
pub mod elevator;
pub mod maintenance;
pub mod notification;
pub mod part;
pub mod technician;
pub mod ticket;
pub mod user;

pub use billing::{Invoice, PricingSettings, Quotation};
pub use building::Building;
pub use contract::Contract;
pub use customer::Customer;
pub use elevator::{Elevator, ElevatorState};
pub use maintenance::{MaintenanceJob, MaintenancePlan, MaintenanceTemplate};
pub use notification::Notification;
pub use part::{Part, PartMovement, PartStock};
pub use technician::{RequestStatus, Technician, TechnicianRequest};
pub use ticket::Ticket;
pub use user::User;
