pub mod slot_generator;
pub mod availability;
pub mod repository;
pub mod store;

pub use availability::AvailabilityService;
pub use repository::{AppointmentRepository, SupabaseAppointmentRepository};
pub use slot_generator::{generate_slot_times, generate_time_slots, slot_status_message};
pub use store::AppointmentStore;
