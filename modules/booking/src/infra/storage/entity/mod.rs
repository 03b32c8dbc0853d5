pub mod accounts;
pub mod appointments;
pub mod doctor_profiles;
pub mod sessions;
