pub mod model;

pub use model::{
    Account, AccountPatch, Actor, Appointment, AppointmentQuery, AppointmentStatus, BookingRequest,
    DayAvailability, Doctor, DoctorPatch, DoctorProfile, DoctorQuery, FieldUpdate, NewAccount,
    NewDoctor, Role, Session, WeeklyAvailability,
};
