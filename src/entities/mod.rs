//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database.

pub mod enums;
pub mod invitation;
pub mod user;

// Re-exports per facilitare l'import
pub use enums::InvitationStatus;
pub use invitation::{INVITATION_TTL_DAYS, Invitation};
pub use user::User;
