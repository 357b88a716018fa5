//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod invitation;
pub mod query;
pub mod user;

// Re-exports per mantenere la compatibilità con il codice esistente
pub use invitation::{
    AcceptInvitationResponseDTO, CreateInvitationDTO, CreateInvitationResponseDTO,
    EnrichedInvitationDTO, InvitationDTO, NewInvitationRequestDTO, SmsInvitationResponseDTO,
    UpdateInvitationDTO,
};
pub use query::UserSearchQuery;
pub use user::{AuthResponseDTO, CreateUserDTO, LoginDTO, UserDTO};
