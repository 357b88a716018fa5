//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza i repository in sotto-moduli separati per una migliore manutenibilità.
//! Ogni repository gestisce le operazioni di persistenza per una specifica entità.

// ************************* NOTA SU SQLX ************************* //

/*
   Le query usano le funzioni runtime (sqlx::query / sqlx::query_as::<_, T>) con
   #[derive(sqlx::FromRow)] sulle entità, non le macro query!/query_as!: così il crate
   compila anche senza un database raggiungibile o la cartella .sqlx offline.
   Lo schema sta in migrations/ e viene applicato all'avvio con sqlx::migrate!.

   Oltre a MySQL esiste un backend in memoria (memory.rs) che implementa gli stessi trait:
   lo usano i test e l'avvio locale con STORAGE=memory.
*/

// ************************* MODULI REPOSITORY ************************* //

pub mod invitation;
pub mod memory;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, InvitationStore, Read, ReadMany, StoreError, Update, UserStore};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use invitation::InvitationRepository;
pub use memory::{MemoryInvitationRepository, MemoryUserRepository};
pub use user::UserRepository;

/// Traduce una violazione di vincolo UNIQUE di MySQL nel caso dedicato
pub(crate) fn map_unique_violation(err: sqlx::Error, field: &'static str) -> StoreError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Duplicate(field),
        other => StoreError::Database(other),
    }
}
