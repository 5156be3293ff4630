mod config;
mod error;
mod rows;
mod store;

pub use config::SupabaseConfig;
pub use store::SupabaseBattleStore;
