//! Registry Store: persists bot instances, the global phone-to-tenancy map,
//! the server catalog, activities, and commands. All reads and writes are
//! tenancy-scoped except the small set of explicitly cross-tenancy methods
//! documented on [`store::RegistryStore`].

pub mod error;
pub mod models;
pub mod store;

pub use error::{Error, Result};
pub use models::{
    Activity, ApprovalStatus, BotInstance, BotStatus, Capacity, Command, GlobalRegistration,
    NewBotFields, PromotionalOfferConfig, RegistrationOutcome, Server,
};
pub use store::{run_migrations, RegistryStore};
