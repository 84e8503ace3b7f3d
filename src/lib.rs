//! Command palette engine: a registry of built-in, custom and recently used
//! commands, fuzzy ranking over their names, and dispatch of the chosen
//! command to a browser, a shell, or the front end itself.

pub mod config;
pub mod error;
pub mod executor;
pub mod history;
pub mod matcher;
pub mod model;
pub mod ranker;
pub mod registry;
pub mod store;
pub mod template;

pub use error::{DispatchError, RegistryError, StoreError, TemplateError};
pub use executor::{ConsoleAction, DispatchResult, Dispatcher, Launcher, Outcome, SystemLauncher};
pub use model::{ActionType, Command, IdentityKey, Origin};
pub use ranker::Ranker;
pub use registry::{ImportOutcome, ImportReport, Registry};
pub use store::Store;
