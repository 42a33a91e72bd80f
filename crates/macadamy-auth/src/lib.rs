//! # macadamy-auth
//!
//! Session and organization-consistency layer for Macadamy.
//!
//! - [`SessionBootstrapper`] resolves the startup session and loads the profile.
//! - [`ProfileStore`] holds identity, profile and selected organization.
//! - [`membership`] keeps the selection inside the active membership set.
//! - [`PrimaryOrganizationSwitcher`] changes the primary organization, one
//!   request at a time.
//!
//! The backend is reached through the traits in [`ports`];
//! [`supabase::SupabaseClient`] implements them over HTTP.

pub mod bootstrap;
pub mod context;
pub mod demo;
pub mod directory;
pub mod error;
pub mod membership;
pub mod notice;
pub mod ports;
pub mod profile_loader;
pub mod refresh;
pub mod rpc;
pub mod session;
pub mod storage;
pub mod store;
pub mod supabase;
pub mod switcher;
pub mod token_store;

pub use bootstrap::{BootstrapOutcome, SessionBootstrapper};
pub use context::{Backend, SessionContext};
pub use demo::{DemoCloner, DemoSessionCache};
pub use directory::{OrganizationDirectory, OrganizationItem};
pub use error::{AuthError, RpcError};
pub use membership::{MembershipValidator, reconcile_selected_organization};
pub use notice::{CollectingNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use ports::{AuthEvent, AuthProvider, AuthStateChange, BackendSession, ProfileSource, RpcClient};
pub use profile_loader::ProfileLoader;
pub use rpc::RpcApi;
pub use session::SessionManager;
pub use store::{ProfileStore, StoreSnapshot};
pub use switcher::{PrimaryOrganizationSwitcher, SwitchOutcome};
pub use token_store::TokenStore;
