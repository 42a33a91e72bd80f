mod auth;
mod org;

pub use auth::{AuthCommands, AuthLoginArgs};
pub use org::{OrgCommands, OrgSwitchArgs};
