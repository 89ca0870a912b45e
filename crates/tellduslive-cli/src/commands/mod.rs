//! Command implementations for the CLI.

mod authorize;
mod device;
mod discover;
mod list;

pub use authorize::{authorize, cmd_authorize, select_authorizer};
pub use device::cmd_device;
pub use discover::cmd_discover;
pub use list::{ListArgs, PUSH_SETTLE, cmd_list, poll_loop};
