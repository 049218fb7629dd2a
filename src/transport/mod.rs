//! Remote transport: secure copy and remote command execution.
//!
//! Both seams are implemented on top of the system OpenSSH client, so host
//! keys, agents and `~/.ssh/config` behave exactly as they do for an
//! operator typing the commands by hand.

mod openssh;
mod traits;

pub use openssh::{ScpCopier, SshExecutor};
pub use traits::{RemoteExecutor, SecureCopier};

#[cfg(test)]
pub use traits::{MockRemoteExecutor, MockSecureCopier};
