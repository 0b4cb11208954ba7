//! Subcommand handlers.
//!
//! Each file in this module corresponds to one user-facing command:
//!
//! | File          | Invocation                             | Description                  |
//! |---------------|----------------------------------------|------------------------------|
//! | `init.rs`     | `ebs-snapshot init`                    | Scaffold a `snapshot.toml`   |
//! | `snapshot.rs` | `ebs-snapshot snapshot <ACTION> [VOL]` | Run one policy action        |

pub mod init;
pub mod snapshot;
