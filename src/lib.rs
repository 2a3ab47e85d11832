//! High level bindings to the `zfs` and `zpool` command line tools
//!
//! Every operation builds an argument vector, runs the tool once and returns
//! its standard output unparsed. Invalid arguments are rejected before
//! anything is run.
//!
//! The [`system`] module answers questions about the running system, such as
//! which dataset is mounted where and whether `/` is on ZFS, from the Linux
//! `/proc` tables or FreeBSD's `mount -p`.
//!
//! # Implementation details
//!
//! The tools are found through `PATH` unless configured otherwise, see
//! [`config::Config`].
//! Processes are run synchronously, without a timeout.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use zfscmds::{system::System, zfs::*};
//! let system = System::detect().unwrap();
//! if system.is_root_on_zfs().unwrap() {
//!     let zfs = system.zfs();
//!     let out = zfs.list("rpool", &ListOptions { recursive: true, ..Default::default() }).unwrap();
//!     print!("{out}");
//! }
//! ```
#![doc(html_root_url = "https://docs.rs/zfscmds/0.1.0")]

mod check;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod fakes;
pub mod system;
mod util;
pub mod utility;
pub mod zfs;
pub mod zpool;

pub use error::{Result, ZfsError};
