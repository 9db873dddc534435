//! Install root construction steps.
//!
//! - [`rootfs`] - wipe the target and initialize its rpm database
//! - [`packages`] - release package, package group, extras, update, clean
//! - [`guest_tools`] - platform integration installer

pub mod guest_tools;
pub mod packages;
pub mod rootfs;
