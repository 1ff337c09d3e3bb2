//! Dependency resolver and package database core for an embedded-systems
//! package manager. See each module for the component of the design it
//! covers (C1-C6).

pub mod collaborators;
pub mod conffile;
pub mod control;
pub mod database;
pub mod depend;
pub mod error;
pub mod format;
pub mod logger;
pub mod package;
pub mod resolver;
pub mod utils;
pub mod version;
