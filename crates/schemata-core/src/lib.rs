//! Schemata Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Schemata
//! workspace. It includes:
//!
//! - **Identifiers**: String-interned names ([`identifier::Id`]) and the short
//!   random name generator used for new connections ([`identifier::ShortUid`])
//! - **Colors**: CSS color handling for node types ([`color::Color`])
//! - **Geometry**: Points and bounds in canvas space ([`geometry`] module)
//! - **Schema**: Node types, edge types and their property schemas ([`schema`] module)

pub mod color;
pub mod geometry;
pub mod identifier;
pub mod schema;
