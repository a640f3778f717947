//! Armature Core Types and Definitions
//!
//! This crate provides the data model produced by the Armature service
//! container loader. It includes:
//!
//! - **Scalars**: typed scalar values and document text coercion ([`scalar::Scalar`])
//! - **Arguments**: keyed argument mappings and their values ([`argument`] module)
//! - **Blueprints**: service construction recipes and aliases ([`blueprint`] module)
//! - **Registry**: the insertion-ordered service registry ([`registry::Registry`])
//! - **Parameters**: the case-insensitive parameter bag ([`parameter::ParameterBag`])
//! - **Config values**: nested mappings handed to extensions ([`config_value::ConfigValue`])

pub mod argument;
pub mod blueprint;
pub mod config_value;
pub mod parameter;
pub mod registry;
pub mod scalar;
