//! stockwise: business records with a generic repository
//!
//! Every entity kind (brands, locations, products, suppliers, work centers,
//! ...) is declared once as a static [`core::EntityDescriptor`] and served
//! by the same [`core::Repository`]: tri-state active filtering, free-text
//! search, relation-aware sorting, and soft or hard delete depending on the
//! kind. Units of measure are kept consistent by [`core::UomEngine`], which
//! rebases a category whenever its reference unit changes.

pub mod cli;
pub mod core;
pub mod entities;
