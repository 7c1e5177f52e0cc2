//! # Formcraft Model
//!
//! Document model for the survey designer.
//!
//! The model is a thin adapter over the external form-library JSON schema
//! (`{ pages: [{ name, elements: [...] }] }`). It gives the editor core an
//! addressable tree of uniquely-named nodes and keeps every field it does not
//! interpret byte-faithful across serialization round-trips.
//!
//! ## Core Principles
//!
//! 1. **Names are identity**: nodes are addressed by name, never by pointer
//! 2. **One element type**: questions, panels and matrices are a single
//!    tagged entity with a `kind()` discriminator, not a class hierarchy
//! 3. **Opaque payloads**: fields other than `name`, `type`, child containers
//!    and expression properties pass through untouched

pub mod error;
pub mod naming;
pub mod node_id;
pub mod survey;

pub use error::{ModelError, ModelResult};
pub use naming::new_name;
pub use node_id::NodeId;
pub use survey::{Element, ElementKind, ItemRef, Page, SurveyDocument};
