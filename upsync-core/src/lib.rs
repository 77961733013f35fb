//! Upsync Core functionality.
//!
//! This crate contains the membership model, the snapshot differ and the
//! upstream file renderer that power the Upsync reconciler.

pub mod domain {
    //! Domain models shared by every Upsync component.

    pub mod instance;
    pub mod snapshot;
    pub mod status;
}

pub mod reconcile {
    //! Pure reconciliation steps: diffing and rendering.

    pub mod diff;
    pub mod render;
}

pub use domain::instance::{Health, Instance, Member, Variant};
pub use domain::snapshot::{Cursor, Members, Snapshot};
pub use domain::status::{Phase, SharedStatusBoard, Status, StatusBoard};
pub use reconcile::diff::{diff, Changeset};
pub use reconcile::render::UpstreamTemplate;
