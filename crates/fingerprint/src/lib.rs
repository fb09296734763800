//! Fingerprints of declared file properties
//!
//! A fingerprint maps every normalized path beneath a property's root to the
//! type and content hash of the entry found there. Fingerprints are what the
//! history store persists and what two executions are compared on.

pub mod aggregate;
pub mod changes;
pub mod fingerprint;
pub mod outputs;
pub mod overlap;

pub use aggregate::combine;
pub use changes::{detect_changes, Change, ChangeKind, PropertyKind};
pub use fingerprint::{
    fingerprint_property, FileCollectionFingerprint, FileSystemLocationFingerprint,
    PropertyFingerprints,
};
pub use outputs::filter_output_fingerprint;
pub use overlap::{OverlappingOutputDetector, OverlappingOutputs};
