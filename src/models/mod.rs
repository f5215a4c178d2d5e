// Core data models for Leadboard
// These structs are owned by the shell; the pipeline code only reads them

pub mod deal;
pub mod prospect;
pub mod stage;

pub use deal::*;
pub use prospect::*;
pub use stage::*;

/// Generate a short record id (first 8 hex digits of a v4 UUID)
pub fn new_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
