//! The entity data model: the containment-graph node (`object`), mob state
//! (`mob`), race/job/ability content shapes (`archetype`), and small shared
//! value types (`types`).

pub mod archetype;
pub mod mob;
pub mod object;
pub mod types;
