//! Playback descriptor builder for digital-signage players.
//!
//! Players periodically poll for a SMIL descriptor telling them what to
//! show, where and when the screen goes dark. This crate compiles a
//! player's configuration snapshot and its playlist fragments into that
//! descriptor. It performs no I/O: snapshots and template text come from
//! the caller, and the finished text goes back to the caller.
//!
//! # Components
//!
//! - [`category`]: keeps or drops category-tagged blocks per player
//! - [`layout`]: root canvas and playback regions
//! - [`schedule`]: weekly standby table to wallclock expressions
//! - [`refresh`]: safe re-fetch interval
//! - [`trigger`]: localized trigger catalogue and item `begin` expressions
//! - [`assembler`]: runs the above and fills the template
//!
//! Every function is pure over immutable inputs, so builds for different
//! players can run concurrently without coordination.
//!
//! ```rust
//! use signage_descriptor::{category, refresh, CategoryGroup};
//!
//! assert_eq!(refresh::compute(10, 10), 900);
//!
//! let fragment = "<!-- begin_categories a;b --> X <!-- end_categories a;b -->";
//! assert_eq!(category::filter(fragment, &[CategoryGroup::new(["a", "b"])]), " X ");
//! ```

pub mod assembler;
pub mod category;
pub mod error;
pub mod layout;
pub mod refresh;
pub mod schedule;
pub mod trigger;
pub mod types;

pub use assembler::{BuildState, Descriptor, DescriptorAssembler, Sections};
pub use error::DescriptorError;
pub use layout::{Layout, Region};
pub use schedule::{StandbySchedule, WallclockMarker};
pub use trigger::{
    ItemTrigger, Localizer, Repeat, RepeatUnit, Translations, TriggerDescription, TriggerType,
};
pub use types::{
    CategoryGroup, Dimension, ExportUnit, Period, PlayerCommand, PlayerConfiguration,
    PlayerModel, PlaylistMode, WeekdaySchedule, Zone, DEFAULT_REFRESH_SECONDS,
};
