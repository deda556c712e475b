//! Descriptor assembly: runs every section computation for one player and
//! substitutes the results into the descriptor template.
//!
//! # Template placeholders
//!
//! | placeholder      | replaced with                                  |
//! |------------------|------------------------------------------------|
//! | `{REFRESH_TIME}` | refresh interval in seconds                    |
//! | `{LAYOUT}`       | `<layout>` element                             |
//! | `{STANDBY}`      | standby `<par>` block, or nothing              |
//! | `{COMMANDS}`     | one `<meta>` per queued player command         |
//! | `{ITEMS}`        | category-filtered playlist items               |
//!
//! Placeholders missing from the template are simply not substituted.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use signage_descriptor::{DescriptorAssembler, PlayerConfiguration};
//!
//! let config = PlayerConfiguration::default();
//! let now = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();
//! let descriptor = DescriptorAssembler::new(now)
//!     .configuration(&config)
//!     .template("<meta http-equiv=\"Refresh\" content=\"{REFRESH_TIME}\" />")
//!     .build()
//!     .unwrap();
//! assert_eq!(descriptor.text, "<meta http-equiv=\"Refresh\" content=\"1800\" />");
//! ```

use chrono::NaiveDate;
use log::debug;
use quick_xml::escape::escape;
use serde::Serialize;

use crate::category;
use crate::error::DescriptorError;
use crate::layout::{self, Layout};
use crate::refresh;
use crate::schedule::{self, StandbySchedule};
use crate::types::{PlayerCommand, PlayerConfiguration};

pub const PLACEHOLDER_REFRESH: &str = "{REFRESH_TIME}";
pub const PLACEHOLDER_LAYOUT: &str = "{LAYOUT}";
pub const PLACEHOLDER_STANDBY: &str = "{STANDBY}";
pub const PLACEHOLDER_COMMANDS: &str = "{COMMANDS}";
pub const PLACEHOLDER_ITEMS: &str = "{ITEMS}";

/// Assembler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Inputs are being collected.
    Idle,
    /// Sections are computed, substitution pending.
    Computing,
    /// The descriptor has been produced.
    Done,
}

/// Section values computed for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sections {
    pub items: String,
    pub layout: Layout,
    pub standby: Option<StandbySchedule>,
    pub refresh_seconds: u64,
}

/// A finished descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub text: String,
    /// Commands serialized into the descriptor, in queue order.
    pub commands: Vec<PlayerCommand>,
    pub refresh_seconds: u64,
}

/// Builds one descriptor from a configuration snapshot and template text.
#[derive(Debug)]
pub struct DescriptorAssembler<'a> {
    config: Option<&'a PlayerConfiguration>,
    template: Option<&'a str>,
    items: &'a str,
    now: NaiveDate,
    state: BuildState,
    sections: Option<Sections>,
}

impl<'a> DescriptorAssembler<'a> {
    /// Create an assembler building as of `now`.
    pub fn new(now: NaiveDate) -> Self {
        Self {
            config: None,
            template: None,
            items: "",
            now,
            state: BuildState::Idle,
            sections: None,
        }
    }

    /// Set the player configuration snapshot.
    pub fn configuration(mut self, config: &'a PlayerConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the descriptor template.
    pub fn template(mut self, template: &'a str) -> Self {
        self.template = Some(template);
        self
    }

    /// Set the playlist item fragment.
    pub fn items(mut self, items: &'a str) -> Self {
        self.items = items;
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Run every section computation.
    ///
    /// Each stage reads only the configuration snapshot, never another
    /// stage's output. A failing stage returns the assembler to
    /// [`BuildState::Idle`].
    pub fn compute(&mut self) -> Result<&Sections, DescriptorError> {
        if self.state != BuildState::Idle {
            return Err(DescriptorError::InvalidState(format!(
                "compute called in state {:?}",
                self.state
            )));
        }
        let config = self.config.ok_or(DescriptorError::MissingConfiguration)?;
        if self.template.is_none() {
            return Err(DescriptorError::MissingTemplate);
        }

        self.state = BuildState::Computing;

        let items = category::filter(self.items, &config.categories);
        debug!("Categories: {} category groups applied", config.categories.len());

        let layout = layout::compute(config);
        debug!("Layout: {} region(s)", layout.regions.len());

        let standby = match schedule::standby_for(config, self.now) {
            Ok(standby) => standby,
            Err(e) => {
                self.state = BuildState::Idle;
                return Err(e);
            }
        };
        debug!("Schedule: standby {}", if standby.is_some() { "enabled" } else { "disabled" });

        let refresh_seconds = refresh::compute(config.duration_seconds, config.refresh_seconds);
        debug!("Refresh: {}s", refresh_seconds);

        Ok(&*self.sections.insert(Sections {
            items,
            layout,
            standby,
            refresh_seconds,
        }))
    }

    /// Substitute the computed sections into the template.
    pub fn finish(&mut self) -> Result<Descriptor, DescriptorError> {
        let (Some(sections), Some(template), Some(config)) =
            (self.sections.as_ref(), self.template, self.config)
        else {
            return Err(DescriptorError::InvalidState(format!(
                "finish called in state {:?}",
                self.state
            )));
        };
        if self.state != BuildState::Computing {
            return Err(DescriptorError::InvalidState(format!(
                "finish called in state {:?}",
                self.state
            )));
        }

        let refresh = sections.refresh_seconds.to_string();
        let layout = sections.layout.to_smil();
        let standby = sections.standby.as_ref().map(render_standby).unwrap_or_default();
        let commands = render_commands(&config.commands);

        let text = substitute(
            template,
            &[
                (PLACEHOLDER_REFRESH, refresh.as_str()),
                (PLACEHOLDER_LAYOUT, layout.as_str()),
                (PLACEHOLDER_STANDBY, standby.as_str()),
                (PLACEHOLDER_COMMANDS, commands.as_str()),
                (PLACEHOLDER_ITEMS, sections.items.as_str()),
            ],
        );

        let descriptor = Descriptor {
            text,
            commands: config.commands.clone(),
            refresh_seconds: sections.refresh_seconds,
        };
        self.state = BuildState::Done;
        Ok(descriptor)
    }

    /// Compute and finish in one go.
    pub fn build(mut self) -> Result<Descriptor, DescriptorError> {
        self.compute()?;
        self.finish()
    }
}

/// Render the standby block: dark from each end marker until the next begin.
pub fn render_standby(standby: &StandbySchedule) -> String {
    format!(
        "<par begin=\"{}\" end=\"{}\">\n    <ref src=\"adapi:blankScreen\" dur=\"indefinite\" />\n</par>",
        escape(standby.end.as_str()),
        escape(standby.begin.as_str())
    )
}

/// Render the command section, one `<meta>` per command.
pub fn render_commands(commands: &[PlayerCommand]) -> String {
    commands
        .iter()
        .map(|c| format!("<meta name=\"x-player-command\" content=\"{}\" />", c.wire_name()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace placeholders in a single left-to-right pass.
///
/// Substituted values are never rescanned, so placeholder-like text inside
/// playlist items survives untouched.
fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match values.iter().find(|(name, _)| tail.starts_with(name)) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
