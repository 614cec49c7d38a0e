//! Timing path records as supplied by the timing source.

use serde::{Deserialize, Serialize};
use star_config::PathType;

/// Clock label used when a path end has no clock.
pub const UNDEF_CLOCK: &str = "undef";

/// The kind of design object at a path end.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    /// A cell pin inside the design hierarchy.
    Pin,
    /// A top-level port.
    Port,
    /// Anything else the tool may report (nets, clocks, ...).
    #[serde(other)]
    Other,
}

/// One timing path as reported by the timing source.
///
/// Records are immutable once produced; the classifier and reducer only read them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingPathRecord {
    /// Full name of the path startpoint.
    pub startpoint_name: String,
    /// Object class of the startpoint.
    pub startpoint_class: ObjectClass,
    /// Full name of the path endpoint.
    pub endpoint_name: String,
    /// Object class of the endpoint.
    pub endpoint_class: ObjectClass,
    /// Launching clock, if any.
    #[serde(default)]
    pub startpoint_clock: Option<String>,
    /// Capturing clock, if any.
    #[serde(default)]
    pub endpoint_clock: Option<String>,
    /// Path group the tool assigned this path to.
    pub path_group: String,
    /// Slack in nanoseconds.
    pub slack: f64,
}

impl TimingPathRecord {
    /// Returns the launching clock name, or [`UNDEF_CLOCK`].
    pub fn startpoint_clock_label(&self) -> &str {
        clock_label(self.startpoint_clock.as_deref())
    }

    /// Returns the capturing clock name, or [`UNDEF_CLOCK`].
    pub fn endpoint_clock_label(&self) -> &str {
        clock_label(self.endpoint_clock.as_deref())
    }

    /// Returns the `endpointClock:startpointClock` pair.
    ///
    /// The capturing clock comes first so that pairs sort by endpoint clock.
    pub fn clock_pair(&self) -> String {
        format!(
            "{}:{}",
            self.endpoint_clock_label(),
            self.startpoint_clock_label()
        )
    }

    /// Returns the start/end path type. Any non-pin end counts as a port.
    pub fn path_type(&self) -> PathType {
        PathType::from_ends(
            self.startpoint_class != ObjectClass::Pin,
            self.endpoint_class != ObjectClass::Pin,
        )
    }
}

fn clock_label(clock: Option<&str>) -> &str {
    match clock {
        Some(name) if !name.is_empty() => name,
        _ => UNDEF_CLOCK,
    }
}
