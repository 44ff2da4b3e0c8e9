//! Frame acceptance filtering for the receive path.
//!
//! Up to four independently configured filter units (three exact-match
//! filters A, B, C and one range filter) decide whether a received
//! identifier enters the receive buffer. Each unit carries a
//! [`FrameClassMask`] naming the frame classes it applies to; a unit whose
//! mask does not cover the received frame's class abstains. The combined
//! decision is the OR of the units that matched, with two explicit
//! pass-through rules: a build with no filter unit present accepts
//! everything (filtering must never silently block traffic it was never
//! built to judge), and a globally disabled filter stage accepts everything.
//!
//! The decision is evaluated combinationally from the tick's inputs and
//! registered one tick later; the registered copy is what gates the four
//! downstream strobes. A strobe for a rejected frame is suppressed outright,
//! including the abort strobe: a receive buffer that never accepted the
//! frame has nothing to abort.

use serde::{Deserialize, Serialize};

use crate::types::{CanId, FrameClass, FrameClassMask, FrameKind, IdentifierKind};

/// One exact-match filter unit (A, B or C).
///
/// Matches when the received identifier agrees with `value` on every bit set
/// in `mask`. For base-format identifiers the configuration supplier keeps
/// the upper 18 bits of both words zero; this is a contract, not a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactFilter {
    /// Identifier bits to compare against.
    pub value: CanId,
    /// Which identifier bits participate in the comparison.
    pub mask: CanId,
    /// Frame classes this unit applies to.
    pub accept: FrameClassMask,
}

impl ExactFilter {
    fn matches(&self, identifier: CanId, class: FrameClass) -> bool {
        self.accept.contains(class)
            && identifier.value() & self.mask.value() == self.value.value() & self.mask.value()
    }
}

/// The range filter unit: matches identifiers inside a closed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFilter {
    /// Lowest accepted identifier.
    pub low: CanId,
    /// Highest accepted identifier.
    pub high: CanId,
    /// Frame classes this unit applies to.
    pub accept: FrameClassMask,
}

impl RangeFilter {
    fn matches(&self, identifier: CanId, class: FrameClass) -> bool {
        self.accept.contains(class)
            && self.low.value() <= identifier.value()
            && identifier.value() <= self.high.value()
    }
}

/// Build-time capability and configuration of the acceptance stage.
///
/// `None` models a filter unit that was not built in; an absent unit never
/// asserts a match and never gates the other units' eligibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceConfig {
    /// Exact-match filter A, if built in.
    pub filter_a: Option<ExactFilter>,
    /// Exact-match filter B, if built in.
    pub filter_b: Option<ExactFilter>,
    /// Exact-match filter C, if built in.
    pub filter_c: Option<ExactFilter>,
    /// Range filter, if built in.
    pub range: Option<RangeFilter>,
    /// Global enable; when false the stage passes every frame through.
    pub filters_enabled: bool,
}

impl AcceptanceConfig {
    /// Whether any filter unit is built into this configuration.
    pub fn any_present(&self) -> bool {
        self.filter_a.is_some()
            || self.filter_b.is_some()
            || self.filter_c.is_some()
            || self.range.is_some()
    }
}

/// Unfiltered control strobes from the protocol controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrobeSet {
    /// Commit the frame's identifier and format words.
    pub store_metadata: bool,
    /// Commit one data word.
    pub store_data: bool,
    /// The frame completed reception successfully.
    pub rec_valid: bool,
    /// The frame reception was aborted.
    pub rec_abort: bool,
}

impl StrobeSet {
    fn gated(self, accept: bool) -> Self {
        if accept { self } else { Self::default() }
    }
}

/// Per-unit match status of the most recent evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStatus {
    /// Filter A matched.
    pub a: bool,
    /// Filter B matched.
    pub b: bool,
    /// Filter C matched.
    pub c: bool,
    /// The range filter matched.
    pub range: bool,
}

impl FilterStatus {
    /// Whether any unit matched.
    #[inline]
    pub fn any(self) -> bool {
        self.a || self.b || self.c || self.range
    }
}

/// Input wires of the [`FrameFilter`], observed once per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterInput {
    /// The received identifier, right-aligned.
    pub identifier: CanId,
    /// Identifier format of the received frame.
    pub identifier_kind: IdentifierKind,
    /// Protocol flavor of the received frame.
    pub frame_kind: FrameKind,
    /// Strobes to gate by the registered decision.
    pub strobes: StrobeSet,
}

/// Outputs of one filter tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOutput {
    /// The registered accept decision gating this tick's strobes.
    pub accept: bool,
    /// Combinational per-unit match status for this tick's identifier.
    pub status: FilterStatus,
    /// The input strobes, forwarded only while the registered decision
    /// is accept.
    pub strobes: StrobeSet,
}

/// The acceptance-filter stage: combinational decision, one-tick pipeline.
///
/// The only registered element is the single-tick delay on the combined
/// decision; there is no multi-cycle sequencing.
#[derive(Debug, Clone)]
pub struct FrameFilter {
    config: AcceptanceConfig,
    latched_accept: bool,
}

impl FrameFilter {
    /// Creates a filter stage with the given configuration.
    pub fn new(config: AcceptanceConfig) -> Self {
        Self {
            config,
            latched_accept: false,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &AcceptanceConfig {
        &self.config
    }

    /// Replaces the configuration. Takes effect at the next evaluation; the
    /// already-registered decision is left undisturbed.
    pub fn set_config(&mut self, config: AcceptanceConfig) {
        self.config = config;
    }

    /// Asynchronous reset: drops the registered decision to reject.
    pub fn reset(&mut self) {
        self.latched_accept = false;
    }

    /// Evaluates the combined decision for an identifier combinationally,
    /// without touching the pipeline register.
    pub fn evaluate(&self, identifier: CanId, class: FrameClass) -> (bool, FilterStatus) {
        let status = FilterStatus {
            a: self
                .config
                .filter_a
                .is_some_and(|f| f.matches(identifier, class)),
            b: self
                .config
                .filter_b
                .is_some_and(|f| f.matches(identifier, class)),
            c: self
                .config
                .filter_c
                .is_some_and(|f| f.matches(identifier, class)),
            range: self
                .config
                .range
                .is_some_and(|f| f.matches(identifier, class)),
        };

        // A build with no filter unit must never block traffic; this is an
        // explicit rule, not a consequence of the OR over zero units.
        let combined = if !self.config.any_present() {
            true
        } else if !self.config.filters_enabled {
            true
        } else {
            status.any()
        };
        (combined, status)
    }

    /// Advances the filter by one tick.
    ///
    /// Gates the tick's strobes by the decision registered on the previous
    /// tick, then registers the decision for this tick's identifier.
    pub fn tick(&mut self, input: &FilterInput) -> FilterOutput {
        let class = FrameClass::from_parts(input.frame_kind, input.identifier_kind);
        let (combined, status) = self.evaluate(input.identifier, class);

        let accept = self.latched_accept;
        let output = FilterOutput {
            accept,
            status,
            strobes: input.strobes.gated(accept),
        };
        self.latched_accept = combined;
        output
    }
}
