//! Timeline projection
//!
//! Projects a canonical [`OrderLifecycle`] onto the fixed five-milestone
//! tracking timeline. Terminal states (returned, cancelled) are off the
//! forward path: every step renders inactive and progress is zero.

use crate::status::OrderLifecycle;

/// The forward fulfilment milestones, in display order.
pub const MILESTONES: [OrderLifecycle; 5] = [
    OrderLifecycle::Pending,
    OrderLifecycle::Paid,
    OrderLifecycle::Processed,
    OrderLifecycle::Shipped,
    OrderLifecycle::Delivered,
];

/// Visual state of one timeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// Before the current milestone.
    Completed,

    /// The current milestone.
    Current,

    /// After the current milestone, or any step of an off-path order.
    Inactive,
}

/// The projected timeline for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineProjection {
    steps: [StepState; MILESTONES.len()],
    current_step: Option<usize>,
    progress_percent: u8,
}

impl TimelineProjection {
    /// Per-milestone visual states, index-aligned with [`MILESTONES`].
    #[must_use]
    pub fn steps(&self) -> &[StepState; MILESTONES.len()] {
        &self.steps
    }

    /// Index of the current milestone; `None` for off-path orders.
    #[must_use]
    pub fn current_step(&self) -> Option<usize> {
        self.current_step
    }

    /// Progress along the timeline: `index / (len − 1) × 100`.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    /// Whether the order sits outside the forward timeline.
    #[must_use]
    pub fn is_off_path(&self) -> bool {
        self.current_step.is_none()
    }
}

/// Projects a lifecycle state onto the milestone sequence.
#[must_use]
pub fn project(lifecycle: OrderLifecycle) -> TimelineProjection {
    let Some(current) = MILESTONES.iter().position(|step| *step == lifecycle) else {
        // Returned / Cancelled: not a position on the forward timeline.
        return TimelineProjection {
            steps: [StepState::Inactive; MILESTONES.len()],
            current_step: None,
            progress_percent: 0,
        };
    };

    let mut steps = [StepState::Inactive; MILESTONES.len()];

    for (index, step) in steps.iter_mut().enumerate() {
        *step = match index.cmp(&current) {
            std::cmp::Ordering::Less => StepState::Completed,
            std::cmp::Ordering::Equal => StepState::Current,
            std::cmp::Ordering::Greater => StepState::Inactive,
        };
    }

    let last = MILESTONES.len() - 1;
    let percent = current * 100 / last;

    TimelineProjection {
        steps,
        current_step: Some(current),
        progress_percent: u8::try_from(percent).unwrap_or(100),
    }
}
