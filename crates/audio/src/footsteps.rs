//! Resolved footstep associations.

use crate::{AcousticSound, CompiledAcoustic, FootprintEvent, StepEvent, SubjectId};
use glam::Vec3;

/// What a subject's step resolved to.
///
/// Either a compiled acoustic, or "no association" with the block's plain
/// step sound as a fallback. Both may carry a footprint.
#[derive(Debug, Clone)]
pub struct Association {
    /// Stepping subject.
    pub subject: SubjectId,
    /// Where the step happened.
    pub position: Vec3,
    /// Step kind.
    pub event: StepEvent,
    /// Resolved acoustics; `None` means no association.
    pub acoustics: Option<CompiledAcoustic>,
    /// Fallback block step sound.
    pub step_sound: Option<AcousticSound>,
    /// Stepping in liquid; suppresses the fallback step sound.
    pub liquid: bool,
    /// Print to leave behind.
    pub footprint: Option<FootprintEvent>,
}

impl Association {
    /// Association playing `acoustics`.
    pub fn new(subject: SubjectId, position: Vec3, event: StepEvent, acoustics: CompiledAcoustic) -> Self {
        Self {
            subject,
            position,
            event,
            acoustics: Some(acoustics),
            step_sound: None,
            liquid: false,
            footprint: None,
        }
    }

    /// No association: fall back to the block's own step sound.
    pub fn unassociated(
        subject: SubjectId,
        position: Vec3,
        event: StepEvent,
        step_sound: Option<AcousticSound>,
    ) -> Self {
        Self {
            subject,
            position,
            event,
            acoustics: None,
            step_sound,
            liquid: false,
            footprint: None,
        }
    }

    /// Attach a footprint.
    pub fn with_footprint(mut self, footprint: FootprintEvent) -> Self {
        self.footprint = Some(footprint);
        self
    }

    /// Mark the step as taken in liquid.
    pub fn in_liquid(mut self) -> Self {
        self.liquid = true;
        self
    }

    /// True when the step has no acoustics.
    pub fn is_unassociated(&self) -> bool {
        self.acoustics.is_none()
    }
}
