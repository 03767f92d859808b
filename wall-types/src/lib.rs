//! Wall types shared by the simulation engine and its consumers
//!
//! These types are used by both:
//! - the worker and manager actors that build the wall
//! - whoever reads the final wall state (reports, the command line tool)
//!
//! A `Section` is deliberately not `Clone`: at any moment exactly one owner
//! holds it. A `Profile` lends its sections out by value and takes them back
//! with [`Profile::restore`].

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Height every section is built up to.
pub const MAX_HEIGHT: u32 = 30;

/// Lowest accepted initial height.
pub const MIN_HEIGHT: u32 = 0;

// ============================================================================
// Identifiers
// ============================================================================

/// Profile identifier, 1-based in input order
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileId(pub usize);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Section position within its profile, 0-based
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionId(pub usize);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a section across the whole wall
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionKey {
    pub profile_id: ProfileId,
    pub section_id: SectionId,
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.profile_id, self.section_id)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("height {height} is out of range {min}..={max}")]
    HeightOutOfRange { height: u32, min: u32, max: u32 },
    #[error("section {key} does not belong to profile {profile_id}")]
    ForeignSection {
        profile_id: ProfileId,
        key: SectionKey,
    },
    #[error("profile {profile_id} has no section {section_id}")]
    UnknownSection {
        profile_id: ProfileId,
        section_id: SectionId,
    },
    #[error("section {key} is not on loan")]
    SectionNotOnLoan { key: SectionKey },
}

// ============================================================================
// Section
// ============================================================================

/// One entry of a section history: the height reached at the end of `day`.
/// Day 0 is the initial height.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct HeightStep {
    pub day: u32,
    pub height: u32,
}

/// Independently built unit of the wall
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Section {
    section_id: SectionId,
    profile_id: ProfileId,
    initial_height: u32,
    history: Vec<HeightStep>,
    #[serde(skip)]
    busy: bool,
}

impl Section {
    pub fn new(
        profile_id: ProfileId,
        section_id: SectionId,
        initial_height: u32,
    ) -> Result<Self, DomainError> {
        if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&initial_height) {
            return Err(DomainError::HeightOutOfRange {
                height: initial_height,
                min: MIN_HEIGHT,
                max: MAX_HEIGHT,
            });
        }

        Ok(Self {
            section_id,
            profile_id,
            initial_height,
            history: vec![HeightStep {
                day: 0,
                height: initial_height,
            }],
            busy: false,
        })
    }

    pub fn section_id(&self) -> SectionId {
        self.section_id
    }

    pub fn profile_id(&self) -> ProfileId {
        self.profile_id
    }

    pub fn key(&self) -> SectionKey {
        SectionKey {
            profile_id: self.profile_id,
            section_id: self.section_id,
        }
    }

    pub fn initial_height(&self) -> u32 {
        self.initial_height
    }

    /// Current height (last history entry)
    pub fn height(&self) -> u32 {
        self.history
            .last()
            .map_or(self.initial_height, |step| step.height)
    }

    pub fn history(&self) -> &[HeightStep] {
        &self.history
    }

    /// Number of build steps needed from the initial height
    pub fn steps_num(&self) -> u32 {
        MAX_HEIGHT - self.initial_height
    }

    pub fn is_completed(&self) -> bool {
        self.height() == MAX_HEIGHT
    }

    /// Whether a build step happened on `day`. Day 0 never counts.
    pub fn worked_on(&self, day: u32) -> bool {
        day > 0 && self.history.iter().skip(1).any(|step| step.day == day)
    }

    /// Adds one unit of height on `day`. Returns false, and leaves the
    /// history untouched, once the section is completed.
    pub fn build_step(&mut self, day: u32) -> bool {
        if self.is_completed() {
            return false;
        }

        let height = self.height() + 1;
        self.history.push(HeightStep { day, height });
        true
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn claim(&mut self) {
        self.busy = true;
    }
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
enum Slot {
    Present(Section),
    OnLoan(SectionId),
}

/// Ordered collection of sections built together
#[derive(Debug, PartialEq, Eq)]
pub struct Profile {
    profile_id: ProfileId,
    slots: Vec<Slot>,
}

impl Profile {
    pub fn new(profile_id: ProfileId, heights: &[u32]) -> Result<Self, DomainError> {
        let slots = heights
            .iter()
            .enumerate()
            .map(|(i, &height)| Section::new(profile_id, SectionId(i), height).map(Slot::Present))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { profile_id, slots })
    }

    pub fn profile_id(&self) -> ProfileId {
        self.profile_id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sections currently held by the profile, in section id order
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Present(section) => Some(section),
            Slot::OnLoan(_) => None,
        })
    }

    pub fn is_on_loan(&self, section_id: SectionId) -> bool {
        matches!(self.slots.get(section_id.0), Some(Slot::OnLoan(_)))
    }

    /// True when nothing is on loan and every section reached `MAX_HEIGHT`.
    pub fn is_completed(&self) -> bool {
        self.slots.iter().all(|slot| match slot {
            Slot::Present(section) => section.is_completed(),
            Slot::OnLoan(_) => false,
        })
    }

    /// First section nobody has claimed yet
    pub fn next_available_section(&self) -> Option<&Section> {
        self.sections().find(|section| !section.is_busy())
    }

    /// Claims the next available section and moves it out of the profile.
    /// The slot stays on loan until the section is restored.
    pub fn claim_next_available(&mut self) -> Option<Section> {
        let section_id = self.next_available_section()?.section_id();
        let slot = self.slots.get_mut(section_id.0)?;

        match std::mem::replace(slot, Slot::OnLoan(section_id)) {
            Slot::Present(mut section) => {
                section.claim();
                Some(section)
            }
            Slot::OnLoan(_) => None,
        }
    }

    /// Puts a section that was on loan back into its slot.
    pub fn restore(&mut self, section: Section) -> Result<(), DomainError> {
        let key = section.key();
        if key.profile_id != self.profile_id {
            return Err(DomainError::ForeignSection {
                profile_id: self.profile_id,
                key,
            });
        }

        if key.section_id.0 >= self.slots.len() {
            return Err(DomainError::UnknownSection {
                profile_id: self.profile_id,
                section_id: key.section_id,
            });
        }
        if !self.is_on_loan(key.section_id) {
            return Err(DomainError::SectionNotOnLoan { key });
        }
        self.slots[key.section_id.0] = Slot::Present(section);
        Ok(())
    }
}

impl Serialize for Profile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sections: Vec<&Section> = self.sections().collect();
        let mut state = serializer.serialize_struct("Profile", 2)?;
        state.serialize_field("profile_id", &self.profile_id)?;
        state.serialize_field("sections", &sections)?;
        state.end()
    }
}
