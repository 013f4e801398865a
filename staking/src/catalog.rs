//! The program catalog: every stake program the engine knows, keyed by id.

use crate::error::StakingError;
use crate::program::{build_fine_tiers, ProgramId, StakeProgram};
use serde::{Deserialize, Serialize};

/// Ordered set of stake programs. A program's id is its position here.
///
/// Programs are never removed; retiring one means marking it inactive.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProgramCatalog {
    programs: Vec<StakeProgram>,
}

impl ProgramCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of programs, renumbering each to its catalog position.
    pub fn install(&mut self, programs: Vec<StakeProgram>) -> Result<(), StakingError> {
        for program in programs {
            self.push(program)?;
        }
        Ok(())
    }

    fn next_id(&self) -> Result<ProgramId, StakingError> {
        ProgramId::try_from(self.programs.len()).map_err(|_| StakingError::Overflow)
    }

    fn push(&mut self, mut program: StakeProgram) -> Result<ProgramId, StakingError> {
        let id = self.next_id()?;
        program.id = id;
        self.programs.push(program);
        Ok(id)
    }

    /// Add an active program with no fine schedule.
    pub fn add(&mut self, period_secs: u64, apy: u32) -> Result<ProgramId, StakingError> {
        let id = self.next_id()?;
        self.push(StakeProgram::new(id, period_secs, apy))
    }

    /// Add an active program together with its fine schedule.
    pub fn add_with_fines(
        &mut self,
        period_secs: u64,
        apy: u32,
        thresholds: &[u64],
        fine_percents: &[u8],
    ) -> Result<ProgramId, StakingError> {
        let id = self.next_id()?;
        let program = StakeProgram::with_fines(id, period_secs, apy, thresholds, fine_percents)?;
        self.push(program)
    }

    /// Replace a program's fine schedule.
    pub fn set_fines(
        &mut self,
        id: ProgramId,
        thresholds: &[u64],
        fine_percents: &[u8],
    ) -> Result<(), StakingError> {
        let tiers = build_fine_tiers(thresholds, fine_percents)?;
        self.get_mut(id)?.fine_tiers = tiers;
        Ok(())
    }

    /// Update a program's activity flag, period and apy. Fines are untouched.
    pub fn change(
        &mut self,
        id: ProgramId,
        active: bool,
        period_secs: u64,
        apy: u32,
    ) -> Result<(), StakingError> {
        let program = self.get_mut(id)?;
        program.active = active;
        program.period_secs = period_secs;
        program.apy = apy;
        Ok(())
    }

    pub fn get(&self, id: ProgramId) -> Result<&StakeProgram, StakingError> {
        self.programs
            .get(id as usize)
            .ok_or(StakingError::ProgramNotFound(id))
    }

    fn get_mut(&mut self, id: ProgramId) -> Result<&mut StakeProgram, StakingError> {
        self.programs
            .get_mut(id as usize)
            .ok_or(StakingError::ProgramNotFound(id))
    }

    /// Like [`get`](Self::get) but also requires the program to accept deposits.
    pub fn get_active(&self, id: ProgramId) -> Result<&StakeProgram, StakingError> {
        let program = self.get(id)?;
        if !program.active {
            return Err(StakingError::ProgramInactive(id));
        }
        Ok(program)
    }

    /// `(threshold_secs, fine_percent)` of one tier of a program's schedule.
    pub fn fine_period_and_fine(
        &self,
        id: ProgramId,
        tier_index: usize,
    ) -> Result<(u64, u8), StakingError> {
        let tier = self.get(id)?.fine_tier(tier_index)?;
        Ok((tier.threshold_secs, tier.fine_percent))
    }

    pub fn count(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StakeProgram> {
        self.programs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::default_programs;

    #[test]
    fn install_renumbers_programs() {
        let mut catalog = ProgramCatalog::new();
        let mut programs = default_programs();
        programs[0].id = 42;
        catalog.install(programs).unwrap();
        assert_eq!(catalog.count(), 3);
        assert_eq!(catalog.get(0).unwrap().id, 0);
        assert_eq!(catalog.get(2).unwrap().apy, 36);
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let mut catalog = ProgramCatalog::new();
        assert_eq!(catalog.add(100, 5).unwrap(), 0);
        assert_eq!(catalog.add_with_fines(200, 6, &[50], &[10]).unwrap(), 1);
        assert_eq!(catalog.fine_period_and_fine(1, 0).unwrap(), (50, 10));
    }

    #[test]
    fn failed_add_does_not_consume_an_id() {
        let mut catalog = ProgramCatalog::new();
        assert!(catalog.add_with_fines(200, 6, &[50, 60], &[10]).is_err());
        assert!(catalog.is_empty());
        assert_eq!(catalog.add(100, 5).unwrap(), 0);
    }

    #[test]
    fn set_fines_replaces_schedule() {
        let mut catalog = ProgramCatalog::new();
        catalog.install(default_programs()).unwrap();
        catalog.set_fines(1, &[10], &[5]).unwrap();
        assert_eq!(catalog.get(1).unwrap().tier_count(), 1);
        assert_eq!(catalog.fine_period_and_fine(1, 0).unwrap(), (10, 5));
        assert!(catalog.fine_period_and_fine(1, 1).is_err());
    }

    #[test]
    fn set_fines_mismatch_leaves_schedule_intact() {
        let mut catalog = ProgramCatalog::new();
        catalog.install(default_programs()).unwrap();
        assert!(catalog.set_fines(1, &[10, 20], &[5]).is_err());
        assert_eq!(catalog.get(1).unwrap().tier_count(), 3);
    }

    #[test]
    fn change_deactivates_program() {
        let mut catalog = ProgramCatalog::new();
        catalog.install(default_programs()).unwrap();
        catalog.change(0, false, 12, 14).unwrap();
        let program = catalog.get(0).unwrap();
        assert!(!program.active);
        assert_eq!(program.period_secs, 12);
        assert_eq!(program.apy, 14);
        assert_eq!(
            catalog.get_active(0).unwrap_err(),
            StakingError::ProgramInactive(0)
        );
    }

    #[test]
    fn unknown_program_is_not_found() {
        let catalog = ProgramCatalog::new();
        assert_eq!(catalog.get(3).unwrap_err(), StakingError::ProgramNotFound(3));
    }
}
