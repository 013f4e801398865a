//! Owner gating, the pause flag and the one-time configuration lock.

use crate::error::StakingError;
use pledge_types::Address;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminGuard {
    owner: Address,
    paused: bool,
    configured: bool,
}

impl AdminGuard {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            paused: false,
            configured: false,
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn ensure_owner(&self, caller: &Address) -> Result<(), StakingError> {
        if *caller != self.owner {
            return Err(StakingError::NotOwner(caller.clone()));
        }
        Ok(())
    }

    pub fn ensure_not_paused(&self) -> Result<(), StakingError> {
        if self.paused {
            return Err(StakingError::ProgramPaused);
        }
        Ok(())
    }

    pub fn ensure_not_configured(&self) -> Result<(), StakingError> {
        if self.configured {
            return Err(StakingError::AlreadyConfigured);
        }
        Ok(())
    }

    pub fn set_paused(&mut self, caller: &Address, paused: bool) -> Result<(), StakingError> {
        self.ensure_owner(caller)?;
        self.paused = paused;
        Ok(())
    }

    /// Flip the one-shot configuration lock. Callers check ownership first.
    pub(crate) fn mark_configured(&mut self) {
        self.configured = true;
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), StakingError> {
        self.ensure_owner(caller)?;
        self.owner = new_owner;
        Ok(())
    }
}
