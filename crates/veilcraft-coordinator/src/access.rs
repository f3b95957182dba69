// crates/veilcraft-coordinator/src/access.rs
//
// Owner and provider roles plus the global pause flag.
//
// Providers are never deleted: revocation clears the flag and keeps the
// entry, so historical submissions still resolve to a known account.

use std::collections::HashMap;

use veilcraft_core::error::CraftError;
use veilcraft_core::identity::Address;

/// Role registry for the coordinator.
#[derive(Debug, Clone)]
pub struct AccessControl {
    owner: Address,
    /// Every address ever granted the provider role, with its current flag.
    providers: HashMap<Address, bool>,
    paused: bool,
}

impl AccessControl {
    /// Create a registry owned by `owner`, unpaused, with no providers.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            providers: HashMap::new(),
            paused: false,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether `addr` currently holds the provider role.
    pub fn is_provider(&self, addr: &Address) -> bool {
        self.providers.get(addr).copied().unwrap_or(false)
    }

    /// Whether `addr` was ever granted the provider role (revoked or not).
    pub fn is_known_provider(&self, addr: &Address) -> bool {
        self.providers.contains_key(addr)
    }

    /// Active providers, sorted by address.
    pub fn active_providers(&self) -> Vec<Address> {
        let mut active: Vec<Address> = self
            .providers
            .iter()
            .filter(|(_, active)| **active)
            .map(|(addr, _)| *addr)
            .collect();
        active.sort();
        active
    }

    /// # Errors
    /// Returns `CraftError::NotOwner` if `caller` is not the owner.
    pub fn ensure_owner(&self, caller: &Address) -> Result<(), CraftError> {
        if *caller != self.owner {
            return Err(CraftError::NotOwner);
        }
        Ok(())
    }

    /// # Errors
    /// Returns `CraftError::NotProvider` if `caller` is not an active provider.
    pub fn ensure_provider(&self, caller: &Address) -> Result<(), CraftError> {
        if !self.is_provider(caller) {
            return Err(CraftError::NotProvider);
        }
        Ok(())
    }

    /// # Errors
    /// Returns `CraftError::Paused` while paused.
    pub fn ensure_not_paused(&self) -> Result<(), CraftError> {
        if self.paused {
            return Err(CraftError::Paused);
        }
        Ok(())
    }

    /// Hand ownership to `new_owner`. Returns the previous owner.
    ///
    /// # Errors
    /// `NotOwner` for any caller but the owner, `InvalidAddress` for the zero address.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<Address, CraftError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(CraftError::InvalidAddress);
        }
        let previous = self.owner;
        self.owner = new_owner;
        Ok(previous)
    }

    /// Grant the provider role. Granting twice is harmless.
    pub fn add_provider(&mut self, caller: &Address, provider: Address) -> Result<(), CraftError> {
        self.ensure_owner(caller)?;
        if provider.is_zero() {
            return Err(CraftError::InvalidAddress);
        }
        self.providers.insert(provider, true);
        Ok(())
    }

    /// Revoke the provider role, keeping the address on record.
    pub fn remove_provider(&mut self, caller: &Address, provider: Address) -> Result<(), CraftError> {
        self.ensure_owner(caller)?;
        self.providers.insert(provider, false);
        Ok(())
    }

    /// # Errors
    /// `NotOwner`, or `Paused` if already paused.
    pub fn pause(&mut self, caller: &Address) -> Result<(), CraftError> {
        self.ensure_owner(caller)?;
        self.ensure_not_paused()?;
        self.paused = true;
        Ok(())
    }

    /// # Errors
    /// `NotOwner`, or `NotPaused` if not paused.
    pub fn unpause(&mut self, caller: &Address) -> Result<(), CraftError> {
        self.ensure_owner(caller)?;
        if !self.paused {
            return Err(CraftError::NotPaused);
        }
        self.paused = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::derive("owner")
    }

    fn alice() -> Address {
        Address::derive("alice")
    }

    #[test]
    fn test_only_owner_mutates() {
        let mut acl = AccessControl::new(owner());
        let mallory = Address::derive("mallory");

        assert!(matches!(acl.add_provider(&mallory, alice()), Err(CraftError::NotOwner)));
        assert!(matches!(acl.remove_provider(&mallory, alice()), Err(CraftError::NotOwner)));
        assert!(matches!(acl.pause(&mallory), Err(CraftError::NotOwner)));
        assert!(matches!(acl.unpause(&mallory), Err(CraftError::NotOwner)));
        assert!(matches!(
            acl.transfer_ownership(&mallory, mallory),
            Err(CraftError::NotOwner)
        ));
        assert_eq!(acl.owner(), owner());
        assert!(!acl.is_paused());
    }

    #[test]
    fn test_add_and_remove_provider() {
        let mut acl = AccessControl::new(owner());
        acl.add_provider(&owner(), alice()).unwrap();
        assert!(acl.is_provider(&alice()));
        assert_eq!(acl.active_providers(), vec![alice()]);

        acl.remove_provider(&owner(), alice()).unwrap();
        assert!(!acl.is_provider(&alice()));
        // Soft delete: the address stays on record.
        assert!(acl.is_known_provider(&alice()));
        assert!(acl.active_providers().is_empty());
    }

    #[test]
    fn test_zero_address_rejected() {
        let mut acl = AccessControl::new(owner());
        assert!(matches!(
            acl.add_provider(&owner(), Address::ZERO),
            Err(CraftError::InvalidAddress)
        ));
        assert!(matches!(
            acl.transfer_ownership(&owner(), Address::ZERO),
            Err(CraftError::InvalidAddress)
        ));
    }

    #[test]
    fn test_transfer_ownership() {
        let mut acl = AccessControl::new(owner());
        let previous = acl.transfer_ownership(&owner(), alice()).unwrap();
        assert_eq!(previous, owner());
        assert_eq!(acl.owner(), alice());
        // Old owner lost its rights.
        assert!(matches!(acl.pause(&owner()), Err(CraftError::NotOwner)));
        assert!(acl.pause(&alice()).is_ok());
    }

    #[test]
    fn test_pause_state_guards() {
        let mut acl = AccessControl::new(owner());
        assert!(matches!(acl.unpause(&owner()), Err(CraftError::NotPaused)));

        acl.pause(&owner()).unwrap();
        assert!(acl.is_paused());
        assert!(matches!(acl.pause(&owner()), Err(CraftError::Paused)));
        assert!(matches!(acl.ensure_not_paused(), Err(CraftError::Paused)));

        acl.unpause(&owner()).unwrap();
        assert!(!acl.is_paused());
        assert!(acl.ensure_not_paused().is_ok());
    }
}
