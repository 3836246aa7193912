//! Simulation-local keypairs and the reverse lookup used to pick a signer.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::Rng;

use crate::address::AccountAddress;

/// A keypair owned by the simulation harness together with its chain address.
#[derive(Debug, Clone)]
pub struct SimAccount {
    /// Chain address derived from the public key.
    pub address: AccountAddress,
    /// Public key.
    pub pub_key: VerifyingKey,
    /// Private key used to sign transactions.
    pub priv_key: SigningKey,
}

impl SimAccount {
    /// Build an account from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let priv_key = SigningKey::from_bytes(&seed);
        let pub_key = priv_key.verifying_key();
        Self {
            address: AccountAddress::from_public_key(pub_key.as_bytes()),
            pub_key,
            priv_key,
        }
    }
}

impl PartialEq for SimAccount {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.pub_key == other.pub_key
    }
}

impl Eq for SimAccount {}

/// Generate `count` accounts from the simulation's random stream.
pub fn random_accounts<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<SimAccount> {
    (0..count)
        .map(|_| {
            let mut seed = [0u8; 32];
            rng.fill_bytes(&mut seed);
            SimAccount::from_seed(seed)
        })
        .collect()
}

/// Find the simulation account registered for `address`.
pub fn find_account<'a>(
    accounts: &'a [SimAccount],
    address: &AccountAddress,
) -> Option<&'a SimAccount> {
    accounts.iter().find(|account| &account.address == address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::sim_rng;

    #[test]
    fn accounts_are_reproducible_and_distinct() {
        let a = random_accounts(&mut sim_rng(3), 5);
        let b = random_accounts(&mut sim_rng(3), 5);
        assert_eq!(a, b);
        for (i, left) in a.iter().enumerate() {
            for right in &a[i + 1..] {
                assert_ne!(left.address, right.address);
            }
        }
    }

    #[test]
    fn lookup_is_explicit() {
        let accounts = random_accounts(&mut sim_rng(4), 3);
        let target = accounts[2].address;
        assert_eq!(find_account(&accounts, &target), Some(&accounts[2]));
        let stranger = AccountAddress::new([0xee; 20]);
        assert!(find_account(&accounts, &stranger).is_none());
    }
}
