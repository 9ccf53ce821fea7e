//! Value transfer against the protocol's SEP-41 token.

use soroban_sdk::{token, Address, Env};

use crate::errors::SarcophagusError;
use crate::storage;

/// All-or-nothing movement of token value between an account and the contract.
pub trait ValueTransfer {
    /// Pulls `amount` from `payer` into the contract.
    fn transfer_from(&self, payer: &Address, amount: i128) -> Result<(), SarcophagusError>;

    /// Pays `amount` held by the contract out to `payee`.
    fn transfer_to(&self, payee: &Address, amount: i128) -> Result<(), SarcophagusError>;

    fn balance_of(&self, account: &Address) -> i128;
}

/// [`ValueTransfer`] backed by the token configured at initialisation.
pub struct TokenTransfer<'a> {
    env: &'a Env,
    client: token::Client<'a>,
}

impl<'a> TokenTransfer<'a> {
    pub fn load(env: &'a Env) -> Result<Self, SarcophagusError> {
        let token = storage::token(env)?;
        Ok(TokenTransfer {
            env,
            client: token::Client::new(env, &token),
        })
    }
}

impl ValueTransfer for TokenTransfer<'_> {
    fn transfer_from(&self, payer: &Address, amount: i128) -> Result<(), SarcophagusError> {
        if amount < 0 {
            return Err(SarcophagusError::InvalidAmount);
        }
        if amount == 0 {
            return Ok(());
        }
        if self.balance_of(payer) < amount {
            return Err(SarcophagusError::FailedTransfer);
        }
        self.client
            .transfer(payer, &self.env.current_contract_address(), &amount);
        Ok(())
    }

    fn transfer_to(&self, payee: &Address, amount: i128) -> Result<(), SarcophagusError> {
        if amount < 0 {
            return Err(SarcophagusError::InvalidAmount);
        }
        if amount == 0 {
            return Ok(());
        }
        let contract = self.env.current_contract_address();
        if self.balance_of(&contract) < amount {
            return Err(SarcophagusError::FailedTransfer);
        }
        self.client.transfer(&contract, payee, &amount);
        Ok(())
    }

    fn balance_of(&self, account: &Address) -> i128 {
        self.client.balance(account)
    }
}
