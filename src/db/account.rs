//! Requestor registry operations.

use super::AppState;
use crate::account::models::Account;

impl AppState {
    pub fn insert_account(&self, first_name: String, last_name: String, email: Option<String>) -> Account {
        let account = Account {
            id: self.next_account_id(),
            first_name,
            last_name,
            email,
            created_at: chrono::Utc::now(),
        };
        self.accounts.write().insert(account.id, account.clone());
        account
    }

    pub fn get_account(&self, id: i64) -> Option<Account> {
        self.accounts.read().get(&id).cloned()
    }

    pub fn all_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.read().values().cloned().collect();
        accounts.sort_by_key(|a| a.id);
        accounts
    }
}
