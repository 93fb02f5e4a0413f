use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, ID, Object, Schema, SimpleObject};
use tracing::error;

use crate::application::LedgerService;
use crate::domain::{Account, Coins};

/// GraphQL view of an account.
#[derive(SimpleObject)]
pub struct User {
    pub id: ID,
    pub coins: Coins,
}

impl From<Account> for User {
    fn from(account: Account) -> Self {
        Self {
            id: ID(account.id),
            coins: account.coins,
        }
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Fetch one account by id.
    async fn user(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<User> {
        let service = ctx.data_unchecked::<Arc<LedgerService>>();

        match service.get_account(&id).await {
            Ok(account) => Ok(account.into()),
            Err(err) => {
                error!(id = %*id, %err, "user query failed");
                Err("Failed to fetch user".into())
            }
        }
    }

    /// Fetch all accounts. No pagination.
    async fn users(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<User>> {
        let service = ctx.data_unchecked::<Arc<LedgerService>>();

        match service.list_accounts().await {
            Ok(accounts) => Ok(accounts.into_iter().map(User::from).collect()),
            Err(err) => {
                error!(%err, "users query failed");
                Err("Failed to fetch users".into())
            }
        }
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Add coins to an account's balance and return the updated account.
    /// `amount` may be negative; the balance may go below zero.
    async fn add_coins(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
        amount: Coins,
    ) -> async_graphql::Result<User> {
        let service = ctx.data_unchecked::<Arc<LedgerService>>();

        match service.credit(&user_id, amount).await {
            Ok(account) => Ok(account.into()),
            Err(err) => {
                error!(user_id = %*user_id, amount, %err, "addCoins mutation failed");
                Err("Failed to add coins".into())
            }
        }
    }
}

pub type ApiSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the executable schema with the ledger service injected.
pub fn build_schema(service: Arc<LedgerService>) -> ApiSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(service)
        .finish()
}
