//! Resource types with field-mask updates.
//!
//! Each module declares the resource's schema, its update request message,
//! its path map and the [`ResourceUpdate`](crate::request::ResourceUpdate)
//! implementation tying them together.

pub mod datatransfer_endpoint;
pub mod iam_service_account;
pub mod mdb_mysql_user;

use crate::client::UpdateClient;
use crate::config::UpdateOptions;
use crate::updater::{Updater, UpdaterRegistry};

/// Clients for every shipped resource type.
pub struct ResourceClients<Sa, Mu, De> {
    /// Client for `yandex_iam_service_account`.
    pub service_accounts: Sa,
    /// Client for `yandex_mdb_mysql_user`.
    pub mysql_users: Mu,
    /// Client for `yandex_datatransfer_endpoint`.
    pub transfer_endpoints: De,
}

/// A registry with an updater for every shipped resource type.
pub fn registry<Sa, Mu, De>(
    clients: ResourceClients<Sa, Mu, De>,
    options: UpdateOptions,
) -> UpdaterRegistry
where
    Sa: UpdateClient<iam_service_account::UpdateServiceAccountRequest>,
    Mu: UpdateClient<mdb_mysql_user::UpdateUserRequest>,
    De: UpdateClient<datatransfer_endpoint::UpdateEndpointRequest>,
{
    UpdaterRegistry::new()
        .with_updater(Updater::<iam_service_account::ServiceAccount, _>::with_options(
            clients.service_accounts,
            options.clone(),
        ))
        .with_updater(Updater::<mdb_mysql_user::MysqlUser, _>::with_options(
            clients.mysql_users,
            options.clone(),
        ))
        .with_updater(Updater::<datatransfer_endpoint::TransferEndpoint, _>::with_options(
            clients.transfer_endpoints,
            options,
        ))
}
