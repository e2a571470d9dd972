//! `yandex_mdb_mysql_user`.
//!
//! A user is identified by its cluster and name, both fixed for the life of
//! the resource. `permission` is a set block and is replaced as a whole;
//! each `connection_limits` leaf has its own mask path.

use std::sync::LazyLock;

use crate::error::UpdateError;
use crate::field_mask::FieldMask;
use crate::path::AttributePath;
use crate::path_map::PathMap;
use crate::request::ResourceUpdate;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};
use crate::state::{ResourceState, StateReader};

/// `UpdateUserRequest` of the Managed MySQL user service.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateUserRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: String,
    #[prost(string, tag = "2")]
    pub user_name: String,
    #[prost(message, optional, tag = "3")]
    pub update_mask: Option<FieldMask>,
    #[prost(string, tag = "4")]
    pub password: String,
    #[prost(message, repeated, tag = "5")]
    pub permissions: Vec<Permission>,
    #[prost(enumeration = "GlobalPermission", repeated, tag = "6")]
    pub global_permissions: Vec<i32>,
    #[prost(message, optional, tag = "7")]
    pub connection_limits: Option<ConnectionLimits>,
    #[prost(enumeration = "AuthPlugin", tag = "8")]
    pub authentication_plugin: i32,
}

/// Database-level privileges of a user.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Permission {
    #[prost(string, tag = "1")]
    pub database_name: String,
    #[prost(enumeration = "Privilege", repeated, tag = "2")]
    pub roles: Vec<i32>,
}

/// Per-user connection limits. Zero means "no limit".
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConnectionLimits {
    #[prost(int64, tag = "1")]
    pub max_questions_per_hour: i64,
    #[prost(int64, tag = "2")]
    pub max_updates_per_hour: i64,
    #[prost(int64, tag = "3")]
    pub max_connections_per_hour: i64,
    #[prost(int64, tag = "4")]
    pub max_user_connections: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Privilege {
    Unspecified = 0,
    All = 1,
    Alter = 2,
    Create = 4,
    Delete = 6,
    Drop = 7,
    Insert = 8,
    Select = 10,
    Update = 11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum GlobalPermission {
    Unspecified = 0,
    ReplicationClient = 1,
    ReplicationSlave = 2,
    Process = 3,
    FlushOptimizerCosts = 4,
    ShowRoutine = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AuthPlugin {
    Unspecified = 0,
    MysqlNativePassword = 1,
    CachingSha2Password = 2,
    Sha256Password = 3,
}

const PRIVILEGES: &[(&str, i32)] = &[
    ("ALL", Privilege::All as i32),
    ("ALTER", Privilege::Alter as i32),
    ("CREATE", Privilege::Create as i32),
    ("DELETE", Privilege::Delete as i32),
    ("DROP", Privilege::Drop as i32),
    ("INSERT", Privilege::Insert as i32),
    ("SELECT", Privilege::Select as i32),
    ("UPDATE", Privilege::Update as i32),
];

const GLOBAL_PERMISSIONS: &[(&str, i32)] = &[
    ("REPLICATION_CLIENT", GlobalPermission::ReplicationClient as i32),
    ("REPLICATION_SLAVE", GlobalPermission::ReplicationSlave as i32),
    ("PROCESS", GlobalPermission::Process as i32),
    ("FLUSH_OPTIMIZER_COSTS", GlobalPermission::FlushOptimizerCosts as i32),
    ("SHOW_ROUTINE", GlobalPermission::ShowRoutine as i32),
];

const AUTH_PLUGINS: &[(&str, i32)] = &[
    ("MYSQL_NATIVE_PASSWORD", AuthPlugin::MysqlNativePassword as i32),
    ("CACHING_SHA2_PASSWORD", AuthPlugin::CachingSha2Password as i32),
    ("SHA256_PASSWORD", AuthPlugin::Sha256Password as i32),
];

const CONNECTION_LIMITS: [&str; 4] = [
    "max_questions_per_hour",
    "max_updates_per_hour",
    "max_connections_per_hour",
    "max_user_connections",
];

static PATHS: LazyLock<PathMap> = LazyLock::new(|| {
    let limits = AttributePath::root().field("connection_limits").index(0);
    CONNECTION_LIMITS.iter().fold(
        PathMap::from_pairs(&[
            ("password", "password"),
            ("permission", "permissions"),
            ("global_permissions", "global_permissions"),
            ("authentication_plugin", "authentication_plugin"),
        ]),
        |map, limit| map.with_mirrored(limits.clone().field(*limit)),
    )
});

const API_FIELDS: &[&str] = &[
    "password",
    "permissions.database_name",
    "permissions.roles",
    "global_permissions",
    "connection_limits.max_questions_per_hour",
    "connection_limits.max_updates_per_hour",
    "connection_limits.max_connections_per_hour",
    "connection_limits.max_user_connections",
    "authentication_plugin",
];

/// The MySQL user resource.
pub struct MysqlUser;

impl ResourceUpdate for MysqlUser {
    type Request = UpdateUserRequest;
    const RESOURCE_TYPE: &'static str = "yandex_mdb_mysql_user";

    fn path_map() -> &'static PathMap {
        &PATHS
    }

    fn schema() -> Schema {
        let limits = CONNECTION_LIMITS
            .iter()
            .fold(Block::new(), |block, limit| {
                block.with_attribute(
                    *limit,
                    Attribute::new(AttributeType::Int64, AttributeFlags::optional_computed()),
                )
            });

        Schema::v0()
            .with_attribute("cluster_id", Attribute::required_string().with_force_new())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("password", Attribute::required_string().sensitive())
            .with_attribute(
                "global_permissions",
                Attribute::new(
                    AttributeType::set(AttributeType::String),
                    AttributeFlags::optional_computed(),
                ),
            )
            .with_attribute(
                "authentication_plugin",
                Attribute::new(AttributeType::String, AttributeFlags::optional_computed()),
            )
            .with_block(
                "permission",
                NestedBlock::set(
                    Block::new()
                        .with_attribute("database_name", Attribute::required_string())
                        .with_attribute("roles", Attribute::optional_string_list()),
                ),
            )
            .with_block("connection_limits", NestedBlock::list(limits).with_max_items(1))
    }

    fn api_fields() -> &'static [&'static str] {
        API_FIELDS
    }

    fn build_request<S>(state: &S, field_mask: FieldMask) -> Result<Self::Request, UpdateError>
    where
        S: ResourceState + ?Sized,
    {
        let permission = AttributePath::parse("permission");
        let permissions = (0..state.get_len(&permission)?)
            .map(|i| -> Result<Permission, UpdateError> {
                let item = permission.clone().index(i);
                Ok(Permission {
                    database_name: state.get_string(&item.clone().field("database_name"))?,
                    roles: state.get_enum_list(&item.field("roles"), PRIVILEGES)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let limits_path = AttributePath::root().field("connection_limits").index(0);
        let connection_limits = if state.is_set(&limits_path) {
            let limit = |name: &str| state.get_i64(&limits_path.clone().field(name));
            Some(ConnectionLimits {
                max_questions_per_hour: limit("max_questions_per_hour")?,
                max_updates_per_hour: limit("max_updates_per_hour")?,
                max_connections_per_hour: limit("max_connections_per_hour")?,
                max_user_connections: limit("max_user_connections")?,
            })
        } else {
            None
        };

        Ok(UpdateUserRequest {
            cluster_id: state.get_string(&AttributePath::parse("cluster_id"))?,
            user_name: state.get_string(&AttributePath::parse("name"))?,
            update_mask: Some(field_mask),
            password: state.get_string(&AttributePath::parse("password"))?,
            permissions,
            global_permissions: state
                .get_enum_list(&AttributePath::parse("global_permissions"), GLOBAL_PERMISSIONS)?,
            connection_limits,
            authentication_plugin: state
                .get_enum(&AttributePath::parse("authentication_plugin"), AUTH_PLUGINS)?,
        })
    }
}
