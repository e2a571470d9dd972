//! `yandex_datatransfer_endpoint`.
//!
//! Endpoint settings are deeply nested singleton blocks. Most leaves map to
//! their own mask path, but the API replaces an on-premise connection as a
//! whole, so its `hosts`, `port` and `subnet_id` leaves share the parent
//! `...connection.on_premise` path.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::UpdateError;
use crate::field_mask::FieldMask;
use crate::path::AttributePath;
use crate::path_map::PathMap;
use crate::request::ResourceUpdate;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};
use crate::state::{ResourceState, StateReader};

/// `UpdateEndpointRequest` of the Data Transfer endpoint service.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateEndpointRequest {
    #[prost(string, tag = "1")]
    pub endpoint_id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(map = "string, string", tag = "4")]
    pub labels: HashMap<String, String>,
    #[prost(message, optional, tag = "5")]
    pub settings: Option<EndpointSettings>,
    #[prost(message, optional, tag = "6")]
    pub update_mask: Option<FieldMask>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EndpointSettings {
    #[prost(oneof = "endpoint_settings::Settings", tags = "1, 2")]
    pub settings: Option<endpoint_settings::Settings>,
}

pub mod endpoint_settings {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Settings {
        #[prost(message, tag = "1")]
        MysqlSource(super::MysqlSource),
        #[prost(message, tag = "2")]
        PostgresTarget(super::PostgresTarget),
    }
}

/// Where the database lives: a managed cluster or user-run hosts.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Connection {
    #[prost(oneof = "connection::Connection", tags = "1, 2")]
    pub connection: Option<connection::Connection>,
}

pub mod connection {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Connection {
        #[prost(string, tag = "1")]
        MdbClusterId(String),
        #[prost(message, tag = "2")]
        OnPremise(super::OnPremise),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnPremise {
    #[prost(string, repeated, tag = "1")]
    pub hosts: Vec<String>,
    #[prost(int64, tag = "2")]
    pub port: i64,
    #[prost(string, tag = "3")]
    pub subnet_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Secret {
    #[prost(oneof = "secret::Value", tags = "1")]
    pub value: Option<secret::Value>,
}

pub mod secret {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(string, tag = "1")]
        Raw(String),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MysqlSource {
    #[prost(message, optional, tag = "1")]
    pub connection: Option<Connection>,
    #[prost(string, tag = "2")]
    pub database: String,
    #[prost(string, tag = "3")]
    pub user: String,
    #[prost(message, optional, tag = "4")]
    pub password: Option<Secret>,
    #[prost(string, repeated, tag = "5")]
    pub include_tables_regex: Vec<String>,
    #[prost(string, repeated, tag = "6")]
    pub exclude_tables_regex: Vec<String>,
    #[prost(string, tag = "7")]
    pub timezone: String,
    #[prost(string, repeated, tag = "8")]
    pub security_groups: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PostgresTarget {
    #[prost(message, optional, tag = "1")]
    pub connection: Option<Connection>,
    #[prost(string, tag = "2")]
    pub database: String,
    #[prost(string, tag = "3")]
    pub user: String,
    #[prost(message, optional, tag = "4")]
    pub password: Option<Secret>,
    #[prost(string, repeated, tag = "5")]
    pub security_groups: Vec<String>,
    #[prost(enumeration = "CleanupPolicy", tag = "6")]
    pub cleanup_policy: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum CleanupPolicy {
    Unspecified = 0,
    Disabled = 1,
    Drop = 2,
    Truncate = 3,
}

const CLEANUP_POLICIES: &[(&str, i32)] = &[
    ("DISABLED", CleanupPolicy::Disabled as i32),
    ("DROP", CleanupPolicy::Drop as i32),
    ("TRUNCATE", CleanupPolicy::Truncate as i32),
];

static PATHS: LazyLock<PathMap> = LazyLock::new(|| {
    PathMap::from_pairs(&[
        ("name", "name"),
        ("description", "description"),
        ("labels", "labels"),
        (
            "settings.0.mysql_source.0.connection.0.mdb_cluster_id",
            "settings.mysql_source.connection.mdb_cluster_id",
        ),
        (
            "settings.0.mysql_source.0.connection.0.on_premise.0.hosts",
            "settings.mysql_source.connection.on_premise",
        ),
        (
            "settings.0.mysql_source.0.connection.0.on_premise.0.port",
            "settings.mysql_source.connection.on_premise",
        ),
        (
            "settings.0.mysql_source.0.connection.0.on_premise.0.subnet_id",
            "settings.mysql_source.connection.on_premise",
        ),
        ("settings.0.mysql_source.0.database", "settings.mysql_source.database"),
        ("settings.0.mysql_source.0.user", "settings.mysql_source.user"),
        ("settings.0.mysql_source.0.password.0.raw", "settings.mysql_source.password.raw"),
        (
            "settings.0.mysql_source.0.include_tables_regex",
            "settings.mysql_source.include_tables_regex",
        ),
        (
            "settings.0.mysql_source.0.exclude_tables_regex",
            "settings.mysql_source.exclude_tables_regex",
        ),
        ("settings.0.mysql_source.0.timezone", "settings.mysql_source.timezone"),
        (
            "settings.0.mysql_source.0.security_groups",
            "settings.mysql_source.security_groups",
        ),
        (
            "settings.0.postgres_target.0.connection.0.mdb_cluster_id",
            "settings.postgres_target.connection.mdb_cluster_id",
        ),
        (
            "settings.0.postgres_target.0.connection.0.on_premise.0.hosts",
            "settings.postgres_target.connection.on_premise",
        ),
        (
            "settings.0.postgres_target.0.connection.0.on_premise.0.port",
            "settings.postgres_target.connection.on_premise",
        ),
        (
            "settings.0.postgres_target.0.connection.0.on_premise.0.subnet_id",
            "settings.postgres_target.connection.on_premise",
        ),
        ("settings.0.postgres_target.0.database", "settings.postgres_target.database"),
        ("settings.0.postgres_target.0.user", "settings.postgres_target.user"),
        (
            "settings.0.postgres_target.0.password.0.raw",
            "settings.postgres_target.password.raw",
        ),
        (
            "settings.0.postgres_target.0.security_groups",
            "settings.postgres_target.security_groups",
        ),
        (
            "settings.0.postgres_target.0.cleanup_policy",
            "settings.postgres_target.cleanup_policy",
        ),
    ])
});

const API_FIELDS: &[&str] = &[
    "name",
    "description",
    "labels",
    "settings.mysql_source.connection.mdb_cluster_id",
    "settings.mysql_source.connection.on_premise.hosts",
    "settings.mysql_source.connection.on_premise.port",
    "settings.mysql_source.connection.on_premise.subnet_id",
    "settings.mysql_source.database",
    "settings.mysql_source.user",
    "settings.mysql_source.password.raw",
    "settings.mysql_source.include_tables_regex",
    "settings.mysql_source.exclude_tables_regex",
    "settings.mysql_source.timezone",
    "settings.mysql_source.security_groups",
    "settings.postgres_target.connection.mdb_cluster_id",
    "settings.postgres_target.connection.on_premise.hosts",
    "settings.postgres_target.connection.on_premise.port",
    "settings.postgres_target.connection.on_premise.subnet_id",
    "settings.postgres_target.database",
    "settings.postgres_target.user",
    "settings.postgres_target.password.raw",
    "settings.postgres_target.security_groups",
    "settings.postgres_target.cleanup_policy",
];

/// The transfer endpoint resource.
pub struct TransferEndpoint;

fn singleton(block: Block) -> NestedBlock {
    NestedBlock::list(block).with_max_items(1)
}

fn connection_block() -> NestedBlock {
    singleton(
        Block::new()
            .with_attribute("mdb_cluster_id", Attribute::optional_string())
            .with_block(
                "on_premise",
                singleton(
                    Block::new()
                        .with_attribute("hosts", Attribute::optional_string_list())
                        .with_attribute("port", Attribute::optional_int64())
                        .with_attribute("subnet_id", Attribute::optional_string()),
                ),
            ),
    )
}

fn password_block() -> NestedBlock {
    singleton(Block::new().with_attribute("raw", Attribute::optional_string().sensitive()))
}

impl ResourceUpdate for TransferEndpoint {
    type Request = UpdateEndpointRequest;
    const RESOURCE_TYPE: &'static str = "yandex_datatransfer_endpoint";

    fn path_map() -> &'static PathMap {
        &PATHS
    }

    fn schema() -> Schema {
        let mysql_source = Block::new()
            .with_block("connection", connection_block())
            .with_attribute("database", Attribute::optional_string())
            .with_attribute("user", Attribute::optional_string())
            .with_block("password", password_block())
            .with_attribute("include_tables_regex", Attribute::optional_string_list())
            .with_attribute("exclude_tables_regex", Attribute::optional_string_list())
            .with_attribute("timezone", Attribute::optional_string())
            .with_attribute("security_groups", Attribute::optional_string_list());

        let postgres_target = Block::new()
            .with_block("connection", connection_block())
            .with_attribute("database", Attribute::optional_string())
            .with_attribute("user", Attribute::optional_string())
            .with_block("password", password_block())
            .with_attribute("security_groups", Attribute::optional_string_list())
            .with_attribute(
                "cleanup_policy",
                Attribute::new(AttributeType::String, AttributeFlags::optional_computed()),
            );

        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "folder_id",
                Attribute::new(AttributeType::String, AttributeFlags::optional_computed())
                    .with_force_new(),
            )
            .with_attribute("name", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("labels", Attribute::optional_string_map())
            .with_block(
                "settings",
                singleton(
                    Block::new()
                        .with_block("mysql_source", singleton(mysql_source))
                        .with_block("postgres_target", singleton(postgres_target)),
                ),
            )
    }

    fn api_fields() -> &'static [&'static str] {
        API_FIELDS
    }

    fn build_request<S>(state: &S, field_mask: FieldMask) -> Result<Self::Request, UpdateError>
    where
        S: ResourceState + ?Sized,
    {
        let settings = AttributePath::root().field("settings").index(0);
        let mysql_source = settings.clone().field("mysql_source").index(0);
        let postgres_target = settings.field("postgres_target").index(0);

        let settings = if state.is_set(&mysql_source) {
            Some(endpoint_settings::Settings::MysqlSource(read_mysql_source(
                state,
                &mysql_source,
            )?))
        } else if state.is_set(&postgres_target) {
            Some(endpoint_settings::Settings::PostgresTarget(
                read_postgres_target(state, &postgres_target)?,
            ))
        } else {
            None
        };

        Ok(UpdateEndpointRequest {
            endpoint_id: state.get_string(&AttributePath::parse("id"))?,
            name: state.get_string(&AttributePath::parse("name"))?,
            description: state.get_string(&AttributePath::parse("description"))?,
            labels: state.get_string_map(&AttributePath::parse("labels"))?,
            settings: settings.map(|settings| EndpointSettings {
                settings: Some(settings),
            }),
            update_mask: Some(field_mask),
        })
    }
}

fn read_mysql_source<S>(state: &S, base: &AttributePath) -> Result<MysqlSource, UpdateError>
where
    S: ResourceState + ?Sized,
{
    let at = |name: &str| base.clone().field(name);
    Ok(MysqlSource {
        connection: read_connection(state, &at("connection").index(0))?,
        database: state.get_string(&at("database"))?,
        user: state.get_string(&at("user"))?,
        password: read_secret(state, &at("password").index(0))?,
        include_tables_regex: state.get_string_list(&at("include_tables_regex"))?,
        exclude_tables_regex: state.get_string_list(&at("exclude_tables_regex"))?,
        timezone: state.get_string(&at("timezone"))?,
        security_groups: state.get_string_list(&at("security_groups"))?,
    })
}

fn read_postgres_target<S>(state: &S, base: &AttributePath) -> Result<PostgresTarget, UpdateError>
where
    S: ResourceState + ?Sized,
{
    let at = |name: &str| base.clone().field(name);
    Ok(PostgresTarget {
        connection: read_connection(state, &at("connection").index(0))?,
        database: state.get_string(&at("database"))?,
        user: state.get_string(&at("user"))?,
        password: read_secret(state, &at("password").index(0))?,
        security_groups: state.get_string_list(&at("security_groups"))?,
        cleanup_policy: state.get_enum(&at("cleanup_policy"), CLEANUP_POLICIES)?,
    })
}

fn read_connection<S>(state: &S, base: &AttributePath) -> Result<Option<Connection>, UpdateError>
where
    S: ResourceState + ?Sized,
{
    let cluster_id = state.get_string(&base.clone().field("mdb_cluster_id"))?;
    let on_premise = base.clone().field("on_premise").index(0);

    let connection = if !cluster_id.is_empty() {
        Some(connection::Connection::MdbClusterId(cluster_id))
    } else if state.is_set(&on_premise) {
        Some(connection::Connection::OnPremise(OnPremise {
            hosts: state.get_string_list(&on_premise.clone().field("hosts"))?,
            port: state.get_i64(&on_premise.clone().field("port"))?,
            subnet_id: state.get_string(&on_premise.field("subnet_id"))?,
        }))
    } else {
        None
    };
    Ok(connection.map(|connection| Connection {
        connection: Some(connection),
    }))
}

fn read_secret<S>(state: &S, base: &AttributePath) -> Result<Option<Secret>, UpdateError>
where
    S: ResourceState + ?Sized,
{
    if !state.is_set(base) {
        return Ok(None);
    }
    let raw = state.get_string(&base.clone().field("raw"))?;
    Ok(Some(Secret {
        value: Some(secret::Value::Raw(raw)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::assemble_update;
    use crate::state::JsonResourceState;
    use crate::testing::{
        assert_applied, assert_mask_eq, assert_no_errors, assert_skipped, UpdateTester,
    };
    use serde_json::{json, Value};

    fn mysql_endpoint() -> Value {
        json!({
            "id": "dte1",
            "name": "orders-source",
            "description": "",
            "settings": [{
                "mysql_source": [{
                    "connection": [{
                        "on_premise": [{
                            "hosts": ["db1.internal"],
                            "port": 3306,
                            "subnet_id": "e9b1"
                        }]
                    }],
                    "database": "orders",
                    "user": "replicator",
                    "password": [{"raw": "p1"}],
                    "include_tables_regex": ["^orders_.*"]
                }]
            }]
        })
    }

    fn postgres_endpoint() -> Value {
        // Singleton blocks may also arrive as bare objects.
        json!({
            "id": "dte2",
            "name": "warehouse",
            "settings": {
                "postgres_target": {
                    "connection": {"mdb_cluster_id": "c9q7"},
                    "database": "dwh",
                    "user": "loader",
                    "password": {"raw": "p1"},
                    "cleanup_policy": "DROP"
                }
            }
        })
    }

    fn on_premise(request: &UpdateEndpointRequest) -> OnPremise {
        let settings = request.settings.clone().unwrap().settings.unwrap();
        let endpoint_settings::Settings::MysqlSource(source) = settings else {
            panic!("expected mysql_source settings");
        };
        match source.connection.unwrap().connection.unwrap() {
            connection::Connection::OnPremise(on_premise) => on_premise,
            other => panic!("expected on-premise connection, got {:?}", other),
        }
    }

    #[test]
    fn test_path_map_matches_schema() {
        assert_no_errors(&TransferEndpoint::validate_path_map());
    }

    #[tokio::test]
    async fn test_on_premise_leaves_collapse_to_one_path() {
        let tester = UpdateTester::<TransferEndpoint>::new();
        let mut planned = mysql_endpoint();
        let host = &mut planned["settings"][0]["mysql_source"][0]["connection"][0]["on_premise"][0];
        host["hosts"] = json!(["db1.internal", "db2.internal"]);
        host["port"] = json!(3307);

        let outcome = tester.update(mysql_endpoint(), planned).await.unwrap();
        assert_mask_eq(
            assert_applied(&outcome),
            &["settings.mysql_source.connection.on_premise"],
        );

        let on_premise = on_premise(&tester.last_request().unwrap());
        assert_eq!(on_premise.hosts, vec!["db1.internal", "db2.internal"]);
        assert_eq!(on_premise.port, 3307);
        assert_eq!(on_premise.subnet_id, "e9b1");
    }

    #[tokio::test]
    async fn test_mask_follows_declaration_order() {
        let tester = UpdateTester::<TransferEndpoint>::new();
        let mut planned = mysql_endpoint();
        planned["settings"][0]["mysql_source"][0]["database"] = json!("orders_v2");
        planned["description"] = json!("orders replica");

        let outcome = tester.update(mysql_endpoint(), planned).await.unwrap();
        assert_mask_eq(
            assert_applied(&outcome),
            &["description", "settings.mysql_source.database"],
        );
        assert_eq!(tester.last_request().unwrap().endpoint_id, "dte1");
    }

    #[tokio::test]
    async fn test_password_on_object_shaped_blocks() {
        let tester = UpdateTester::<TransferEndpoint>::new();
        let mut planned = postgres_endpoint();
        planned["settings"]["postgres_target"]["password"]["raw"] = json!("p2");

        let outcome = tester.update(postgres_endpoint(), planned).await.unwrap();
        assert_mask_eq(
            assert_applied(&outcome),
            &["settings.postgres_target.password.raw"],
        );

        let request = tester.last_request().unwrap();
        let Some(endpoint_settings::Settings::PostgresTarget(target)) =
            request.settings.and_then(|s| s.settings)
        else {
            panic!("expected postgres_target settings");
        };
        assert_eq!(
            target.password.and_then(|p| p.value),
            Some(secret::Value::Raw("p2".to_string()))
        );
        assert_eq!(target.cleanup_policy, CleanupPolicy::Drop as i32);
        assert_eq!(
            target.connection.and_then(|c| c.connection),
            Some(connection::Connection::MdbClusterId("c9q7".to_string()))
        );
    }

    #[tokio::test]
    async fn test_switch_to_managed_cluster() {
        let tester = UpdateTester::<TransferEndpoint>::new();
        let mut planned = mysql_endpoint();
        planned["settings"][0]["mysql_source"][0]["connection"] =
            json!([{"mdb_cluster_id": "c9q1"}]);

        let outcome = tester.update(mysql_endpoint(), planned).await.unwrap();
        assert_mask_eq(
            assert_applied(&outcome),
            &[
                "settings.mysql_source.connection.mdb_cluster_id",
                "settings.mysql_source.connection.on_premise",
            ],
        );
    }

    #[tokio::test]
    async fn test_unchanged_endpoint_is_skipped() {
        let tester = UpdateTester::<TransferEndpoint>::new();
        assert_skipped(
            &tester
                .update(postgres_endpoint(), postgres_endpoint())
                .await
                .unwrap(),
        );
        assert!(tester.requests().is_empty());
    }

    #[test]
    fn test_unknown_cleanup_policy() {
        let mut planned = postgres_endpoint();
        planned["settings"]["postgres_target"]["cleanup_policy"] = json!("ARCHIVE");
        let state = JsonResourceState::new(postgres_endpoint(), planned);

        let err = assemble_update::<TransferEndpoint, _>(&state).unwrap_err();
        assert!(matches!(err, UpdateError::Validation(_)));
        assert!(err
            .message()
            .contains("settings.0.postgres_target.0.cleanup_policy"));
    }
}
