use crate::schema::entries;
use diesel::dsl::sql;
use diesel::expression::SqlLiteral;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Nullable};
use webstats_logs::LogEntry;

/// A row of the `entries` table, as read back from the database.
///
/// Older databases may contain `''` instead of `NULL` for unknown user agent
/// versions. Those are read as `None`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = entries, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Entry {
    pub host: String,
    pub remote_addr: String,
    pub country_code: String,
    pub time: String,
    pub method: String,
    pub path: String,
    pub status_code: i32,
    pub size: i64,
    pub response_time: f64,
    pub referrer_url: Option<String>,
    pub referrer_domain: String,
    pub ua_string: String,
    pub ua_client_family: String,
    #[diesel(select_expression = sql::<Nullable<Integer>>("NULLIF(ua_client_version, '')"))]
    #[diesel(select_expression_type = SqlLiteral<Nullable<Integer>>)]
    pub ua_client_version: Option<i32>,
    pub ua_os_family: String,
    #[diesel(select_expression = sql::<Nullable<Integer>>("NULLIF(ua_os_version, '')"))]
    #[diesel(select_expression_type = SqlLiteral<Nullable<Integer>>)]
    pub ua_os_version: Option<i32>,
    pub ua_device_family: String,
    pub ua_device_brand: String,
    pub ua_device_model: String,
}

impl Entry {
    /// Loads all rows in insertion order.
    pub fn all(conn: &mut SqliteConnection) -> QueryResult<Vec<Entry>> {
        entries::table
            .order(entries::rowid.asc())
            .select(Entry::as_select())
            .load(conn)
    }

    pub fn count(conn: &mut SqliteConnection) -> QueryResult<i64> {
        entries::table.count().get_result(conn)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = entries, check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewEntry<'a> {
    pub host: &'a str,
    pub remote_addr: &'a str,
    pub country_code: &'a str,
    pub time: &'a str,
    pub method: &'a str,
    pub path: &'a str,
    pub status_code: i32,
    pub size: i64,
    pub response_time: f64,
    pub referrer_url: Option<&'a str>,
    pub referrer_domain: &'a str,
    pub ua_string: &'a str,
    pub ua_client_family: &'a str,
    pub ua_client_version: Option<i32>,
    pub ua_os_family: &'a str,
    pub ua_os_version: Option<i32>,
    pub ua_device_family: &'a str,
    pub ua_device_brand: &'a str,
    pub ua_device_model: &'a str,
}

impl<'a> From<&'a LogEntry<'_>> for NewEntry<'a> {
    fn from(entry: &'a LogEntry<'_>) -> Self {
        let user_agent = entry.user_agent;

        Self {
            host: entry.host,
            remote_addr: entry.remote_addr,
            country_code: entry.country_code,
            time: entry.time,
            method: entry.method,
            path: &entry.path,
            status_code: entry.status_code,
            size: entry.size,
            response_time: entry.response_time,
            referrer_url: entry.referrer_url,
            referrer_domain: &entry.referrer_domain,
            ua_string: entry.ua_string,
            ua_client_family: &user_agent.client_family,
            ua_client_version: user_agent.client_version,
            ua_os_family: &user_agent.os_family,
            ua_os_version: user_agent.os_version,
            ua_device_family: &user_agent.device_family,
            ua_device_brand: &user_agent.device_brand,
            ua_device_model: &user_agent.device_model,
        }
    }
}

impl NewEntry<'_> {
    pub fn insert(&self, conn: &mut SqliteConnection) -> QueryResult<usize> {
        diesel::insert_into(entries::table)
            .values(self)
            .execute(conn)
    }
}
