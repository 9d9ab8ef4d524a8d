use claims::{assert_err, assert_none, assert_ok};
use diesel::prelude::*;
use diesel::sql_types::Text;
use insta::assert_debug_snapshot;
use webstats_database::{Entry, EntrySink, SqliteSink, create_schema};
use webstats_logs::test_utils::Unclassified;
use webstats_logs::{UserAgentCache, parse_entry};

const LINE: &str = r#""example.com" "203.0.113.7" "DE" "2024-01-16T10:15:02+00:00" "200" "GET" "/blog/hello%20world" "5120" "0.012" "https://www.google.com/search?q=rust" "curl/8.5.0""#;
const NO_REFERRER_LINE: &str = r#""example.com" "192.0.2.44" "FR" "2024-01-16T10:16:31+00:00" "404" "GET" "/wp-login.php" "548" "0.003" "-" "curl/8.5.0""#;

#[derive(QueryableByName)]
struct Column {
    #[diesel(sql_type = Text)]
    name: String,
}

fn columns(conn: &mut SqliteConnection) -> Vec<String> {
    diesel::sql_query("SELECT name FROM pragma_table_info('entries')")
        .load::<Column>(conn)
        .unwrap()
        .into_iter()
        .map(|column| column.name)
        .collect()
}

fn insert_lines(sink: &mut SqliteSink, lines: &[&str]) {
    let mut user_agents = UserAgentCache::new(Unclassified);
    for line in lines {
        let entry = assert_ok!(parse_entry(line, &mut user_agents));
        assert_ok!(sink.insert(&entry));
    }
}

#[test]
fn test_create_schema_twice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("webstats.db");

    drop(assert_ok!(SqliteSink::open(&path)));
    let mut sink = assert_ok!(SqliteSink::open(&path));
    assert_ok!(create_schema(sink.connection()));

    assert_debug_snapshot!(columns(sink.connection()), @r#"
    [
        "host",
        "remote_addr",
        "country_code",
        "time",
        "method",
        "path",
        "status_code",
        "size",
        "response_time",
        "referrer_url",
        "referrer_domain",
        "ua_string",
        "ua_client_family",
        "ua_client_version",
        "ua_os_family",
        "ua_os_version",
        "ua_device_family",
        "ua_device_brand",
        "ua_device_model",
    ]
    "#);
}

#[test]
fn test_insert_and_commit() {
    let mut sink = assert_ok!(SqliteSink::in_memory());

    assert_ok!(sink.begin());
    insert_lines(&mut sink, &[LINE, NO_REFERRER_LINE]);
    assert_ok!(sink.commit());

    let entries = assert_ok!(Entry::all(sink.connection()));
    assert_eq!(entries.len(), 2);

    let entry = &entries[0];
    assert_eq!(entry.path, "/blog/hello world");
    assert_eq!(entry.status_code, 200);
    assert_eq!(entry.size, 5120);
    assert_eq!(entry.response_time, 0.012);
    assert_eq!(
        entry.referrer_url.as_deref(),
        Some("https://www.google.com/search?q=rust")
    );
    assert_eq!(entry.referrer_domain, "www.google.com");
    assert_eq!(entry.ua_string, "curl/8.5.0");
    assert_eq!(entry.ua_client_family, "Other");
    assert_none!(entry.ua_client_version);

    let entry = &entries[1];
    assert_none!(&entry.referrer_url);
    assert_eq!(entry.referrer_domain, "");
}

#[test]
fn test_uncommitted_entries_are_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("webstats.db");

    {
        let mut sink = assert_ok!(SqliteSink::open(&path));
        assert_ok!(sink.begin());
        insert_lines(&mut sink, &[LINE]);
    }

    let mut sink = assert_ok!(SqliteSink::open(&path));
    assert_eq!(assert_ok!(Entry::count(sink.connection())), 0);

    assert_ok!(sink.begin());
    insert_lines(&mut sink, &[LINE]);
    assert_ok!(sink.commit());
    drop(sink);

    let mut sink = assert_ok!(SqliteSink::open(&path));
    assert_eq!(assert_ok!(Entry::count(sink.connection())), 1);
}

#[test]
fn test_read_empty_versions() {
    let mut sink = assert_ok!(SqliteSink::in_memory());

    // Unknown versions and missing referrers stored as empty strings
    diesel::sql_query(
        "INSERT INTO entries VALUES ('example.com', '192.0.2.44', 'FR', \
        '2024-01-16T10:16:31+00:00', 'GET', '/wp-login.php', '404', '548', '0.003', \
        '', '', 'curl/8.5.0', 'curl', '8', 'Other', '', 'Other', '', '')",
    )
    .execute(sink.connection())
    .unwrap();

    let entries = assert_ok!(Entry::all(sink.connection()));
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry.status_code, 404);
    assert_eq!(entry.size, 548);
    assert_eq!(entry.ua_client_family, "curl");
    assert_eq!(entry.ua_client_version, Some(8));
    assert_none!(entry.ua_os_version);
    assert_eq!(entry.referrer_url.as_deref(), Some(""));
}

#[test]
fn test_commit_without_transaction_fails() {
    let mut sink = assert_ok!(SqliteSink::in_memory());
    assert_err!(sink.commit());
}
