// This file mirrors the `CREATE TABLE` statement in `crate::CREATE_SCHEMA`.
//
// `entries` has no declared primary key, so SQLite's implicit `rowid` is used.

diesel::table! {
    entries (rowid) {
        rowid -> BigInt,
        host -> Text,
        remote_addr -> Text,
        country_code -> Text,
        time -> Text,
        method -> Text,
        path -> Text,
        status_code -> Integer,
        size -> BigInt,
        response_time -> Double,
        referrer_url -> Nullable<Text>,
        referrer_domain -> Text,
        ua_string -> Text,
        ua_client_family -> Text,
        ua_client_version -> Nullable<Integer>,
        ua_os_family -> Text,
        ua_os_version -> Nullable<Integer>,
        ua_device_family -> Text,
        ua_device_brand -> Text,
        ua_device_model -> Text,
    }
}
