//! End-to-end pipeline tests: CSV in, mocked vendors, CSV out. Covers the
//! CRM website backfill, column ordering, raw JSON columns and renames.

use company_enrich::config::Config;
use company_enrich::enrichment::{enrich_row, NO_CANDIDATES_REASON};
use company_enrich::services::{ApolloClient, ZoomInfoClient};
use company_enrich::table::{self, InputTable};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use wiremock::matchers::{any, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(zi_url: &str, ap_url: &str) -> Config {
    let mut config = Config::default();
    config.zoominfo.base_url = zi_url.to_string();
    config.zoominfo.api_key = Some("zi-test-key".to_string());
    config.apollo.base_url = ap_url.to_string();
    config.apollo.api_key = Some("ap-test-key".to_string());
    config.retries.max_attempts = 2;
    config.retries.base_delay_seconds = 0.0;
    config
}

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

async fn run_rows(config: &Config, input: &InputTable) -> Vec<company_enrich::models::OutputRow> {
    let zoominfo = ZoomInfoClient::new(config).unwrap();
    let apollo = ApolloClient::new(config).unwrap();

    let mut out_rows = Vec::new();
    for row in input.rows() {
        out_rows.push(enrich_row(&row, &config.mapping, &config.output, &zoominfo, &apollo).await);
    }
    out_rows
}

#[tokio::test]
async fn enriches_a_csv_end_to_end() {
    let zi_server = MockServer::start().await;
    let ap_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lookup/company"))
        .and(query_param("domain", "acme.com"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Acme Inc"})),
        )
        .mount(&zi_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lookup/company"))
        .and(query_param("domain", "globex.com"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&zi_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search/company"))
        .and(body_json(json!({"companyName": "Globex"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 2}]})))
        .mount(&zi_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search/company"))
        .and(body_json(json!({"companyName": "Initech"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&zi_server)
        .await;

    // the salesforce and enrich tiers miss for every row; only the Acme name
    // search hits
    Mock::given(method("POST"))
        .and(path("/companies/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"companies": []})))
        .mount(&ap_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/companies/enrich"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&ap_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mixed_companies/search"))
        .and(body_json(json!({
            "q_organization_name": "Acme",
            "page": 1,
            "per_page": 1,
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"organizations": [{"id": "a1"}]})),
        )
        .mount(&ap_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mixed_companies/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organizations": []})))
        .mount(&ap_server)
        .await;

    let mut config = test_config(&zi_server.uri(), &ap_server.uri());
    config.mapping.bind("name", Some("Company".to_string()));
    config.mapping.bind("website", Some("Website".to_string()));
    config.mapping.bind("salesforce_id", Some("Account".to_string()));
    config.crm_backfill.id_column = Some("Id".to_string());
    config.crm_backfill.domain_column = Some("Domain".to_string());

    let dir = tempfile::tempdir().unwrap();
    let input_path = write_file(
        &dir,
        "input.csv",
        "Company,Website,Account\nAcme,acme.com,001\nGlobex,,002\nInitech,,\n",
    );
    let crm_path = write_file(&dir, "accounts.csv", "Id,Domain\n002,globex.com\n");
    let output_path = dir.path().join("enriched.csv");

    let mut input = InputTable::read(&input_path).unwrap();
    let crm = table::load_crm_domains(&crm_path, &config.crm_backfill).unwrap();
    assert_eq!(input.backfill_websites(&config.mapping, &crm), 1);

    let out_rows = run_rows(&config, &input).await;

    let columns = table::output_columns(input.headers(), true, &out_rows);
    table::write_output(&output_path, &columns, &HashMap::new(), &out_rows).unwrap();

    let written = std::fs::read_to_string(&output_path).unwrap();
    let expected = "\
Company,Website,Account,ap_error,ap_id,ap_match,zi_error,zi_id,zi_match,zi_name
Acme,acme.com,001,,a1,true,,1,true,Acme Inc
Globex,globex.com,002,not found,,false,,2,true,
Initech,,,not found,,false,not found,,false,
";
    assert_eq!(written, expected);
}

#[tokio::test]
async fn json_columns_and_renames_flow_through() {
    let zi_server = MockServer::start().await;
    let ap_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lookup/company"))
        .and(query_param("domain", "acme.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .mount(&zi_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/companies/enrich"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&ap_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mixed_companies/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organizations": []})))
        .mount(&ap_server)
        .await;

    let mut config = test_config(&zi_server.uri(), &ap_server.uri());
    config.mapping.bind("name", Some("Company".to_string()));
    config.mapping.bind("website", Some("Website".to_string()));
    config.output.add_vendor_json_columns = true;

    let dir = tempfile::tempdir().unwrap();
    let input_path = write_file(&dir, "input.csv", "Company,Website\nAcme,acme.com\n");
    let rename_path = write_file(
        &dir,
        "rename.json",
        r#"{"zi_json": "ZoomInfo Raw", "zi_id": "", "missing_col": "X"}"#,
    );
    let output_path = dir.path().join("enriched.csv");

    let input = InputTable::read(&input_path).unwrap();
    let out_rows = run_rows(&config, &input).await;

    let rename = table::load_rename_map(&rename_path).unwrap();
    let columns = table::output_columns(input.headers(), true, &out_rows);
    table::write_output(&output_path, &columns, &rename, &out_rows).unwrap();

    let mut reader = csv::Reader::from_path(&output_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        headers,
        [
            "Company",
            "Website",
            "ap_error",
            "ap_json",
            "ap_match",
            "zi_error",
            "zi_id",
            "ZoomInfo Raw",
            "zi_match",
        ]
    );

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    let row = &records[0];
    assert_eq!(&row[0], "Acme");
    // vendor miss leaves the json column empty
    assert_eq!(&row[2], "not found");
    assert_eq!(&row[3], "");
    assert_eq!(&row[4], "false");
    assert_eq!(&row[6], "1");
    assert_eq!(&row[7], r#"{"id":1}"#);
    assert_eq!(&row[8], "true");
}

#[tokio::test]
async fn rows_without_mapped_cells_never_touch_the_network() {
    let zi_server = MockServer::start().await;
    let ap_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&zi_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ap_server)
        .await;

    let mut config = test_config(&zi_server.uri(), &ap_server.uri());
    // bound to a column that does not exist in the input
    config.mapping.bind("website", Some("Website URL".to_string()));

    let dir = tempfile::tempdir().unwrap();
    let input_path = write_file(&dir, "input.csv", "Company\nAcme\n");
    let output_path = dir.path().join("enriched.csv");

    let input = InputTable::read(&input_path).unwrap();
    let out_rows = run_rows(&config, &input).await;

    let columns = table::output_columns(input.headers(), true, &out_rows);
    table::write_output(&output_path, &columns, &HashMap::new(), &out_rows).unwrap();

    let written = std::fs::read_to_string(&output_path).unwrap();
    let expected = format!(
        "Company,ap_error,ap_match,zi_error,zi_match\nAcme,{0},false,{0},false\n",
        NO_CANDIDATES_REASON
    );
    assert_eq!(written, expected);
}
