use case_trends::data::{run_pipeline, LoaderError, PipelineError, ReshapeError};
use case_trends::metrics::THRESHOLD;
use case_trends::SourceSchema;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const GLOBAL_CSV: &str = "\
Province/State,Country/Region,Lat,Long,3/1/20,3/2/20,3/3/20,3/4/20,3/5/20,3/6/20,3/7/20,3/8/20,3/9/20,3/10/20
,Italy,41.9,12.6,10,12,15,20,28,40,55,75,100,130
North,Chad,15.4,18.7,1,2,3,4,5,6,7,8,9,10
South,Chad,15.4,18.7,5,5,5,5,5,5,5,5,5,5
,France,46.2,2.2,10,15,15,15,15,15,15,15,15,15
,Tuvalu,-7.1,177.6,0,0,0,0,0,1,1,2,2,3
";

const REGIONAL_CSV: &str = "\
UID,iso2,iso3,code3,FIPS,Admin2,Province_State,Country_Region,Lat,Long_,Combined_Key,Population,3/1/20,3/2/20,3/3/20
1,GB,GBR,826,,,England,United Kingdom,52.36,-1.17,\"England, United Kingdom\",56000000,8,12,20
2,GB,GBR,826,,,Wales,United Kingdom,52.13,-3.78,\"Wales, United Kingdom\",3100000,10,11,11
";

fn write_source(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
}

#[test]
fn global_source_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "global.csv", GLOBAL_CSV);
    let dataset = run_pipeline(&path, &SourceSchema::GLOBAL).unwrap();

    assert_eq!(dataset.group(), "Country/Region");
    assert_eq!(dataset.entities(), ["Chad", "France", "Italy", "Tuvalu"]);
    assert_eq!(
        dataset.wide.values_for("Chad"),
        Some(&[6, 7, 8, 9, 10, 11, 12, 13, 14, 15][..])
    );
    assert_eq!(dataset.enriched.entities(), ["Chad", "France", "Italy"]);

    let enriched = dataset.enriched.rows();
    assert!(enriched.iter().all(|row| row.value >= THRESHOLD));
    for entity in dataset.enriched.entities() {
        let rows: Vec<_> = dataset.enriched.rows_for(entity).collect();
        assert_eq!(rows[0].days, 0);
        assert_eq!(rows[0].daily_change, 0);
        assert_eq!(rows[0].daily_pct_change, 0.0);
        assert!(rows.windows(2).all(|w| w[0].date < w[1].date));
    }
}

#[test]
fn threshold_resets_the_day_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "global.csv", GLOBAL_CSV);
    let dataset = run_pipeline(&path, &SourceSchema::GLOBAL).unwrap();

    let chad: Vec<_> = dataset.enriched.rows_for("Chad").collect();
    assert_eq!(chad.len(), 6);
    assert_eq!(chad[0].date, day(5));
    assert_eq!(chad[0].value, 10);
    assert_eq!(chad.last().map(|row| row.days), Some(5));
}

#[test]
fn worked_example_rolling_average() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "global.csv", GLOBAL_CSV);
    let dataset = run_pipeline(&path, &SourceSchema::GLOBAL).unwrap();

    let italy: Vec<_> = dataset.enriched.rows_for("Italy").collect();
    assert_eq!(italy.len(), 10);
    // Six defined changes at index 6: the average falls back to the change.
    assert_eq!(italy[6].daily_change, 15);
    assert_eq!(italy[6].daily_roll_avg, 15.0);
    assert_eq!(italy[7].daily_roll_avg, 9.0);

    let france: Vec<_> = dataset.enriched.rows_for("France").collect();
    assert_eq!(france[1].daily_pct_change, 50.0);
    assert_eq!(france[2].daily_pct_change, 0.0);
}

#[test]
fn regional_source_groups_by_province() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "uk.csv", REGIONAL_CSV);
    let dataset = run_pipeline(&path, &SourceSchema::REGIONAL).unwrap();

    assert_eq!(dataset.group(), "Province_State");
    assert_eq!(dataset.entities(), ["England", "Wales"]);
    let england: Vec<_> = dataset.enriched.rows_for("England").collect();
    assert_eq!(england.len(), 2);
    assert_eq!(england[0].date, day(2));
    assert_eq!(england[1].daily_change, 8);
}

#[test]
fn missing_source_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_pipeline(&dir.path().join("nope.csv"), &SourceSchema::GLOBAL).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Loader(LoaderError::SourceUnavailable { .. })
    ));
}

#[test]
fn wrong_schema_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "uk.csv", REGIONAL_CSV);
    let err = run_pipeline(&path, &SourceSchema::GLOBAL).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Loader(LoaderError::Schema { .. })
    ));
}

#[test]
fn unexpected_column_fails_date_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "global.csv",
        "Province/State,Country/Region,Lat,Long,Population,3/1/20\n,Chad,15.4,18.7,16000000,12\n",
    );
    let err = run_pipeline(&path, &SourceSchema::GLOBAL).unwrap_err();
    match err {
        PipelineError::Reshape(ReshapeError::DateParse { label }) => {
            assert_eq!(label, "Population")
        }
        other => panic!("unexpected error: {other}"),
    }
}
