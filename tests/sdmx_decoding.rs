use std::collections::BTreeMap;

use fedstat_rs::Error;
use fedstat_rs::models::DataRecord;
use fedstat_rs::sdmx::{parse_code_lists, parse_data_set, parse_document};

// The portal declares windows-1251 but actually sends UTF-8; by the time
// the decoder sees the text the client has already forced UTF-8.
const RESPONSE: &str = r#"<?xml version="1.0" encoding="windows-1251"?>
<GenericData
    xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v1_0/message"
    xmlns:generic="http://www.SDMX.org/resources/SDMXML/schemas/v1_0/generic"
    xmlns:structure="http://www.SDMX.org/resources/SDMXML/schemas/v1_0/structure">
  <CodeLists>
    <structure:CodeList id="REGION">
      <structure:Name> Region label </structure:Name>
      <structure:Code value="01">
        <structure:Description>Moscow</structure:Description>
      </structure:Code>
      <structure:Code value="02">
        <structure:Description>Saint Petersburg</structure:Description>
      </structure:Code>
    </structure:CodeList>
  </CodeLists>
  <DataSet>
    <generic:Series>
      <generic:SeriesKey>
        <generic:Value concept="REGION" value="01"/>
      </generic:SeriesKey>
      <generic:Attributes>
        <generic:Value concept="EI" value="RUB"/>
        <generic:Value concept="PERIOD" value="январь"/>
      </generic:Attributes>
      <generic:Obs>
        <generic:Time>2020</generic:Time>
        <generic:ObsValue value="1 000,0"/>
      </generic:Obs>
    </generic:Series>
  </DataSet>
</GenericData>
"#;

#[test]
fn code_lists_are_collected_with_trimmed_names() {
    let root = parse_document(RESPONSE).unwrap();
    let codes = parse_code_lists(&root).unwrap();
    let region = &codes["REGION"];
    assert_eq!(region.name, "Region label");
    assert_eq!(region.values["01"], "Moscow");
    assert_eq!(region.values["02"], "Saint Petersburg");
}

#[test]
fn series_decodes_to_the_expected_record() {
    let root = parse_document(RESPONSE).unwrap();
    let codes = parse_code_lists(&root).unwrap();
    let records = parse_data_set(&root, &codes);
    let expected = DataRecord {
        dimensions: BTreeMap::from([("Region label".to_string(), "Moscow".to_string())]),
        value: 1000.0,
        period: "январь".into(),
        unit: "RUB".into(),
        year: 2020,
    };
    assert_eq!(records, vec![expected]);
}

#[test]
fn missing_code_lists_section_is_a_parse_error() {
    let root = parse_document(
        r#"<GenericData xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v1_0/message"/>"#,
    )
    .unwrap();
    let err = parse_code_lists(&root).unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "got {err:?}");
}

#[test]
fn missing_data_set_section_is_just_empty() {
    let xml = r#"<GenericData
        xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v1_0/message"
        xmlns:structure="http://www.SDMX.org/resources/SDMXML/schemas/v1_0/structure">
      <CodeLists/>
    </GenericData>"#;
    let root = parse_document(xml).unwrap();
    let codes = parse_code_lists(&root).unwrap();
    assert!(parse_data_set(&root, &codes).is_empty());
}

fn series(key: &str, time: &str, value: &str) -> String {
    format!(
        r#"<generic:Series>
          <generic:SeriesKey>{key}</generic:SeriesKey>
          <generic:Obs>
            <generic:Time>{time}</generic:Time>
            <generic:ObsValue value="{value}"/>
          </generic:Obs>
        </generic:Series>"#
    )
}

fn response_with_series(series_xml: &str) -> String {
    format!(
        r#"<GenericData
            xmlns="http://www.SDMX.org/resources/SDMXML/schemas/v1_0/message"
            xmlns:generic="http://www.SDMX.org/resources/SDMXML/schemas/v1_0/generic"
            xmlns:structure="http://www.SDMX.org/resources/SDMXML/schemas/v1_0/structure">
          <CodeLists>
            <structure:CodeList id="REGION">
              <structure:Name>Region label</structure:Name>
              <structure:Code value="01">
                <structure:Description>Moscow</structure:Description>
              </structure:Code>
            </structure:CodeList>
          </CodeLists>
          <DataSet>{series_xml}</DataSet>
        </GenericData>"#
    )
}

#[test]
fn series_with_unknown_coding_is_dropped_but_the_rest_survives() {
    let xml = response_with_series(&format!(
        "{}{}{}",
        series(r#"<generic:Value concept="REGION" value="01"/>"#, "2019", "1"),
        series(r#"<generic:Value concept="UNKNOWN" value="01"/>"#, "2020", "2"),
        series(r#"<generic:Value concept="REGION" value="99"/>"#, "2021", "3"),
    ));
    let root = parse_document(&xml).unwrap();
    let codes = parse_code_lists(&root).unwrap();
    let records = parse_data_set(&root, &codes);
    // unknown concept and unknown code each drop only their own series
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].year, 2019);
}

#[test]
fn series_without_series_key_aborts_the_remaining_scan() {
    let first = series(r#"<generic:Value concept="REGION" value="01"/>"#, "2019", "1");
    let broken = r#"<generic:Series>
          <generic:Obs><generic:Time>2020</generic:Time><generic:ObsValue value="2"/></generic:Obs>
        </generic:Series>"#;
    let last = series(r#"<generic:Value concept="REGION" value="01"/>"#, "2021", "3");
    let xml = response_with_series(&format!("{first}{broken}{last}"));
    let root = parse_document(&xml).unwrap();
    let codes = parse_code_lists(&root).unwrap();
    let records = parse_data_set(&root, &codes);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].year, 2019);
}

#[test]
fn malformed_scalars_fall_back_to_defaults() {
    let xml = response_with_series(&series(
        r#"<generic:Value concept="REGION" value="01"/>"#,
        "not-a-year",
        "abc",
    ));
    let root = parse_document(&xml).unwrap();
    let codes = parse_code_lists(&root).unwrap();
    let records = parse_data_set(&root, &codes);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].year, 0);
    assert_eq!(records[0].value, 0.0);
    // no Attributes node: unit and period stay empty
    assert_eq!(records[0].unit, "");
    assert_eq!(records[0].period, "");
}

#[test]
fn invalid_xml_is_a_parse_error() {
    let err = parse_document("<a><b></a>").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}
