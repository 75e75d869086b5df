use fedstat_rs::Error;
use fedstat_rs::config::parse_indicator_page;
use fedstat_rs::models::Axis;

// Trimmed-down copy of a real indicator page: one grid script, two other
// scripts that must be ignored.
const PAGE: &str = r#"
<html><head>
<script src="/js/grid.js"></script>
<script>var counter = 1;</script>
<SCRIPT>
var grid = new FGrid({
    id: 57796,
    filters: {
        0: {
            title: "Показатель",
            values: {
                0: {title: 'Численность населения', order: 0, checked: true},
            },
        },
        3: {
            title: "Год",
            values: {
                2020: {title: '2020', order: 0, checked: true},
                2021: {title: '2021', order: 1, checked: false},
            },
        },
        30611: {
            title: "Регион",
            values: {
                950423: {title: 'Москва', order: 1, checked: true},
                950424: {title: 'Санкт-Петербург', order: 2, checked: true},
            },
        },
        33560: {
            title: "Единица измерения",
            values: {
                44292: {title: 'человек', order: 0, checked: true},
            },
        },
        57831: {
            title: "Период",
            values: {
                1540241: {title: 'январь', order: 1, checked: true},
            },
        },
    },
    left_columns: [3],
    top_columns: [57831],
    groups: [30611],
    filterObjectIds: [33560],
});
grid.init();
</SCRIPT>
</head><body></body></html>
"#;

#[test]
fn facets_are_discovered_in_declaration_order() {
    let facets = parse_indicator_page(PAGE).unwrap();
    let ids: Vec<i64> = facets.iter().map(|f| f.id).collect();
    assert_eq!(ids, [0, 3, 30611, 33560, 57831]);
    assert_eq!(facets[0].title, "Показатель");
    assert_eq!(facets[2].title, "Регион");
}

#[test]
fn facet_ids_are_unique_and_zero_is_the_title_filter() {
    let facets = parse_indicator_page(PAGE).unwrap();
    let mut ids: Vec<i64> = facets.iter().map(|f| f.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), facets.len());

    let zero: Vec<_> = facets.iter().filter(|f| f.id == 0).collect();
    assert_eq!(zero.len(), 1);
    assert_eq!(zero[0].axis, Axis::Filter);
}

#[test]
fn axes_follow_the_server_defaults() {
    let facets = parse_indicator_page(PAGE).unwrap();
    let axis_of = |id: i64| facets.iter().find(|f| f.id == id).unwrap().axis;
    assert_eq!(axis_of(3), Axis::Line); // left_columns
    assert_eq!(axis_of(30611), Axis::Group); // groups
    assert_eq!(axis_of(33560), Axis::Filter); // filterObjectIds
    // listed only under top_columns, which is never consulted: falls back
    assert_eq!(axis_of(57831), Axis::Column);
}

#[test]
fn values_carry_order_and_default_selection() {
    let facets = parse_indicator_page(PAGE).unwrap();
    let year = facets.iter().find(|f| f.id == 3).unwrap();
    assert!(year.is_selectable());
    assert_eq!(year.values.len(), 2);
    assert_eq!(year.values[0].id, 2020);
    assert_eq!(year.values[0].order, 0);
    assert!(year.values[0].checked);
    assert_eq!(year.values[1].id, 2021);
    assert!(!year.values[1].checked);

    let unit = facets.iter().find(|f| f.id == 33560).unwrap();
    assert!(!unit.is_selectable());
    assert_eq!(unit.values[0].title, "человек");
}

#[test]
fn page_without_grid_script_is_a_parse_error() {
    let err = parse_indicator_page("<html><script>var x = 1;</script></html>").unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "got {err:?}");
}

#[test]
fn page_with_two_grid_scripts_is_a_parse_error() {
    let page = "<script>new FGrid({});</script><script>new FGrid({});</script>";
    let err = parse_indicator_page(page).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn script_without_expected_markers_is_a_parse_error() {
    let page = "<script>var grid = new FGrid({}); grid.init();</script>";
    let err = parse_indicator_page(page).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}
