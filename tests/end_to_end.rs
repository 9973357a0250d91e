use propmap::dataset::FeatureId;
use propmap::loader::{self, LoadError};
use propmap::symbols::{self, radius_for, AttributeKey, MarkerStyle};
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(name)
}

fn radii(seq: &symbols::SequenceController) -> Vec<f64> {
    seq.layer().markers().map(|m| m.radius).collect()
}

#[tokio::test]
async fn four_cities_step_through_two_attributes() {
    let dataset = loader::load(&fixture("tests/fixtures/four_cities.geojson"))
        .await
        .unwrap();
    let mut seq = symbols::build(dataset, "Pop", MarkerStyle::default());

    assert_eq!(
        seq.keys(),
        [AttributeKey::new("Pop_1950"), AttributeKey::new("Pop_2000")]
    );
    assert_eq!(seq.index(), 0);
    assert_eq!(seq.layer().len(), 4);

    let pop_1950 = [11.27, 12.34, 0.33, 8.36];
    let pop_2000 = [34.45, 17.81, 7.28, 7.27];
    let expect = |values: &[f64]| values.iter().map(|&v| radius_for(v)).collect::<Vec<_>>();

    assert_eq!(radii(&seq), expect(&pop_1950));

    seq.forward();
    assert_eq!(seq.current_key().unwrap().year(), "2000");
    assert_eq!(radii(&seq), expect(&pop_2000));

    seq.forward();
    assert_eq!(seq.index(), 0);
    assert_eq!(radii(&seq), expect(&pop_1950));

    let lagos = seq.layer().get(FeatureId(2)).unwrap();
    assert_eq!(
        lagos.popup.text_lines(),
        ["City: Lagos", "Population in 1950: 0.33 million"]
    );
}

#[tokio::test]
async fn bundled_megacities_has_seven_years() {
    let dataset = loader::load(&fixture("data/MegaCities.geojson")).await.unwrap();
    let seq = symbols::build(dataset, "Pop", MarkerStyle::default());

    let years: Vec<&str> = seq.keys().iter().map(|k| k.year()).collect();
    assert_eq!(years, ["1985", "1990", "1995", "2000", "2005", "2010", "2015"]);
    assert_eq!(seq.bounds().max, 6);
    assert_eq!(seq.layer().len(), seq.layer().dataset().len());
}

#[tokio::test]
async fn missing_file_is_reported_not_rendered() {
    let err = loader::load(&fixture("tests/fixtures/absent.geojson"))
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(err.to_string().contains("absent.geojson"));
}

#[test]
fn spawned_load_hands_back_dataset() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let rx = loader::spawn_load(
        runtime.handle(),
        fixture("tests/fixtures/four_cities.geojson"),
    );
    let dataset = runtime.block_on(rx).unwrap().unwrap();
    assert_eq!(dataset.len(), 4);
}
