use super::*;

/// Helper to create a record with the given identifier and SNR
fn record(id: &str, snr: SnrValue) -> SnrRecord {
    SnrRecord {
        sample_identifier: id.to_string(),
        image_key: id.to_string(),
        background_noise: 1.0,
        peak_flux: snr.as_f64(),
        integrated_flux: None,
        snr,
    }
}

fn finite(id: &str, snr: f64) -> SnrRecord {
    record(id, SnrValue::Finite(snr))
}

fn counts(tables: &ClassificationTables) -> Vec<usize> {
    tables.coarse.iter().map(|bin| bin.count).collect()
}

#[test]
fn test_default_labels() {
    let classifier = ResultClassifier::default();
    let coarse: Vec<String> = (0..4).map(|i| classifier.coarse_edges().label(i)).collect();
    assert_eq!(coarse, vec!["0-2", "2-5", "5-10", "10+"]);

    let fine: Vec<String> = (0..classifier.fine_edges().bin_count())
        .map(|i| classifier.fine_edges().label(i))
        .collect();
    assert_eq!(
        fine,
        vec!["0-2", "2-5", "5-10", "10-20", "20-50", "50-100", "100-200", "200+"]
    );
}

#[test]
fn test_edges_are_half_open() {
    let edges = BinEdges::new(vec![2.0, 5.0, 10.0]).unwrap();

    assert_eq!(edges.bin_index(SnrValue::Finite(1.999)), 0);
    assert_eq!(edges.bin_index(SnrValue::Finite(2.0)), 1);
    assert_eq!(edges.bin_index(SnrValue::Finite(4.999)), 1);
    assert_eq!(edges.bin_index(SnrValue::Finite(5.0)), 2);
    assert_eq!(edges.bin_index(SnrValue::Finite(10.0)), 3);
    assert_eq!(edges.bin_index(SnrValue::Finite(1.0e9)), 3);
}

#[test]
fn test_negative_and_unbounded_extremes() {
    let edges = BinEdges::new(DEFAULT_FINE_EDGES.to_vec()).unwrap();
    assert_eq!(edges.bin_index(SnrValue::Finite(-4.0)), 0);
    assert_eq!(edges.bin_index(SnrValue::Unbounded), 7);
}

#[test]
fn test_invalid_edges_are_rejected() {
    for edges in [
        vec![],
        vec![5.0, 2.0],
        vec![2.0, 2.0],
        vec![1.0, f64::NAN],
        vec![1.0, f64::INFINITY],
    ] {
        assert!(
            matches!(
                BinEdges::new(edges.clone()),
                Err(ConfigError::InvalidBinEdges { .. })
            ),
            "edges {:?} should be rejected",
            edges
        );
    }
}

#[test]
fn test_thresholds_must_be_ordered() {
    let coarse = BinEdges::new(DEFAULT_COARSE_EDGES.to_vec()).unwrap();
    let fine = BinEdges::new(DEFAULT_FINE_EDGES.to_vec()).unwrap();
    let result = ResultClassifier::new(coarse, fine, 10.0, 5.0);
    assert!(matches!(result, Err(ConfigError::InvalidBinEdges { .. })));
}

#[test]
fn test_coarse_counts_sum_to_total() {
    let records = vec![
        finite("a", 0.5),
        finite("b", 3.0),
        finite("c", 7.0),
        finite("d", 12.0),
        finite("e", 2.0),
        finite("f", -1.0),
        record("g", SnrValue::Unbounded),
    ];
    let tables = ResultClassifier::default().classify(&records);

    assert_eq!(counts(&tables), vec![2, 2, 1, 2]);
    assert_eq!(tables.classified_count(), records.len());
}

#[test]
fn test_threshold_manifests_overlap() {
    let records = vec![
        finite("low", 3.0),
        finite("mid", 7.0),
        finite("edge", 10.0),
        finite("high", 40.0),
    ];
    let tables = ResultClassifier::default().classify(&records);
    let thresholds = &tables.thresholds;

    assert_eq!(thresholds.below_low, vec!["low"]);
    assert_eq!(thresholds.below_high, vec!["low", "mid"]);
    assert_eq!(thresholds.at_or_above_high, vec!["edge", "high"]);

    // Every below_low member is also below_high
    for id in &thresholds.below_low {
        assert!(thresholds.below_high.contains(id));
    }
    // below_high and at_or_above_high partition the records
    assert_eq!(
        thresholds.below_high.len() + thresholds.at_or_above_high.len(),
        records.len()
    );
}

#[test]
fn test_fine_bins_partition_and_keep_order() {
    let records = vec![
        finite("s1", 150.0),
        finite("s2", 25.0),
        finite("s3", 1.0),
        finite("s4", 199.999),
        finite("s5", 200.0),
        record("s6", SnrValue::Unbounded),
    ];
    let tables = ResultClassifier::default().classify(&records);

    assert_eq!(tables.fine_bin("100-200").unwrap().members, vec!["s1", "s4"]);
    assert_eq!(tables.fine_bin("20-50").unwrap().members, vec!["s2"]);
    assert_eq!(tables.fine_bin("0-2").unwrap().members, vec!["s3"]);
    assert_eq!(tables.fine_bin("200+").unwrap().members, vec!["s5", "s6"]);

    let total: usize = tables.fine.iter().map(|bin| bin.members.len()).sum();
    assert_eq!(total, records.len());
}

#[test]
fn test_fine_bin_bounds() {
    let tables = ResultClassifier::default().classify(&[]);
    let first = &tables.fine[0];
    let last = tables.fine.last().unwrap();

    assert_eq!((first.lower, first.upper), (None, Some(2.0)));
    assert_eq!((last.lower, last.upper), (Some(200.0), None));
    assert_eq!(tables.classified_count(), 0);
}

#[test]
fn test_custom_edges() {
    let coarse = BinEdges::new(vec![1.0]).unwrap();
    let fine = BinEdges::new(vec![0.5, 1.5]).unwrap();
    let classifier = ResultClassifier::new(coarse, fine, 1.0, 1.0).unwrap();

    let tables = classifier.classify(&[finite("a", 0.7), finite("b", 1.0)]);
    assert_eq!(counts(&tables), vec![1, 1]);
    assert_eq!(tables.fine_bin("0.5-1.5").unwrap().members, vec!["a", "b"]);
    assert_eq!(tables.thresholds.below_low, vec!["a"]);
    assert_eq!(tables.thresholds.at_or_above_high, vec!["b"]);
}
