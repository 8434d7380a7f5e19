#![allow(clippy::missing_panics_doc, clippy::float_cmp)]
//! Integration tests running a full library workflow with a small mass calculator
#[allow(dead_code, unreachable_pub)]
#[path = "../src/testing_tools.rs"]
mod testing_tools;

use mzassay::{batch, prelude::*};
use mzglyco::prelude::*;
use testing_tools::ToyCalculator;

const GLYCAN: &str = "(N(N(H(H)(H))))";

const SETTINGS: &str = r#"{
    "matching": {"tolerance": [0.01, "Da"]},
    "filter": {
        "min_peptide_fragment_number": 4,
        "min_glycan_fragment_number": 2,
        "fragment": {"max_fragment_number": 8}
    },
    "decoy": {"unknown_fragment_policy": "error"},
    "decoy_type": "both",
    "seed": 7
}"#;

const PEPTIDES: &[(&str, usize)] = &[("PENTIDEK", 3), ("LGNWSAMPSCK", 3), ("GSNTSK", 3)];

fn library(builder: &AssayBuilder<'_, ToyCalculator>) -> Vec<Assay> {
    PEPTIDES
        .iter()
        .flat_map(|(sequence, site)| {
            [2, 3].map(|charge| {
                builder
                    .assay(sequence, &[], Some(GLYCAN), Some(*site), charge)
                    .unwrap()
            })
        })
        .collect()
}

#[test]
fn theoretical_library() {
    let settings = PipelineSettings::from_json(SETTINGS).unwrap();
    let builder = settings.builder(&ToyCalculator);
    let assays = library(&builder);
    assert_eq!(assays.len(), 6);
    assert!(assays.iter().all(|a| a.precursor_mz.is_some()));

    let filtered = batch::filter_assays(builder.fragment_filter(), &assays, &settings.filter);
    assert_eq!(filtered.len(), 6);
    for assay in &filtered {
        assay.validate().unwrap();
        assert_eq!(assay.fragments.len(), 8);
        let glycan = assay
            .fragments
            .fragment_type()
            .iter()
            .filter(|t| t.as_deref() == Some("Y"))
            .count();
        assert!(glycan >= 2);
        assert!(8 - glycan >= 4);
    }

    let generator = settings.decoy_generator(&ToyCalculator).unwrap();
    let decoys = batch::decoys(&generator, &filtered, settings.decoy_type, settings.seed);
    assert_eq!(decoys.len(), 6);
    for (target, decoy) in filtered.iter().zip(&decoys) {
        assert!(decoy.flag("decoy") && decoy.flag("peptideDecoy") && decoy.flag("glycanDecoy"));
        let reversed = decoy_sequence(target);
        assert_eq!(decoy.peptide_sequence, reversed.sequence);
        assert_eq!(decoy.glycan_site, reversed.glycan_site);
        assert_eq!(decoy.precursor_charge, target.precursor_charge);
        assert!(decoy.fragments.len() <= target.fragments.len());
        assert!(
            decoy
                .fragments
                .fragment_type()
                .iter()
                .flatten()
                .any(|t| t == "DECOY_Y")
        );
        // the decoy of the decoy brings back the target sequence
        assert_eq!(
            decoy_sequence(decoy).sequence,
            target.peptide_sequence
        );
    }
    assert_eq!(
        batch::decoys(&generator, &filtered, settings.decoy_type, settings.seed),
        decoys
    );

    let updated = batch::update_assays(&builder, &filtered);
    assert_eq!(updated, filtered);

    let combined = settings
        .combine
        .remove_redundant(assays.iter().chain(&assays).cloned());
    assert_eq!(combined.len(), assays.len());
}

#[test]
fn annotate_spectrum() {
    let settings = PipelineSettings::from_json(SETTINGS).unwrap();
    let annotator = settings.annotator(&ToyCalculator);
    let theoretical = annotator
        .builder()
        .theoretical_fragments("PENTIDEK", &[], Some(GLYCAN), Some(3), None)
        .unwrap();
    let picked = ["y3^+1", "y5^+1", "Y-N(1)^+1", "Y-H(1)N(2)^+2"]
        .map(|annotation| {
            theoretical
                .fragments
                .iter()
                .find(|f| f.annotation.as_deref() == Some(annotation))
                .unwrap()
                .mz
        });

    let mut mz = vec![50.0, 204.0867, 3000.0];
    mz.extend(picked.iter().map(|mz| mz + 0.002));
    let intensity = (1..=mz.len()).map(|i| i as f64).collect();
    let spectrum = Assay::new("")
        .precursor_charge(2)
        .fragments(Fragments::with_intensity(mz, intensity).unwrap());

    let annotated = annotator
        .annotate(&spectrum, "PENTIDEK", &[], Some(GLYCAN), Some(3))
        .unwrap();
    annotated.validate().unwrap();
    assert_eq!(annotated.fragments.mz(), spectrum.fragments.mz());
    assert_eq!(annotated.glycan_site, Some(3));
    assert_eq!(annotated.fragments.annotation()[..3], [None, None, None]);
    for (index, annotation) in annotated.fragments.annotation().iter().enumerate().skip(3) {
        let annotation = annotation.as_deref().unwrap();
        let expected = theoretical
            .fragments
            .iter()
            .find(|f| f.annotation.as_deref() == Some(annotation))
            .unwrap();
        assert!((expected.mz - annotated.fragments.mz()[index]).abs() <= 0.01);
    }

    let oxonium = settings.oxonium_extractor(&ToyCalculator).extract(&spectrum).unwrap();
    assert_eq!(oxonium.fragments.mz(), [204.0867]);
    assert_eq!(
        oxonium.fragments.annotation(),
        [Some("HexNAc".to_string())]
    );
}
