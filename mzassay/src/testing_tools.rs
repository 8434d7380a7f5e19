//! A small but complete mass calculator with monoisotopic masses, for use in tests only.
use context_error::{BoxedError, Context, CreateError};
use mzglyco::{
    error::{GlycoError, GlycoErrorKind},
    glycan_fragment::GlycanComposition,
    mass_calculator::{FragmentRequest, FragmentSeries, MassCalculator, unknown_amino_acid},
    modification::{Modification, ModificationSite},
};

pub(crate) const PROTON: f64 = 1.007_276_467;
pub(crate) const WATER: f64 = 18.010_564_684;
const AMMONIA: f64 = 17.026_549_101;

/// Knows b/y ions (with `-N(1)` and `$` glycan variants), Y glycan ions, and a handful of modifications.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ToyCalculator;

const HEXNAC: f64 = 203.079_372_520;

fn monosaccharide_mass(code: char) -> Option<f64> {
    match code {
        'N' => Some(HEXNAC),
        'H' => Some(162.052_823_950),
        'F' => Some(146.057_909_330),
        'A' => Some(291.095_416_600),
        _ => None,
    }
}

fn modification_mass(modification: &Modification) -> Result<f64, GlycoError> {
    match modification.name.as_str() {
        "Oxidation" => Ok(15.994_914_620),
        "Carbamidomethyl" => Ok(57.021_463_720),
        "Acetyl" => Ok(42.010_564_680),
        "Amidated" => Ok(-0.984_015_580),
        other => Err(BoxedError::new(
            GlycoErrorKind::MassCalculator,
            "Unknown modification",
            "This modification is not known to the toy calculator",
            Context::show(other.to_string()),
        )),
    }
}

fn loss_mass(loss: &str) -> Result<f64, GlycoError> {
    match loss {
        "noloss" => Ok(0.0),
        "H2O" => Ok(WATER),
        "NH3" => Ok(AMMONIA),
        other => Err(BoxedError::new(
            GlycoErrorKind::MassCalculator,
            "Unknown loss",
            "This neutral loss is not known to the toy calculator",
            Context::show(other.to_string()),
        )),
    }
}

/// The monosaccharides of a glycan structure like `(N(N(H(H)(H))))` in order of appearance.
pub(crate) fn glycan_residues(glycan: &str) -> Result<Vec<char>, GlycoError> {
    glycan
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| {
            monosaccharide_mass(c).map(|_| c).ok_or_else(|| {
                BoxedError::new(
                    GlycoErrorKind::MassCalculator,
                    "Unknown monosaccharide",
                    format!("The monosaccharide '{c}' is not known to the toy calculator"),
                    Context::show(glycan.to_string()),
                )
            })
        })
        .collect()
}

fn glycan_mass(residues: &[char]) -> f64 {
    residues.iter().filter_map(|c| monosaccharide_mass(*c)).sum()
}

fn to_mz(mass: f64, charge: u32) -> f64 {
    f64::from(charge).mul_add(PROTON, mass) / f64::from(charge)
}

impl ToyCalculator {
    /// Residue masses per position (including the modifications on it), and the N and C terminal modification masses
    fn residues(
        self,
        sequence: &str,
        modification: &[Modification],
    ) -> Result<(Vec<f64>, f64, f64), GlycoError> {
        let mut masses = sequence
            .chars()
            .map(|aa| self.aa_residue_mass(aa))
            .collect::<Result<Vec<_>, _>>()?;
        let mut n_term = 0.0;
        let mut c_term = 0.0;
        for m in modification {
            let mass = modification_mass(m)?;
            match (m.site, m.position) {
                (ModificationSite::NTerm, _) => n_term += mass,
                (ModificationSite::CTerm, _) => c_term += mass,
                (ModificationSite::Residue(_), Some(position))
                    if (1..=masses.len()).contains(&position) =>
                {
                    masses[position - 1] += mass;
                }
                (ModificationSite::Residue(_), _) => {
                    return Err(BoxedError::new(
                        GlycoErrorKind::InvalidModification,
                        "Invalid modification position",
                        "The modification does not fall within the sequence",
                        Context::show(m.to_string()),
                    ));
                }
            }
        }
        Ok((masses, n_term, c_term))
    }
}

impl MassCalculator for ToyCalculator {
    fn fragment_mz(&self, request: &FragmentRequest<'_>) -> Result<Vec<FragmentSeries>, GlycoError> {
        let (residues, n_term, c_term) = self.residues(request.sequence, request.modification)?;
        let length = residues.len();
        let peptide = residues.iter().sum::<f64>() + n_term + c_term + WATER;
        let glycan = request.glycan.map(glycan_residues).transpose()?;
        let full_glycan = glycan.as_deref().map_or(0.0, glycan_mass);
        let site = request.glycan_site;

        let mut result = Vec::new();
        for fragment_type in request.fragment_types {
            for loss in request.losses {
                let loss_shift = loss_mass(loss)?;
                for &charge in request.charges {
                    let mut series = FragmentSeries {
                        fragment_type: fragment_type.clone(),
                        charge,
                        loss: loss.clone(),
                        ..FragmentSeries::default()
                    };
                    if fragment_type == "Y" {
                        let Some(glycan) = &glycan else {
                            continue;
                        };
                        for k in 0..=glycan.len() {
                            let name = if k == 0 {
                                "Y0".to_string()
                            } else if k == glycan.len() {
                                "Y$".to_string()
                            } else {
                                let composition: GlycanComposition =
                                    glycan[..k].iter().map(|c| (c.to_string(), 1)).collect();
                                format!("Y-{composition}")
                            };
                            series.fragment_mz.push(to_mz(
                                peptide + glycan_mass(&glycan[..k]) - loss_shift,
                                charge,
                            ));
                            series.fragment_name.push(name);
                            series.fragment_number.push(None);
                        }
                        result.push(series);
                        continue;
                    }
                    let (ion, extra) = match fragment_type.as_str() {
                        "b" | "y" => (fragment_type.as_str(), None),
                        "b-N(1)" => ("b", Some(HEXNAC)),
                        "y-N(1)" => ("y", Some(HEXNAC)),
                        "b$" => ("b", Some(full_glycan)),
                        "y$" => ("y", Some(full_glycan)),
                        other => {
                            return Err(BoxedError::new(
                                GlycoErrorKind::MassCalculator,
                                "Unknown fragment type",
                                "This fragment type is not known to the toy calculator",
                                Context::show(other.to_string()),
                            ));
                        }
                    };
                    for i in 1..length {
                        let (mass, covers_site) = if ion == "b" {
                            (
                                residues[..i].iter().sum::<f64>() + n_term,
                                site.is_some_and(|s| s <= i),
                            )
                        } else {
                            (
                                residues[length - i..].iter().sum::<f64>() + c_term + WATER,
                                site.is_some_and(|s| s > length - i),
                            )
                        };
                        let mass = match extra {
                            None => mass,
                            Some(_) if glycan.is_none() || !covers_site => continue,
                            Some(extra) => mass + extra,
                        };
                        series.fragment_mz.push(to_mz(mass - loss_shift, charge));
                        series.fragment_name.push(format!("{fragment_type}{i}"));
                        series.fragment_number.push(Some(i as u32));
                    }
                    result.push(series);
                }
            }
        }
        Ok(result)
    }

    fn precursor_mz(
        &self,
        sequence: &str,
        modification: &[Modification],
        glycan: Option<&str>,
        charge: u32,
    ) -> Result<f64, GlycoError> {
        let (residues, n_term, c_term) = self.residues(sequence, modification)?;
        let glycan = glycan.map_or(Ok(0.0), |g| self.glycan_mw(g))?;
        Ok(to_mz(
            residues.iter().sum::<f64>() + n_term + c_term + WATER + glycan,
            charge,
        ))
    }

    fn glycan_mw(&self, glycan_struct: &str) -> Result<f64, GlycoError> {
        glycan_residues(glycan_struct).map(|residues| glycan_mass(&residues))
    }

    fn aa_residue_mass(&self, code: char) -> Result<f64, GlycoError> {
        Ok(match code {
            'G' => 57.021_463_72,
            'A' => 71.037_113_79,
            'S' => 87.032_028_41,
            'P' => 97.052_763_85,
            'V' => 99.068_413_91,
            'T' => 101.047_678_47,
            'C' => 103.009_184_48,
            'L' | 'I' => 113.084_064_04,
            'N' | 'J' => 114.042_927_44,
            'D' => 115.026_943_03,
            'Q' => 128.058_577_51,
            'K' => 128.094_963_01,
            'E' => 129.042_593_09,
            'M' => 131.040_484_93,
            'H' => 137.058_911_86,
            'F' => 147.068_413_91,
            'R' => 156.101_111_03,
            'Y' => 163.063_328_53,
            'W' => 186.079_312_95,
            other => return Err(unknown_amino_acid(other)),
        })
    }

    fn element_mass(&self, symbol: &str) -> Result<f64, GlycoError> {
        match symbol {
            "H" => Ok(1.007_825_032),
            "C" => Ok(12.0),
            "N" => Ok(14.003_074_004),
            "O" => Ok(15.994_914_620),
            other => Err(BoxedError::new(
                GlycoErrorKind::MassCalculator,
                "Unknown element",
                "This element is not known to the toy calculator",
                Context::show(other.to_string()),
            )),
        }
    }

    fn oxonium_ions(&self) -> Vec<(String, f64)> {
        vec![
            ("HexNAc".to_string(), 204.086_649),
            ("Hex".to_string(), 163.060_101),
            ("NeuAc".to_string(), 292.102_693),
            ("HexHexNAc".to_string(), 366.139_472),
        ]
    }
}
