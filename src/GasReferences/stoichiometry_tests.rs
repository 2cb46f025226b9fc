#[cfg(test)]
mod tests {
    use crate::GasReferences::errors::ReferenceError;
    use crate::GasReferences::formula::parse_formula;
    use crate::GasReferences::reference_system::{
        DEFAULT_CANDIDATES, ReferenceAssignment, construct_reference_assignment,
        construct_reference_system, default_candidates,
    };
    use crate::GasReferences::report::ReferenceReport;
    use crate::GasReferences::stoichiometry::{
        StoichiometryMatrix, atomic_stoichiometry, stoichiometry_factors,
    };
    use crate::GasReferences::symbols::symbols_from_formulas;
    use crate::settings::ReferenceConfig;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;
    use std::collections::{BTreeMap, HashMap};
    use tempfile::NamedTempFile;

    fn hcno_references() -> ReferenceAssignment {
        ReferenceAssignment::from_pairs(vec![
            ("H", "H2"),
            ("C", "CH4"),
            ("N", "NH3"),
            ("O", "H2O"),
        ])
    }

    fn assert_factors(actual: &BTreeMap<String, f64>, expected: &[(&str, f64)]) {
        assert_eq!(
            actual.len(),
            expected.len(),
            "got {:?}, expected {:?}",
            actual,
            expected
        );
        for (reference, value) in expected {
            let factor = actual
                .get(*reference)
                .unwrap_or_else(|| panic!("{} missing in {:?}", reference, actual));
            assert_relative_eq!(*factor, *value, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_inverse_matrix() {
        let inverse = atomic_stoichiometry(&hcno_references()).unwrap();
        let expected = [
            [0.5, 0.0, 0.0, 0.0],
            [-2.0, 1.0, 0.0, 0.0],
            [-1.5, 0.0, 1.0, 0.0],
            [-1.0, 0.0, 0.0, 1.0],
        ];
        for (row, expected_row) in inverse.iter().zip(expected.iter()) {
            for (value, expected_value) in row.iter().zip(expected_row.iter()) {
                assert_relative_eq!(*value, *expected_value, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_inverse_round_trip() {
        let mut candidates = default_candidates();
        candidates.push("HCl".to_string());
        for adsorbates in [
            vec!["SNOCHO", "SCl", "H2O", "CH4"],
            vec!["NO", "O2", "CO", "CO2"],
            vec!["CO", "OCHO"],
            vec!["F", "CF4"],
        ] {
            let symbols = symbols_from_formulas(&adsorbates, true).unwrap();
            let references = construct_reference_assignment(&symbols, &candidates).unwrap();
            let matrix = StoichiometryMatrix::new(&references).unwrap();
            let product = &matrix.matrix * &matrix.inverse;
            let identity = DMatrix::<f64>::identity(references.len(), references.len());
            assert_relative_eq!(product, identity, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_co_and_oh() {
        let symbols = symbols_from_formulas(&["CO"], true).unwrap();
        let references = construct_reference_assignment(&symbols, &DEFAULT_CANDIDATES).unwrap();
        assert_eq!(
            references,
            ReferenceAssignment::from_pairs(vec![("H", "H2"), ("C", "CH4"), ("O", "H2O")])
        );
        let factors = stoichiometry_factors(&["CO", "OH"], &references).unwrap();
        assert_factors(
            factors.get("CO").unwrap(),
            &[("CH4", 1.0), ("H2", -3.0), ("H2O", 1.0)],
        );
        assert_factors(factors.get("OH").unwrap(), &[("H2", -0.5), ("H2O", 1.0)]);
    }

    #[test]
    fn test_factors_from_greedy_construction() {
        // the assignment of a constructed system feeds the mapper just as well
        let candidates: Vec<&str> = DEFAULT_CANDIDATES
            .into_iter()
            .filter(|c| *c != "CO")
            .collect();
        let system = construct_reference_system("CO", &candidates).unwrap();
        let factors = stoichiometry_factors(&["CO", "OH"], &system.assignment()).unwrap();
        assert_factors(
            factors.get("CO").unwrap(),
            &[("CH4", 1.0), ("H2", -3.0), ("H2O", 1.0)],
        );
        assert_factors(factors.get("OH").unwrap(), &[("H2", -0.5), ("H2O", 1.0)]);
    }

    #[test]
    fn test_no_o2_co_co2() {
        let adsorbates = ["NO", "O2", "CO", "CO2"];
        let symbols = symbols_from_formulas(&adsorbates, true).unwrap();
        assert_eq!(symbols, vec!["H", "C", "N", "O"]);
        let references = construct_reference_assignment(&symbols, &DEFAULT_CANDIDATES).unwrap();
        assert_eq!(references, hcno_references());
        let factors = stoichiometry_factors(&adsorbates, &references).unwrap();
        assert!(factors.is_complete());
        assert_factors(
            factors.get("CO").unwrap(),
            &[("CH4", 1.0), ("H2", -3.0), ("H2O", 1.0)],
        );
        assert_factors(
            factors.get("CO2").unwrap(),
            &[("CH4", 1.0), ("H2", -4.0), ("H2O", 2.0)],
        );
        assert_factors(
            factors.get("NO").unwrap(),
            &[("H2", -2.5), ("H2O", 1.0), ("NH3", 1.0)],
        );
        assert_factors(factors.get("O2").unwrap(), &[("H2", -2.0), ("H2O", 2.0)]);
    }

    #[test]
    fn test_sulfur_and_chlorine() {
        let mut candidates = default_candidates();
        candidates.push("HCl".to_string());
        let adsorbates = ["SNOCHO", "SCl", "H2O", "CH4"];
        let symbols = symbols_from_formulas(&adsorbates, true).unwrap();
        assert_eq!(symbols, vec!["H", "C", "N", "O", "S", "Cl"]);
        let references = construct_reference_assignment(&symbols, &candidates).unwrap();
        let inverse = atomic_stoichiometry(&references).unwrap();
        let first_column: Vec<f64> = inverse.iter().map(|row| row[0]).collect();
        for (value, expected) in first_column.iter().zip([0.5, -2.0, -1.5, -1.0, -1.0, -0.5]) {
            assert_relative_eq!(*value, expected, epsilon = 1e-12);
        }

        let factors = stoichiometry_factors(&adsorbates, &references).unwrap();
        assert_factors(factors.get("CH4").unwrap(), &[("CH4", 1.0)]);
        assert_factors(factors.get("H2O").unwrap(), &[("H2O", 1.0)]);
        assert_factors(
            factors.get("SCl").unwrap(),
            &[("H2", -1.5), ("H2S", 1.0), ("HCl", 1.0)],
        );
        assert_factors(
            factors.get("SNOCHO").unwrap(),
            &[
                ("CH4", 1.0),
                ("H2", -6.0),
                ("H2O", 2.0),
                ("H2S", 1.0),
                ("NH3", 1.0),
            ],
        );
    }

    #[test]
    fn test_small_fragments() {
        let mut candidates = default_candidates();
        candidates.push("HCl".to_string());
        let adsorbates = [
            "H3", "NO", "O2", "CO", "CO2", "Cl", "HCl", "Cl2", "CH4", "H2O", "CHO", "OCHO", "NH",
            "CH3",
        ];
        let symbols = symbols_from_formulas(&adsorbates, true).unwrap();
        let references = construct_reference_assignment(&symbols, &candidates).unwrap();
        let factors = stoichiometry_factors(&adsorbates, &references).unwrap();
        assert_factors(factors.get("H3").unwrap(), &[("H2", 1.5)]);
        assert_factors(factors.get("Cl").unwrap(), &[("H2", -0.5), ("HCl", 1.0)]);
        assert_factors(factors.get("Cl2").unwrap(), &[("H2", -1.0), ("HCl", 2.0)]);
        assert_factors(factors.get("HCl").unwrap(), &[("HCl", 1.0)]);
        assert_factors(
            factors.get("CHO").unwrap(),
            &[("CH4", 1.0), ("H2", -2.5), ("H2O", 1.0)],
        );
        assert_factors(
            factors.get("OCHO").unwrap(),
            &[("CH4", 1.0), ("H2", -3.5), ("H2O", 2.0)],
        );
        assert_factors(factors.get("NH").unwrap(), &[("H2", -1.0), ("NH3", 1.0)]);
        assert_factors(factors.get("CH3").unwrap(), &[("CH4", 1.0), ("H2", -0.5)]);
    }

    #[test]
    fn test_conservation_of_atoms() {
        let adsorbates = ["SNOCHO", "NOCHO", "OCHO", "N2H4", "COOH", "H"];
        let symbols = symbols_from_formulas(&adsorbates, true).unwrap();
        let references = construct_reference_assignment(&symbols, &DEFAULT_CANDIDATES).unwrap();
        let factors = stoichiometry_factors(&adsorbates, &references).unwrap();
        for adsorbate in adsorbates {
            let mut balance: HashMap<String, f64> = HashMap::new();
            for (reference, factor) in factors.get(adsorbate).unwrap() {
                for (element, count) in parse_formula(reference).unwrap() {
                    *balance.entry(element).or_insert(0.0) += factor * count as f64;
                }
            }
            let target = parse_formula(adsorbate).unwrap();
            for (element, total) in &balance {
                let expected = target.get(element).copied().unwrap_or(0) as f64;
                assert_relative_eq!(*total, expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_missing_element_fails_only_that_adsorbate() {
        let references =
            ReferenceAssignment::from_pairs(vec![("H", "H2"), ("C", "CH4"), ("O", "H2O")]);
        let factors = stoichiometry_factors(&["CO", "PtO", "NH3"], &references).unwrap();
        assert!(!factors.is_complete());
        assert!(factors.get("CO").is_some());
        assert!(factors.failures.contains_key("PtO"));
        assert!(factors.failures.contains_key("NH3"));

        let matrix = StoichiometryMatrix::new(&references).unwrap();
        assert!(matches!(
            matrix.factors_for("NH3"),
            Err(ReferenceError::MissingElement { ref element, .. }) if element == "N"
        ));
    }

    #[test]
    fn test_degenerate_assignments() {
        let same_reference = ReferenceAssignment::from_pairs(vec![("C", "CO"), ("O", "CO")]);
        assert!(matches!(
            StoichiometryMatrix::new(&same_reference),
            Err(ReferenceError::SingularMatrix { .. })
        ));

        // the second H entry takes the hydrogen column, the first column stays empty
        let duplicate_element =
            ReferenceAssignment::from_pairs(vec![("H", "H2"), ("H", "H2O"), ("O", "O2")]);
        assert!(matches!(
            StoichiometryMatrix::new(&duplicate_element),
            Err(ReferenceError::SingularMatrix { .. })
        ));

        let unowned = ReferenceAssignment::from_pairs(vec![("C", "CO2")]);
        assert!(matches!(
            StoichiometryMatrix::new(&unowned),
            Err(ReferenceError::UnassignedElement { ref element, .. }) if element == "O"
        ));

        assert!(matches!(
            StoichiometryMatrix::new(&ReferenceAssignment::default()),
            Err(ReferenceError::InvalidAssignment(_))
        ));
    }

    #[test]
    fn test_suffixed_reference() {
        let references = ReferenceAssignment::from_pairs(vec![("H", "H2_ref"), ("O", "H2O")]);
        let factors = stoichiometry_factors(&["OH"], &references).unwrap();
        assert_factors(factors.get("OH").unwrap(), &[("H2_ref", -0.5), ("H2O", 1.0)]);
    }

    #[test]
    fn test_tolerance_prunes_small_factors() {
        let matrix = StoichiometryMatrix::new(&hcno_references())
            .unwrap()
            .with_tolerance(0.6);
        // |H2| = 0.5 falls under the tolerance
        assert_factors(&matrix.factors_for("OH").unwrap(), &[("H2O", 1.0)]);
    }

    #[test]
    fn test_formation_equation() {
        let factors = stoichiometry_factors(&["CO", "OH", "H3"], &hcno_references()).unwrap();
        assert_eq!(
            factors.formation_equation("CO").unwrap(),
            "CH4 + H2O -> CO + 3H2"
        );
        assert_eq!(
            factors.formation_equation("OH").unwrap(),
            "H2O -> OH + 0.5H2"
        );
        assert_eq!(factors.formation_equation("H3").unwrap(), "1.5H2 -> H3");
        assert!(matches!(
            factors.formation_equation("CO2"),
            Err(ReferenceError::NoFactors { .. })
        ));
    }

    #[test]
    fn test_reference_energy() {
        let factors = stoichiometry_factors(&["CO"], &hcno_references()).unwrap();
        let energies = HashMap::from([
            ("H2".to_string(), -6.77),
            ("CH4".to_string(), -24.05),
            ("H2O".to_string(), -14.22),
        ]);
        let reference = factors.reference_energy("CO", &energies).unwrap();
        assert_relative_eq!(reference, -24.05 - 14.22 + 3.0 * 6.77, epsilon = 1e-9);
        let relative = factors.relative_energy("CO", -14.8, &energies).unwrap();
        assert_relative_eq!(relative, -14.8 - reference, epsilon = 1e-9);

        let partial = HashMap::from([("H2".to_string(), -6.77)]);
        assert!(matches!(
            factors.reference_energy("CO", &partial),
            Err(ReferenceError::MissingReferenceEnergy { .. })
        ));
    }

    #[test]
    fn test_report_without_hydrogen() {
        let config = ReferenceConfig {
            add_hydrogen: false,
            ..ReferenceConfig::default()
        };
        let report = ReferenceReport::compute(&["CO"], &config).unwrap();
        assert_eq!(report.symbols, vec!["C", "O"]);
        assert_eq!(
            report.references,
            ReferenceAssignment::from_pairs(vec![("O", "O2"), ("C", "CO2")])
        );
        let factors = &report.stoichiometry_factors;
        assert!(factors.is_complete());
        assert_factors(factors.get("CO").unwrap(), &[("CO2", 1.0), ("O2", -0.5)]);
        assert_eq!(
            factors.formation_equation("CO").unwrap(),
            "CO2 -> CO + 0.5O2"
        );

        // carbon alone has no hydrogen- and oxygen-free reference
        assert!(matches!(
            ReferenceReport::compute(&["C"], &config),
            Err(ReferenceError::UnresolvedResidual { .. })
        ));
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = ReferenceReport::compute(&["CO", "OCHO"], &ReferenceConfig::default()).unwrap();
        assert_eq!(report.symbols, vec!["H", "C", "O"]);
        assert_eq!(report.references.references(), vec!["H2", "CH4", "H2O"]);
        assert_eq!(report.stoichiometry.len(), 3);
        assert_factors(
            report.stoichiometry_factors.get("OCHO").unwrap(),
            &[("CH4", 1.0), ("H2", -3.5), ("H2O", 2.0)],
        );

        let file = NamedTempFile::new().unwrap();
        report.save(file.path()).unwrap();
        let loaded = ReferenceReport::load(file.path()).unwrap();
        assert_eq!(loaded.references, report.references);
        assert_eq!(loaded.symbols, report.symbols);
        assert_eq!(
            loaded.stoichiometry_factors.factors.keys().collect::<Vec<_>>(),
            vec!["CO", "OCHO"]
        );
    }
}
