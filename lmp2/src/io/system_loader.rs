//! Build the correlated system and its integral sources from the
//! configuration

use crate::config::SystemInput;
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use lmp2::{
    CentroidDistanceMetric, CorrelationSystem, DensityFittedTransformer, ExplicitPairMetric,
    FourCenterTransformer, LocalCorrelationSettings, MetricKind, PairDistanceMetric,
};
use nalgebra::{DMatrix, DVector, Vector3};
use tracing::info;

pub struct LoadedSystem {
    pub system: CorrelationSystem,
    pub metric: Box<dyn PairDistanceMetric>,
    pub four_center: Option<FourCenterTransformer>,
    pub density_fitted: Option<DensityFittedTransformer>,
}

fn to_matrix(rows: &[Vec<f64>], name: &str) -> Result<DMatrix<f64>> {
    let n_cols = rows.first().map_or(0, |r| r.len());
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
        bail!(
            "{}: row {} has {} entries, expected {}",
            name,
            idx,
            row.len(),
            n_cols
        );
    }
    Ok(DMatrix::from_fn(rows.len(), n_cols, |r, c| rows[r][c]))
}

fn to_vector3(v: &[f64; 3]) -> Vector3<f64> {
    Vector3::new(v[0], v[1], v[2])
}

pub fn load_system(input: &SystemInput, settings: &LocalCorrelationSettings) -> Result<LoadedSystem> {
    info!("\nPreparing correlated system...");

    let fock = to_matrix(&input.fock, "system.fock")?;
    let virtual_energies = DVector::from_vec(input.virtual_energies.clone());
    let centroids: Vec<Vector3<f64>> = input.centroids.iter().map(to_vector3).collect();

    let mut system = match &input.occupied_coefficients {
        Some(coefficients) => CorrelationSystem::new(
            to_matrix(coefficients, "system.occupied_coefficients")?,
            fock,
            virtual_energies,
            centroids.clone(),
        ),
        None => CorrelationSystem::from_occupied_fock(fock, virtual_energies, centroids.clone()),
    }
    .wrap_err("Invalid system section")?;

    if system.n_occupied() != input.n_occupied {
        bail!(
            "system.n_occupied is {} but the reference data describe {} occupied orbitals",
            input.n_occupied,
            system.n_occupied()
        );
    }

    if let Some(dipoles) = &input.transition_dipoles {
        let dipoles: Vec<Vec<Vector3<f64>>> = dipoles
            .iter()
            .map(|row| row.iter().map(to_vector3).collect())
            .collect();
        system = system
            .with_transition_dipoles(dipoles)
            .wrap_err("Invalid system.transition_dipoles")?;
    }

    let metric: Box<dyn PairDistanceMetric> = match &input.pair_metric {
        Some(explicit) => {
            let kind = match explicit.kind.to_lowercase().as_str() {
                "distance" => MetricKind::Distance,
                "overlap" => MetricKind::Overlap,
                other => bail!("Unknown pair metric kind: {}", other),
            };
            let mut metric = ExplicitPairMetric::new(kind);
            for value in &explicit.values {
                metric.insert(value.i, value.j, value.value);
            }
            Box::new(metric)
        }
        None => Box::new(CentroidDistanceMetric::new(centroids)),
    };

    let four_center = match &input.exchange_integrals {
        Some(blocks) => {
            let mut transformer = FourCenterTransformer::new(system.n_virtual());
            for block in blocks {
                let matrix = to_matrix(&block.block, "system.exchange_integrals")?;
                transformer
                    .insert(block.i, block.j, matrix)
                    .wrap_err_with(|| format!("Invalid exchange block ({}, {})", block.i, block.j))?;
            }
            info!("Loaded {} four-center exchange blocks", blocks.len());
            Some(transformer)
        }
        None => None,
    };

    let density_fitted = match (&input.three_center, &input.fitting_metric) {
        (Some(three_center), Some(fitting_metric)) => {
            let three_center = three_center
                .iter()
                .map(|p| to_matrix(p, "system.three_center"))
                .collect::<Result<Vec<_>>>()?;
            let transformer = DensityFittedTransformer::new(
                three_center,
                &to_matrix(fitting_metric, "system.fitting_metric")?,
                settings.metric_pseudo_inverse_threshold,
                settings.aux_domain_threshold,
            )
            .wrap_err("Density fitting failed")?;
            Some(transformer)
        }
        (None, None) => None,
        _ => return Err(eyre!("system.three_center and system.fitting_metric must be given together")),
    };

    if four_center.is_none() && density_fitted.is_none() {
        bail!("The system section provides neither exchange_integrals nor three_center integrals");
    }

    Ok(LoadedSystem {
        system,
        metric,
        four_center,
        density_fitted,
    })
}
