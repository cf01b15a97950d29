/// Headline figures over a set of cases
use crate::case::{Case, CaseStatus};

/// Case holding the best value of one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct BestCase {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseSummary {
    pub total: usize,
    pub completed: usize,
    pub running: usize,
    /// Completed case with the lowest `nox_emissions`.
    pub lowest_nox: Option<BestCase>,
    /// Completed case with the highest `combustion_efficiency`.
    pub highest_efficiency: Option<BestCase>,
    /// Completed case with the lowest `temperature_max`.
    pub lowest_peak_temperature: Option<BestCase>,
}

enum Prefer {
    Lowest,
    Highest,
}

impl CaseSummary {
    /// Summarise `cases`. Metric winners consider completed cases that
    /// report the metric; ties keep the earlier case.
    pub(crate) fn from_cases(cases: &[&Case]) -> Self {
        let count = |status: CaseStatus| cases.iter().filter(|c| c.status == status).count();
        Self {
            total: cases.len(),
            completed: count(CaseStatus::Completed),
            running: count(CaseStatus::Running),
            lowest_nox: best(cases, "nox_emissions", Prefer::Lowest),
            highest_efficiency: best(cases, "combustion_efficiency", Prefer::Highest),
            lowest_peak_temperature: best(cases, "temperature_max", Prefer::Lowest),
        }
    }
}

fn best(cases: &[&Case], metric: &str, prefer: Prefer) -> Option<BestCase> {
    let mut winner: Option<BestCase> = None;
    for case in cases {
        let Some(value) = case.metrics().and_then(|m| m.get(metric)).copied() else {
            continue;
        };
        let better = match (&winner, &prefer) {
            (None, _) => true,
            (Some(current), Prefer::Lowest) => value < current.value,
            (Some(current), Prefer::Highest) => value > current.value,
        };
        if better {
            winner = Some(BestCase {
                name: case.name.clone(),
                value,
            });
        }
    }
    winner
}
